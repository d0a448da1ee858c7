//! Building the gopls launch plan

use gorig_config::GoConfig;
use gorig_foundation::LaunchPlan;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

/// Argument that makes gopls forward to (or start) the shared daemon
pub const DAEMON_ARG: &str = "-remote=auto";

/// Temp directory variable gopls derives the daemon socket address from
pub const TEMP_DIR_VAR: &str = "TMPDIR";

/// Inputs that vary per session start
#[derive(Debug, Clone, Default)]
pub struct LaunchContext {
    pub working_directory: PathBuf,
    /// Environment of the current process
    pub inherited: BTreeMap<String, String>,
    /// `TMPDIR` as the user's shell sees it, not as the editor rewrote it
    pub host_temp_dir: Option<String>,
}

impl LaunchContext {
    /// Context inheriting this process's environment
    pub fn from_process(working_directory: PathBuf, host_temp_dir: Option<String>) -> Self {
        Self {
            working_directory,
            inherited: unicode_environment(std::env::vars_os()),
            host_temp_dir,
        }
    }
}

/// Keep the entries that are valid UTF-8; the rest are left out of the plan
pub fn unicode_environment(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> BTreeMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                debug!(variable = %key, "Skipping non-UTF-8 environment value");
                None
            }
            (Err(key), _) => {
                debug!(variable = ?key, "Skipping non-UTF-8 environment variable");
                None
            }
        })
        .collect()
}

/// Build the launch plan for one start of `command`
pub fn plan(command: PathBuf, config: &GoConfig, context: LaunchContext) -> LaunchPlan {
    LaunchPlan {
        command,
        args: server_args(&config.gopls_args, config.gopls_use_daemon),
        working_directory: context.working_directory,
        environment: server_environment(
            context.inherited,
            &config.gopls_env,
            context.host_temp_dir,
        ),
    }
}

/// Configured args plus the daemon flag when daemon mode applies
///
/// An explicit `-remote*` argument always wins over daemon mode.
pub fn server_args(configured: &[String], use_daemon: bool) -> Vec<String> {
    let mut args = configured.to_vec();
    if use_daemon && !args.iter().any(|arg| arg.starts_with("-remote")) {
        args.push(DAEMON_ARG.to_string());
    }
    args
}

/// Inherited environment, then configured overrides, then the host `TMPDIR`
///
/// The host temp dir is applied last. If it differed from the one the
/// daemon was started with, gopls would compute a socket address nobody
/// listens on and spawn a private server on every start.
pub fn server_environment(
    inherited: BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
    host_temp_dir: Option<String>,
) -> BTreeMap<String, String> {
    let mut env = inherited;
    env.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    match host_temp_dir.filter(|dir| !dir.is_empty()) {
        Some(dir) => {
            env.insert(TEMP_DIR_VAR.to_string(), dir);
        }
        None => {
            env.remove(TEMP_DIR_VAR);
        }
    }
    env
}
