//! Configuration management for gorig

pub mod logging;

use gorig_foundation::{ClientOptions, GorigError, GorigResult, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration keys whose change requires a server restart
pub const RESTART_KEYS: [&str; 4] = [
    "go.goplsArgs",
    "go.goplsOptions",
    "go.goplsPath",
    "go.goplsUseDaemon",
];

/// camelCase keys, recovered from env variable names
const CAMEL_CASE_KEYS: [&str; 7] = [
    "goplsPath",
    "goplsArgs",
    "goplsOptions",
    "goplsUseDaemon",
    "goplsEnv",
    "toolsDir",
    "workspaceFolders",
];

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoConfig {
    /// Master switch
    pub enable: bool,
    /// Explicit gopls binary; auto-install is skipped when set
    pub gopls_path: Option<String>,
    /// Extra arguments for gopls
    pub gopls_args: Vec<String>,
    /// Sent as `initializationOptions` and answered to `workspace/configuration`
    pub gopls_options: Option<Value>,
    /// Reuse one shared gopls daemon (`-remote=auto`)
    pub gopls_use_daemon: bool,
    /// Extra environment for the gopls process
    pub gopls_env: BTreeMap<String, String>,
    /// Client capabilities to switch off
    pub disable: DisableConfig,
    /// Where tools get installed (`GOBIN` for `go install`)
    pub tools_dir: Option<PathBuf>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisableConfig {
    pub workspace_folders: bool,
    pub diagnostics: bool,
    pub completion: bool,
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format for development
    #[default]
    Pretty,
    /// Structured JSON format
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for GoConfig {
    fn default() -> Self {
        Self {
            enable: true,
            gopls_path: None,
            gopls_args: Vec::new(),
            gopls_options: None,
            gopls_use_daemon: true,
            gopls_env: BTreeMap::new(),
            disable: DisableConfig::default(),
            tools_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl GoConfig {
    /// Load configuration from config files and environment
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables (`GORIG__*`, nested keys split on `__`,
    ///    matched case-insensitively; `goplsEnv` names are uppercased)
    /// 2. `explicit` file, or the first of `gorig.toml`, `.gorig/config.toml`
    /// 3. Default values
    pub fn load(explicit: Option<&Path>) -> GorigResult<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Toml},
            Figment,
        };

        let mut figment = Figment::from(Serialized::defaults(GoConfig::default()));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(GorigError::config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                tracing::info!(path = %path.display(), "Loading TOML configuration");
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let toml_paths = ["gorig.toml", ".gorig/config.toml"];
                if let Some(path) = toml_paths.iter().map(Path::new).find(|p| p.exists()) {
                    tracing::info!(path = %path.display(), "Loading TOML configuration");
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        let figment = figment.merge(
            Env::prefixed("GORIG__")
                .split("__")
                .lowercase(false)
                .map(|key| env_key(key.as_str()).into()),
        );

        let config: GoConfig = figment
            .extract()
            .map_err(|e| GorigError::config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;

        tracing::debug!(
            gopls_path = ?config.gopls_path,
            gopls_args = ?config.gopls_args,
            use_daemon = config.gopls_use_daemon,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> GorigResult<()> {
        if let Some(path) = &self.gopls_path {
            if path.trim().is_empty() {
                return Err(GorigError::config("goplsPath cannot be blank"));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(GorigError::config(format!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Keys (in `go.<name>` form) whose values differ between two snapshots
    pub fn changed_keys(old: &GoConfig, new: &GoConfig) -> Vec<String> {
        let mut keys = Vec::new();
        let mut check = |key: &str, changed: bool| {
            if changed {
                keys.push(format!("go.{}", key));
            }
        };
        check("enable", old.enable != new.enable);
        check("goplsPath", old.gopls_path != new.gopls_path);
        check("goplsArgs", old.gopls_args != new.gopls_args);
        check("goplsOptions", old.gopls_options != new.gopls_options);
        check("goplsUseDaemon", old.gopls_use_daemon != new.gopls_use_daemon);
        check("goplsEnv", old.gopls_env != new.gopls_env);
        check("disable", old.disable != new.disable);
        check("toolsDir", old.tools_dir != new.tools_dir);
        check("logging", old.logging != new.logging);
        keys
    }

    /// Whether any of `keys` is watched for restarts
    pub fn requires_restart<S: AsRef<str>>(keys: &[S]) -> bool {
        keys.iter().any(|k| RESTART_KEYS.contains(&k.as_ref()))
    }

    /// Spec of the gopls binary described by this configuration
    pub fn gopls_tool(&self) -> ToolSpec {
        ToolSpec::gopls(self.gopls_path.clone())
    }

    /// Language client options described by this configuration
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            initialization_options: self.gopls_options.clone(),
            disable_workspace_folders: self.disable.workspace_folders,
            disable_diagnostics: self.disable.diagnostics,
            disable_completion: self.disable.completion,
            ..ClientOptions::default()
        }
    }

    /// Directory tools are installed into
    pub fn tools_dir(&self) -> PathBuf {
        self.tools_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("gorig")
                .join("bin")
        })
    }
}

/// Field path for an env key, whatever case the variable was written in
fn env_key(key: &str) -> String {
    let mut parts = key.split('.');
    let Some(head) = parts.next() else {
        return key.to_string();
    };
    let head = field_name(head);
    let rest: Vec<String> = if head == "goplsEnv" {
        parts.map(str::to_ascii_uppercase).collect()
    } else {
        parts.map(field_name).collect()
    };

    std::iter::once(head).chain(rest).collect::<Vec<_>>().join(".")
}

fn field_name(part: &str) -> String {
    CAMEL_CASE_KEYS
        .iter()
        .find(|key| key.eq_ignore_ascii_case(part))
        .map(|key| key.to_string())
        .unwrap_or_else(|| part.to_ascii_lowercase())
}
