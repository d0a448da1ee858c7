//! Locating and installing tool binaries

use async_trait::async_trait;
use gorig_foundation::protocol::ToolInstaller;
use gorig_foundation::{GorigError, GorigResult, ToolSpec};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// Turns a [`ToolSpec`] into an executable path
///
/// An explicitly configured path is only ever checked. Auto-install is
/// reserved for specs without one.
pub struct BinaryResolver {
    installer: Arc<dyn ToolInstaller>,
    tools_dir: PathBuf,
}

impl BinaryResolver {
    pub fn new(installer: Arc<dyn ToolInstaller>, tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            installer,
            tools_dir: tools_dir.into(),
        }
    }

    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    /// Resolve `spec`, installing it into the tools directory if needed
    pub async fn resolve(&self, spec: &ToolSpec) -> GorigResult<PathBuf> {
        if let Some(configured) = &spec.configured_path {
            let path = expand_home(configured);
            if !is_executable(&path).await {
                return Err(GorigError::ConfiguredBinaryMissing {
                    path: path.display().to_string(),
                });
            }
            debug!(tool = %spec.logical_name, path = %path.display(), "Using configured binary");
            return Ok(path);
        }

        let installed = installed_path(&self.tools_dir, &spec.logical_name);
        if is_executable(&installed).await {
            debug!(tool = %spec.logical_name, path = %installed.display(), "Tool already installed");
            return Ok(installed);
        }

        info!(tool = %spec.logical_name, "Tool not found, installing");
        self.install(spec).await
    }

    /// Install `spec` regardless of what is already present
    pub async fn install(&self, spec: &ToolSpec) -> GorigResult<PathBuf> {
        tokio::fs::create_dir_all(&self.tools_dir).await.map_err(|e| {
            GorigError::install_failed(
                &spec.logical_name,
                format!("cannot create {}: {}", self.tools_dir.display(), e),
            )
        })?;

        let path = self.installer.install(spec, &self.tools_dir).await?;
        if !is_executable(&path).await {
            return Err(GorigError::install_failed(
                &spec.logical_name,
                format!("installation did not produce {}", path.display()),
            ));
        }

        info!(tool = %spec.logical_name, path = %path.display(), "Installed tool");
        Ok(path)
    }
}

/// Installs Go tools with `go install`
#[derive(Debug, Default)]
pub struct GoInstaller;

#[async_trait]
impl ToolInstaller for GoInstaller {
    async fn install(&self, spec: &ToolSpec, bin_dir: &Path) -> GorigResult<PathBuf> {
        let go = which::which("go").map_err(|e| {
            GorigError::install_failed(
                &spec.logical_name,
                format!("go toolchain not found in PATH: {}", e),
            )
        })?;

        info!(
            tool = %spec.logical_name,
            module = %spec.install_hint,
            gobin = %bin_dir.display(),
            "Running go install"
        );

        let output = Command::new(go)
            .arg("install")
            .arg(&spec.install_hint)
            .env("GOBIN", bin_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                GorigError::install_failed(
                    &spec.logical_name,
                    format!("failed to execute go install: {}", e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GorigError::install_failed(
                &spec.logical_name,
                format!(
                    "go install exited with {:?}: {}",
                    output.status.code(),
                    stderr.trim()
                ),
            ));
        }

        Ok(installed_path(bin_dir, &spec.logical_name))
    }
}

/// Where an installed tool lives inside `bin_dir`
pub fn installed_path(bin_dir: &Path, logical_name: &str) -> PathBuf {
    bin_dir.join(format!("{}{}", logical_name, std::env::consts::EXE_SUFFIX))
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest.trim_start_matches(['/', '\\']));
            }
        }
    }
    PathBuf::from(path)
}

/// Whether `path` is a regular file the current user may execute
pub async fn is_executable(path: &Path) -> bool {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(_) => return false,
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
