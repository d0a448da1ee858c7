//! Collaborator traits
//!
//! The session supervisor and the test workflow only talk to the outside
//! world through these seams: the host editor, the server process, the
//! symbol index, the package query and the tool installer.

use crate::error::GorigResult;
use crate::model::{
    ClientOptions, DebugLaunch, Document, LaunchPlan, MessageLevel, SymbolRef, ToolSpec,
};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The host editor
#[async_trait]
pub trait Editor: Send + Sync {
    /// Document the user is currently looking at, if any
    async fn active_document(&self) -> Option<Document>;

    async fn show_message(&self, message: &str, level: MessageLevel);

    /// Store `content` in a named register (clipboard `+`, unnamed `"`)
    async fn set_register(&self, register: char, content: &str) -> GorigResult<()>;

    /// Run a shell command in the editor's terminal runner
    async fn run_in_terminal(&self, command: &str) -> GorigResult<()>;

    async fn launch_debugger(&self, launch: &DebugLaunch) -> GorigResult<()>;

    /// Open a named item list (`gotests`, `goknownpackages`)
    async fn open_list(&self, name: &str) -> GorigResult<()>;

    /// Value of an environment variable as the user's shell sees it
    ///
    /// The editor process may have rewritten some variables for itself;
    /// this must return the original value.
    async fn host_env(&self, name: &str) -> Option<String>;

    /// Working directory of the editor
    fn cwd(&self) -> PathBuf;
}

/// One-way sink for the package of the active buffer
///
/// `package` is empty when the buffer has no package (or no file).
#[async_trait]
pub trait PackageSink: Send + Sync {
    async fn current_package_changed(&self, document: Option<&Document>, package: &str);
}

/// A running language server connection
#[async_trait]
pub trait LanguageServer: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> GorigResult<Value>;

    async fn notify(&self, method: &str, params: Value) -> GorigResult<()>;

    /// Stop the server and release its process
    async fn shutdown(&self) -> GorigResult<()>;
}

/// Spawns a server from a launch plan and completes the handshake
#[async_trait]
pub trait ServerLauncher: Send + Sync {
    async fn launch(
        &self,
        plan: LaunchPlan,
        options: ClientOptions,
    ) -> GorigResult<Arc<dyn LanguageServer>>;
}

/// Executes server-side commands (`workspace/executeCommand`)
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute_command(&self, command: &str, arguments: Vec<Value>) -> GorigResult<Value>;
}

/// Installs tool binaries
#[async_trait]
pub trait ToolInstaller: Send + Sync {
    /// Install `spec` into `bin_dir` and return the binary path
    async fn install(&self, spec: &ToolSpec, bin_dir: &Path) -> GorigResult<PathBuf>;
}

/// Read-only access to the server's symbol index
#[async_trait]
pub trait SymbolSource: Send + Sync {
    /// Global search by case-sensitive pattern
    async fn workspace_symbols(&self, query: &str) -> GorigResult<Vec<SymbolRef>>;

    /// Symbols declared in one document
    async fn document_symbols(&self, document_uri: &str) -> GorigResult<Vec<SymbolRef>>;
}

/// External query for the declared package name of a directory
#[async_trait]
pub trait PackageQuery: Send + Sync {
    async fn package_name(&self, dir: &Path) -> GorigResult<String>;
}
