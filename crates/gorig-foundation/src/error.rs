//! Error handling for gorig
//!
//! Every failure that can reach the user is a [`GorigError`] variant. The
//! error is `Clone` so a single session start outcome can be handed to every
//! caller that awaited the same in-flight start.

use crate::model::MessageLevel;
use thiserror::Error;

/// Core error type used throughout gorig
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GorigError {
    /// An explicitly configured server path does not point at an executable
    #[error("goplsPath is configured (\"{path}\"), but does not exist!")]
    ConfiguredBinaryMissing { path: String },

    /// Installing a tool did not produce a usable binary
    #[error("Failed to install {tool}: {message}")]
    InstallFailed { tool: String, message: String },

    /// A request was issued while no server is running
    #[error("Language server is not running")]
    SessionNotRunning,

    /// The request was cut short because the server is being restarted
    #[error("Language server is restarting, request was dropped")]
    SessionRestarting,

    /// The package container for discovered tests could not be determined
    #[error("can't retrieve full go package for current file ({matches} matches for '{query}')")]
    ContainerResolutionAmbiguous { query: String, matches: usize },

    /// A test selection produced nothing to run
    #[error("No tests or benchmarks found in current file")]
    EmptySelection,

    /// The operation needs an active document and none is open
    #[error("No active document")]
    NoActiveDocument,

    /// A test set reached invocation without a known package container
    #[error("Package container for the selected tests is unknown")]
    ContainerUnresolved,

    /// Test commands were requested on a document that is not a test file
    #[error("Document is not a test file")]
    NotATestFile { uri: String },

    /// The server process could not be spawned or died during startup
    #[error("Failed to start language server '{command}': {message}")]
    Spawn { command: String, message: String },

    /// An external tool such as `go list` failed
    #[error("Command '{command}' failed: {message}")]
    ExternalCommand { command: String, message: String },

    /// The language server answered with an error or broke the protocol
    #[error("LSP error: {message}")]
    Lsp {
        message: String,
        method: Option<String>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Timeout occurred during: {operation}")]
    Timeout { operation: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("JSON serialization/deserialization error: {message}")]
    Json { message: String },
}

impl GorigError {
    /// Create an install failure for `tool`
    pub fn install_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InstallFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a spawn failure
    pub fn spawn(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create an external command failure
    pub fn external(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalCommand {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create an LSP error that is not tied to a particular method
    pub fn lsp(message: impl Into<String>) -> Self {
        Self::Lsp {
            message: message.into(),
            method: None,
        }
    }

    /// Create an LSP error for a failed `method` call
    pub fn lsp_method(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lsp {
            message: message.into(),
            method: Some(method.into()),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Severity used when the error is surfaced to the user
    pub fn level(&self) -> MessageLevel {
        match self {
            Self::EmptySelection | Self::NoActiveDocument | Self::SessionRestarting => {
                MessageLevel::Info
            }
            _ => MessageLevel::Error,
        }
    }
}

impl From<std::io::Error> for GorigError {
    fn from(err: std::io::Error) -> Self {
        GorigError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GorigError {
    fn from(err: serde_json::Error) -> Self {
        GorigError::Json {
            message: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type GorigResult<T> = Result<T, GorigError>;
