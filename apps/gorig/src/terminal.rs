//! The terminal playing the editor role
//!
//! stdout carries results (registers, debugger launches, package names);
//! messages and logs go to stderr.

use async_trait::async_trait;
use gorig_foundation::protocol::{Editor, PackageSink};
use gorig_foundation::{DebugLaunch, Document, GorigError, GorigResult, MessageLevel};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

pub struct TerminalEditor {
    active: Option<Document>,
    cwd: PathBuf,
}

impl TerminalEditor {
    pub fn new(active: Option<Document>, cwd: PathBuf) -> Self {
        Self { active, cwd }
    }
}

#[async_trait]
impl Editor for TerminalEditor {
    async fn active_document(&self) -> Option<Document> {
        self.active.clone()
    }

    async fn show_message(&self, message: &str, level: MessageLevel) {
        match level {
            MessageLevel::Info => eprintln!("{message}"),
            MessageLevel::Warning => eprintln!("warning: {message}"),
            MessageLevel::Error => eprintln!("error: {message}"),
        }
    }

    async fn set_register(&self, register: char, content: &str) -> GorigResult<()> {
        debug!(register = %register, "Register written");
        println!("{content}");
        Ok(())
    }

    async fn run_in_terminal(&self, command: &str) -> GorigResult<()> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.cwd)
            .status()
            .await
            .map_err(|e| GorigError::external("sh", e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(GorigError::external(command, status.to_string()))
        }
    }

    async fn launch_debugger(&self, launch: &DebugLaunch) -> GorigResult<()> {
        let configuration = serde_json::to_string_pretty(&launch.launch_configuration())?;
        println!("{configuration}");
        Ok(())
    }

    async fn open_list(&self, name: &str) -> GorigResult<()> {
        debug!(list = %name, "List opened");
        Ok(())
    }

    async fn host_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn cwd(&self) -> PathBuf {
        self.cwd.clone()
    }
}

/// Prints the package of the active document
pub struct StdoutPackageSink;

#[async_trait]
impl PackageSink for StdoutPackageSink {
    async fn current_package_changed(&self, _document: Option<&Document>, package: &str) {
        println!("{package}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn terminal_command_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let editor = TerminalEditor::new(None, dir.path().to_path_buf());

        editor.run_in_terminal("true").await.unwrap();
        let err = editor.run_in_terminal("exit 3").await.unwrap_err();
        assert!(matches!(err, GorigError::ExternalCommand { .. }));
    }

    #[tokio::test]
    async fn active_document_is_the_cli_file() {
        let doc = Document::from_path("/work/parser/parse_test.go");
        let editor = TerminalEditor::new(doc.clone(), PathBuf::from("/work"));
        assert_eq!(editor.active_document().await, doc);
        assert_eq!(editor.cwd(), PathBuf::from("/work"));
    }
}
