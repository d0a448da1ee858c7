//! Wiring of the session, discovery and lists for one CLI invocation

use crate::terminal::{StdoutPackageSink, TerminalEditor};
use gorig_config::GoConfig;
use gorig_foundation::protocol::{CommandExecutor, Editor, SymbolSource};
use gorig_foundation::{Document, GorigResult};
use gorig_lsp::{BinaryResolver, GoInstaller, ProcessLauncher, SessionSupervisor};
use gorig_testing::{
    Dispatcher, GoCommands, GoKnownPackagesList, GoListQuery, GoTestsList, PackageResolver,
    TestDiscoveryEngine,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct App {
    pub supervisor: SessionSupervisor,
    pub commands: GoCommands,
    pub dispatcher: Dispatcher,
    pub tests: GoTestsList,
    pub packages: GoKnownPackagesList,
    document: Option<Document>,
}

impl App {
    pub fn new(config: GoConfig, document: Option<Document>, cwd: PathBuf) -> Self {
        let editor: Arc<dyn Editor> = Arc::new(TerminalEditor::new(document.clone(), cwd));
        let resolver = BinaryResolver::new(Arc::new(GoInstaller), config.tools_dir());
        let supervisor =
            SessionSupervisor::new(config, editor.clone(), resolver, Arc::new(ProcessLauncher));

        let executor: Arc<dyn CommandExecutor> = Arc::new(supervisor.clone());
        let symbols: Arc<dyn SymbolSource> = Arc::new(supervisor.clone());
        let packages = Arc::new(PackageResolver::new(editor.clone(), Arc::new(GoListQuery)));
        let engine = Arc::new(TestDiscoveryEngine::new(
            editor.clone(),
            symbols,
            packages.clone(),
        ));

        Self {
            commands: GoCommands::new(
                editor.clone(),
                executor.clone(),
                packages,
                Arc::new(StdoutPackageSink),
            ),
            dispatcher: Dispatcher::new(editor.clone(), executor.clone()),
            tests: GoTestsList::new(engine),
            packages: GoKnownPackagesList::new(editor, executor),
            supervisor,
            document,
        }
    }

    /// Start gopls and open the document the command was given
    pub async fn open_document(&self) -> GorigResult<()> {
        let Some(document) = &self.document else {
            return Ok(());
        };
        self.supervisor.ensure_started().await?;

        let text = tokio::fs::read_to_string(&document.path).await?;
        let language_id = if document.path.ends_with("go.mod") {
            "gomod"
        } else {
            "go"
        };
        debug!(document = %document.uri, language_id, "Opening document");
        self.supervisor
            .send_notification(
                "textDocument/didOpen",
                json!({
                    "textDocument": {
                        "uri": document.uri,
                        "languageId": language_id,
                        "version": 1,
                        "text": text,
                    }
                }),
            )
            .await
    }

    pub async fn shutdown(&self) {
        if let Err(e) = self.supervisor.stop().await {
            warn!(error = %e, "gopls did not stop cleanly");
        }
    }
}
