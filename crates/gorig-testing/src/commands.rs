//! Editor-facing commands

use crate::dispatch::Dispatcher;
use crate::lists::{GoKnownPackagesList, GoTestsList};
use crate::package::PackageResolver;
use gorig_config::logging::command_span;
use gorig_foundation::protocol::{CommandExecutor, Editor, PackageSink};
use gorig_foundation::{Document, GorigError, GorigResult};
use gorig_lsp::gopls;
use std::sync::Arc;
use tracing::{debug, Instrument};

/// Commands bound to the editor's command palette and autocommands
///
/// Each command reports its own failures through the editor and also
/// returns them, so a headless host can map them to an exit status.
pub struct GoCommands {
    editor: Arc<dyn Editor>,
    executor: Arc<dyn CommandExecutor>,
    packages: Arc<PackageResolver>,
    sink: Arc<dyn PackageSink>,
    dispatcher: Dispatcher,
}

impl GoCommands {
    pub fn new(
        editor: Arc<dyn Editor>,
        executor: Arc<dyn CommandExecutor>,
        packages: Arc<PackageResolver>,
        sink: Arc<dyn PackageSink>,
    ) -> Self {
        let dispatcher = Dispatcher::new(editor.clone(), executor.clone());
        Self {
            editor,
            executor,
            packages,
            sink,
            dispatcher,
        }
    }

    /// `go mod tidy` for the module of the active document
    pub async fn tidy(&self) -> GorigResult<()> {
        let document = self.editor.active_document().await;
        let span = command_span("tidy", document.as_ref().map(|d| d.uri.as_str()));
        self.report(
            async {
                let document = document.ok_or(GorigError::NoActiveDocument)?;
                gopls::tidy(self.executor.as_ref(), &[document.uri]).await
            }
            .instrument(span),
        )
        .await
    }

    /// Open the tests list for the active test file
    pub async fn run_tests(&self) -> GorigResult<()> {
        let document = self.editor.active_document().await;
        let span = command_span("runTests", document.as_ref().map(|d| d.uri.as_str()));
        self.report(
            async {
                let document = require_test_file(document)?;
                debug!(document = %document.uri, "Opening tests list");
                self.editor.open_list(GoTestsList::NAME).await
            }
            .instrument(span),
        )
        .await
    }

    pub async fn list_known_packages(&self) -> GorigResult<()> {
        let span = command_span("listKnownPackages", None);
        self.report(
            self.editor
                .open_list(GoKnownPackagesList::NAME)
                .instrument(span),
        )
        .await
    }

    /// Publish the package of the active document to the sink
    ///
    /// Runs on every buffer switch, so it never reports anything to the
    /// user. A buffer without a file publishes the empty package so the
    /// previous name does not linger.
    pub async fn track_current_package(&self) {
        let document = self.editor.active_document().await;
        let span = command_span(
            "trackCurrentPackage",
            document.as_ref().map(|d| d.uri.as_str()),
        );
        async {
            let package = self.packages.resolve(document.as_ref()).await;
            self.sink
                .current_package_changed(document.as_ref(), package.as_str())
                .await;
        }
        .instrument(span)
        .await
    }

    async fn report(
        &self,
        command: impl std::future::Future<Output = GorigResult<()>>,
    ) -> GorigResult<()> {
        let result = command.await;
        if let Err(e) = &result {
            self.dispatcher.surface(e).await;
        }
        result
    }
}

fn require_test_file(document: Option<Document>) -> GorigResult<Document> {
    let document = document.ok_or(GorigError::NoActiveDocument)?;
    if !document.is_test_file() {
        return Err(GorigError::NotATestFile { uri: document.uri });
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorig_foundation::MessageLevel;
    use gorig_test_support::{
        MockCommandExecutor, MockPackageQuery, MockPackageSink, RecordingEditor,
    };
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn commands(
        editor: Arc<RecordingEditor>,
        executor: MockCommandExecutor,
        query: MockPackageQuery,
        sink: MockPackageSink,
    ) -> GoCommands {
        let packages = Arc::new(PackageResolver::new(editor.clone(), Arc::new(query)));
        GoCommands::new(editor, Arc::new(executor), packages, Arc::new(sink))
    }

    #[tokio::test]
    async fn run_tests_rejects_non_test_file() {
        let doc = Document::from_path("/work/parser/parse.go").unwrap();
        let editor = Arc::new(RecordingEditor::new().with_active_document(doc));

        let err = commands(
            editor.clone(),
            MockCommandExecutor::new(),
            MockPackageQuery::new(),
            MockPackageSink::new(),
        )
        .run_tests()
        .await
        .unwrap_err();

        assert!(matches!(err, GorigError::NotATestFile { .. }));
        assert_eq!(
            editor.messages(),
            vec![("Document is not a test file".to_string(), MessageLevel::Error)]
        );
        assert!(editor.opened_lists().is_empty());
    }

    #[tokio::test]
    async fn run_tests_opens_tests_list() {
        let doc = Document::from_path("/work/parser/parse_test.go").unwrap();
        let editor = Arc::new(RecordingEditor::new().with_active_document(doc));

        commands(
            editor.clone(),
            MockCommandExecutor::new(),
            MockPackageQuery::new(),
            MockPackageSink::new(),
        )
        .run_tests()
        .await
        .unwrap();

        assert_eq!(editor.opened_lists(), vec!["gotests"]);
    }

    #[tokio::test]
    async fn tidy_sends_active_document() {
        let doc = Document::from_path("/work/go.mod").unwrap();
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute_command()
            .with(eq(gopls::TIDY), eq(vec![json!({"URIs": [doc.uri.clone()]})]))
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        let editor = Arc::new(RecordingEditor::new().with_active_document(doc));

        commands(
            editor,
            executor,
            MockPackageQuery::new(),
            MockPackageSink::new(),
        )
        .tidy()
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn tidy_without_document_is_reported() {
        let editor = Arc::new(RecordingEditor::new());
        let mut executor = MockCommandExecutor::new();
        executor.expect_execute_command().never();

        let err = commands(
            editor.clone(),
            executor,
            MockPackageQuery::new(),
            MockPackageSink::new(),
        )
        .tidy()
        .await
        .unwrap_err();

        assert_eq!(err, GorigError::NoActiveDocument);
        assert_eq!(editor.messages().len(), 1);
    }

    #[tokio::test]
    async fn list_known_packages_opens_list() {
        let editor = Arc::new(RecordingEditor::new());

        commands(
            editor.clone(),
            MockCommandExecutor::new(),
            MockPackageQuery::new(),
            MockPackageSink::new(),
        )
        .list_known_packages()
        .await
        .unwrap();

        assert_eq!(editor.opened_lists(), vec!["goknownpackages"]);
    }

    #[tokio::test]
    async fn track_current_package_writes_sink() {
        let doc = Document::from_path("/work/parser/parse.go").unwrap();
        let mut query = MockPackageQuery::new();
        query
            .expect_package_name()
            .times(1)
            .returning(|_| Ok("parser\n".to_string()));
        let mut sink = MockPackageSink::new();
        sink.expect_current_package_changed()
            .withf(|document, package| {
                let uri = document.map(|d| d.uri.as_str());
                uri.is_some_and(|uri| uri.ends_with("/parser/parse.go")) && package == "parser"
            })
            .times(1)
            .returning(|_, _| ());
        let editor = Arc::new(RecordingEditor::new().with_active_document(doc));

        commands(editor, MockCommandExecutor::new(), query, sink)
            .track_current_package()
            .await;
    }

    #[tokio::test]
    async fn track_current_package_without_document_publishes_empty_package() {
        let mut query = MockPackageQuery::new();
        query.expect_package_name().never();
        let mut sink = MockPackageSink::new();
        sink.expect_current_package_changed()
            .withf(|document, package| document.is_none() && package.is_empty())
            .times(1)
            .returning(|_, _| ());
        let editor = Arc::new(RecordingEditor::new());

        commands(editor.clone(), MockCommandExecutor::new(), query, sink)
            .track_current_package()
            .await;

        assert!(editor.messages().is_empty());
    }
}
