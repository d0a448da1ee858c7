//! Discovery through dispatch, against fake symbol data

use gorig_foundation::protocol::Editor;
use gorig_foundation::{Document, GorigError, MessageLevel, ALL_TESTS_LABEL};
use gorig_test_support::{
    function, FakeSymbolSource, MockCommandExecutor, MockPackageQuery, RecordingEditor,
};
use gorig_testing::{
    Dispatcher, GoTestsList, ItemList, PackageResolver, TestAction, TestDiscoveryEngine,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const CONTAINER: &str = "example.com/project/parser";

struct Harness {
    editor: Arc<RecordingEditor>,
    source: Arc<FakeSymbolSource>,
    list: GoTestsList,
}

fn harness(document: &Document, source: FakeSymbolSource) -> Harness {
    let editor = Arc::new(RecordingEditor::new().with_active_document(document.clone()));
    let source = Arc::new(source);
    let mut query = MockPackageQuery::new();
    query
        .expect_package_name()
        .returning(|_| Ok("parser\n".to_string()));

    let editor_dyn: Arc<dyn Editor> = editor.clone();
    let packages = Arc::new(PackageResolver::new(editor_dyn.clone(), Arc::new(query)));
    let engine = TestDiscoveryEngine::new(editor_dyn, source.clone(), packages);
    Harness {
        editor,
        source,
        list: GoTestsList::new(Arc::new(engine)),
    }
}

fn test_file() -> Document {
    Document::from_path("/work/project/parser/parse_test.go").unwrap()
}

#[tokio::test]
async fn workspace_hit_never_queries_document() {
    let doc = test_file();
    let h = harness(
        &doc,
        FakeSymbolSource::new()
            .with_workspace(
                "^parser.Test",
                vec![
                    function("parser.TestParse", Some(CONTAINER)),
                    function("parser.TestLex", Some(CONTAINER)),
                ],
            )
            .with_document(&doc.uri, vec![function("TestOther", None)]),
    );

    let items = h.list.load_items().await.unwrap();

    let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["TestParse", "TestLex", ALL_TESTS_LABEL]);
    assert!(h.source.document_queries().is_empty());
    assert!(items.iter().all(|i| i.container.as_deref() == Some(CONTAINER)));
}

#[tokio::test]
async fn empty_workspace_falls_back_to_document() {
    let doc = test_file();
    let h = harness(
        &doc,
        FakeSymbolSource::new()
            .with_document(
                &doc.uri,
                vec![function("TestParse", None), function("BenchmarkParse", None)],
            )
            .with_workspace(
                "'parser.TestParse",
                vec![function("parser.TestParse", Some(CONTAINER))],
            ),
    );

    let items = h.list.load_items().await.unwrap();

    assert_eq!(h.source.document_queries(), vec![doc.uri.clone()]);
    assert_eq!(
        h.source.workspace_queries(),
        vec!["^parser.Test", "^parser.Benchmark", "'parser.TestParse"]
    );
    let all = items.last().unwrap();
    assert_eq!(all.label, ALL_TESTS_LABEL);
    assert_eq!(all.tests, vec!["TestParse", "BenchmarkParse"]);
    assert_eq!(all.container.as_deref(), Some(CONTAINER));
}

#[tokio::test]
async fn ambiguous_container_fails_discovery() {
    let doc = test_file();
    let h = harness(
        &doc,
        FakeSymbolSource::new()
            .with_document(&doc.uri, vec![function("TestParse", None)])
            .with_workspace(
                "'parser.TestParse",
                vec![
                    function("parser.TestParse", Some(CONTAINER)),
                    function("parser.TestParse", Some("example.com/fork/parser")),
                ],
            ),
    );

    let err = h.list.load_items().await.unwrap_err();
    assert!(matches!(
        err,
        GorigError::ContainerResolutionAmbiguous { matches: 2, .. }
    ));
}

#[tokio::test]
async fn resumed_list_targets_discovery_document() {
    let doc = test_file();
    let h = harness(
        &doc,
        FakeSymbolSource::new().with_workspace(
            "^parser.Test",
            vec![
                function("parser.TestParse", Some(CONTAINER)),
                function("parser.TestLex", Some(CONTAINER)),
            ],
        ),
    );
    let items = h.list.load_items().await.unwrap();
    h.editor
        .set_active_document(Document::from_path("/work/project/lexer/lex.go"));

    let dispatcher = Dispatcher::new(h.editor.clone(), Arc::new(MockCommandExecutor::new()));
    let all = items.last().unwrap();
    dispatcher
        .run_action(&h.list, TestAction::YankAsAsyncRunCommand, all)
        .await
        .unwrap();
    dispatcher
        .run_action(&h.list, h.list.default_action(), all)
        .await
        .unwrap();

    assert_eq!(
        h.editor.terminal_commands(),
        vec![format!(
            "go test {CONTAINER} -run '^(TestParse|TestLex)$' -timeout 30s -v -count 1"
        )]
    );
    let launches = h.editor.debug_launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].program, CONTAINER);
    assert_eq!(launches[0].test_pattern, "^(TestParse|TestLex)$");
}

#[tokio::test]
async fn benchmark_only_multi_selection_is_reported() {
    let doc = test_file();
    let h = harness(
        &doc,
        FakeSymbolSource::new().with_workspace(
            "^parser.Benchmark",
            vec![
                function("parser.BenchmarkParse", Some(CONTAINER)),
                function("parser.BenchmarkLex", Some(CONTAINER)),
            ],
        ),
    );
    let items = h.list.load_items().await.unwrap();
    let dispatcher = Dispatcher::new(h.editor.clone(), Arc::new(MockCommandExecutor::new()));

    let err = dispatcher
        .run_action(&h.list, TestAction::YankAsShellCommand, items.last().unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, GorigError::EmptySelection);
    assert_eq!(
        h.editor.messages(),
        vec![(
            "No tests or benchmarks found in current file".to_string(),
            MessageLevel::Info
        )]
    );
    assert_eq!(h.editor.register('+'), None);
}
