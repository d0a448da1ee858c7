//! Action-bound item lists presented to the user
//!
//! A list loads its items on demand and maps `(action, item)` to an
//! [`Effect`] without touching the editor. The [`Dispatcher`] performs the
//! effect.
//!
//! [`Dispatcher`]: crate::dispatch::Dispatcher

use crate::discovery::TestDiscoveryEngine;
use crate::invocation::{item_set, to_debug_launch, to_shell_command, to_structured_run};
use async_trait::async_trait;
use gorig_foundation::protocol::{CommandExecutor, Editor};
use gorig_foundation::{GorigError, GorigResult, InvocationRequest, TestItem};
use gorig_lsp::gopls;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Register that receives yanked commands and names
pub const CLIPBOARD_REGISTER: char = '+';
/// Register that receives yanked package paths
pub const UNNAMED_REGISTER: char = '"';

/// Side effect requested by a list action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Invoke(InvocationRequest),
    Yank { register: char, content: String },
    /// Import into whatever document is active when the effect runs
    AddImport { import_path: String },
}

/// A named list of items with actions
#[async_trait]
pub trait ItemList: Send + Sync {
    type Item: Clone + Send + Sync;
    type Action: Copy + Send + Sync + FromStr<Err = GorigError> + fmt::Display;

    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn default_action(&self) -> Self::Action;
    fn actions(&self) -> &'static [Self::Action];

    /// Display label of an item
    fn label(&self, item: &Self::Item) -> String;

    async fn load_items(&self) -> GorigResult<Vec<Self::Item>>;

    fn action(&self, action: Self::Action, item: &Self::Item) -> GorigResult<Effect>;
}

fn unknown_action(list: &str, name: &str) -> GorigError {
    GorigError::config(format!("Unknown action '{name}' for list '{list}'"))
}

/// Actions of the `gotests` list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestAction {
    Run,
    YankAsShellCommand,
    YankAsAsyncRunCommand,
    YankNameOnly,
    Debug,
}

impl TestAction {
    pub const ALL: [TestAction; 5] = [
        TestAction::Run,
        TestAction::YankAsShellCommand,
        TestAction::YankAsAsyncRunCommand,
        TestAction::YankNameOnly,
        TestAction::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::YankAsShellCommand => "yank-as-shell-command",
            Self::YankAsAsyncRunCommand => "yank-as-async-run-command",
            Self::YankNameOnly => "yank-name-only",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for TestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestAction {
    type Err = GorigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| unknown_action(GoTestsList::NAME, s))
    }
}

/// Tests and benchmarks around the active document
pub struct GoTestsList {
    engine: Arc<TestDiscoveryEngine>,
}

impl GoTestsList {
    pub const NAME: &'static str = "gotests";

    pub fn new(engine: Arc<TestDiscoveryEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ItemList for GoTestsList {
    type Item = TestItem;
    type Action = TestAction;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "go tests & benchmarks in current file"
    }

    fn default_action(&self) -> TestAction {
        TestAction::Debug
    }

    fn actions(&self) -> &'static [TestAction] {
        &TestAction::ALL
    }

    fn label(&self, item: &TestItem) -> String {
        item.label.clone()
    }

    async fn load_items(&self) -> GorigResult<Vec<TestItem>> {
        Ok(self.engine.discover().await?.items())
    }

    fn action(&self, action: TestAction, item: &TestItem) -> GorigResult<Effect> {
        let set = item_set(item);
        let selection = &item.tests;
        Ok(match action {
            TestAction::Run => Effect::Invoke(InvocationRequest::StructuredRun(
                to_structured_run(&set, selection)?,
            )),
            TestAction::YankAsShellCommand => Effect::Yank {
                register: CLIPBOARD_REGISTER,
                content: to_shell_command(&set, selection)?.text,
            },
            TestAction::YankAsAsyncRunCommand => Effect::Invoke(InvocationRequest::ShellCommand(
                to_shell_command(&set, selection)?,
            )),
            TestAction::YankNameOnly => {
                if selection.is_empty() {
                    return Err(GorigError::EmptySelection);
                }
                Effect::Yank {
                    register: CLIPBOARD_REGISTER,
                    content: selection.join(" "),
                }
            }
            TestAction::Debug => Effect::Invoke(InvocationRequest::DebugLaunch(to_debug_launch(
                &set, selection,
            )?)),
        })
    }
}

/// Actions of the `goknownpackages` list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAction {
    Import,
    Yank,
}

impl PackageAction {
    pub const ALL: [PackageAction; 2] = [PackageAction::Import, PackageAction::Yank];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Yank => "yank",
        }
    }
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageAction {
    type Err = GorigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| unknown_action(GoKnownPackagesList::NAME, s))
    }
}

/// Import paths gopls knows for the active document
pub struct GoKnownPackagesList {
    editor: Arc<dyn Editor>,
    executor: Arc<dyn CommandExecutor>,
}

impl GoKnownPackagesList {
    pub const NAME: &'static str = "goknownpackages";

    pub fn new(editor: Arc<dyn Editor>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { editor, executor }
    }
}

#[async_trait]
impl ItemList for GoKnownPackagesList {
    type Item = String;
    type Action = PackageAction;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "go known packages"
    }

    fn default_action(&self) -> PackageAction {
        PackageAction::Import
    }

    fn actions(&self) -> &'static [PackageAction] {
        &PackageAction::ALL
    }

    fn label(&self, item: &String) -> String {
        item.clone()
    }

    async fn load_items(&self) -> GorigResult<Vec<String>> {
        let document = self
            .editor
            .active_document()
            .await
            .ok_or(GorigError::NoActiveDocument)?;
        gopls::list_known_packages(self.executor.as_ref(), &document.uri).await
    }

    fn action(&self, action: PackageAction, item: &String) -> GorigResult<Effect> {
        Ok(match action {
            PackageAction::Import => Effect::AddImport {
                import_path: item.clone(),
            },
            PackageAction::Yank => Effect::Yank {
                register: UNNAMED_REGISTER,
                content: item.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageResolver;
    use gorig_foundation::{Document, ShellCommand, StructuredRun};
    use gorig_test_support::{
        FakeSymbolSource, MockCommandExecutor, MockPackageQuery, RecordingEditor,
    };
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const URI: &str = "file:///work/parser/parse_test.go";

    fn tests_list() -> GoTestsList {
        let editor: Arc<dyn Editor> = Arc::new(RecordingEditor::new());
        let packages = Arc::new(PackageResolver::new(
            editor.clone(),
            Arc::new(MockPackageQuery::new()),
        ));
        GoTestsList::new(Arc::new(TestDiscoveryEngine::new(
            editor,
            Arc::new(FakeSymbolSource::new()),
            packages,
        )))
    }

    fn item(tests: &[&str]) -> TestItem {
        TestItem {
            label: tests.join(" "),
            document_uri: Some(URI.to_string()),
            container: Some("example.com/parser".to_string()),
            tests: tests.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn action_names_round_trip() {
        for action in TestAction::ALL {
            assert_eq!(action.to_string().parse::<TestAction>().unwrap(), action);
        }
        for action in PackageAction::ALL {
            assert_eq!(action.to_string().parse::<PackageAction>().unwrap(), action);
        }
        assert!("AsyncRun".parse::<TestAction>().is_err());
    }

    #[test]
    fn list_metadata() {
        let list = tests_list();
        assert_eq!(list.name(), "gotests");
        assert_eq!(list.description(), "go tests & benchmarks in current file");
        assert_eq!(list.default_action(), TestAction::Debug);
    }

    #[test]
    fn run_maps_to_structured_run() {
        let effect = tests_list()
            .action(TestAction::Run, &item(&["TestA", "BenchmarkB"]))
            .unwrap();
        assert_eq!(
            effect,
            Effect::Invoke(InvocationRequest::StructuredRun(StructuredRun {
                uri: URI.to_string(),
                tests: vec!["TestA".to_string()],
                benchmarks: vec!["BenchmarkB".to_string()],
            }))
        );
    }

    #[test]
    fn yank_actions_target_clipboard() {
        let list = tests_list();
        assert_eq!(
            list.action(TestAction::YankNameOnly, &item(&["TestA", "TestB"]))
                .unwrap(),
            Effect::Yank {
                register: '+',
                content: "TestA TestB".to_string(),
            }
        );
        assert_eq!(
            list.action(TestAction::YankAsShellCommand, &item(&["TestA"]))
                .unwrap(),
            Effect::Yank {
                register: '+',
                content: "go test example.com/parser -run '^TestA$' -timeout 30s -v -count 1"
                    .to_string(),
            }
        );
    }

    #[test]
    fn async_run_invokes_shell_command() {
        let effect = tests_list()
            .action(TestAction::YankAsAsyncRunCommand, &item(&["TestA"]))
            .unwrap();
        assert_eq!(
            effect,
            Effect::Invoke(InvocationRequest::ShellCommand(ShellCommand {
                text: "go test example.com/parser -run '^TestA$' -timeout 30s -v -count 1"
                    .to_string(),
            }))
        );
    }

    #[tokio::test]
    async fn tests_list_without_document_is_empty() {
        assert!(tests_list().load_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn known_packages_need_active_document() {
        let list = GoKnownPackagesList::new(
            Arc::new(RecordingEditor::new()),
            Arc::new(MockCommandExecutor::new()),
        );
        assert_eq!(list.load_items().await, Err(GorigError::NoActiveDocument));
    }

    #[tokio::test]
    async fn known_packages_load_from_gopls() {
        let doc = Document::from_path("/work/parser/parse.go").unwrap();
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute_command()
            .with(
                eq(gopls::LIST_KNOWN_PACKAGES),
                eq(vec![json!({"URI": doc.uri.clone()})]),
            )
            .times(1)
            .returning(|_, _| Ok(json!({"Packages": ["bytes", "strings"]})));

        let list = GoKnownPackagesList::new(
            Arc::new(RecordingEditor::new().with_active_document(doc)),
            Arc::new(executor),
        );
        assert_eq!(list.load_items().await.unwrap(), vec!["bytes", "strings"]);
        assert_eq!(list.default_action(), PackageAction::Import);
    }

    #[test]
    fn package_actions() {
        let list = GoKnownPackagesList::new(
            Arc::new(RecordingEditor::new()),
            Arc::new(MockCommandExecutor::new()),
        );
        let path = "golang.org/x/sync/errgroup".to_string();
        assert_eq!(
            list.action(PackageAction::Import, &path).unwrap(),
            Effect::AddImport {
                import_path: path.clone()
            }
        );
        assert_eq!(
            list.action(PackageAction::Yank, &path).unwrap(),
            Effect::Yank {
                register: '"',
                content: path.clone()
            }
        );
    }
}
