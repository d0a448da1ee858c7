//! Effect execution

use crate::lists::{Effect, ItemList};
use gorig_foundation::protocol::{CommandExecutor, Editor};
use gorig_foundation::{GorigError, GorigResult, InvocationRequest, MessageLevel};
use gorig_lsp::gopls;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Performs effects right away and reports failures to the user
pub struct Dispatcher {
    editor: Arc<dyn Editor>,
    executor: Arc<dyn CommandExecutor>,
}

impl Dispatcher {
    pub fn new(editor: Arc<dyn Editor>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { editor, executor }
    }

    /// Map `action` on `item` to an effect and perform it
    pub async fn run_action<L: ItemList>(
        &self,
        list: &L,
        action: L::Action,
        item: &L::Item,
    ) -> GorigResult<()> {
        debug!(list = list.name(), action = %action, item = %list.label(item), "List action");
        match list.action(action, item) {
            Ok(effect) => self.dispatch(effect).await,
            Err(e) => {
                self.surface(&e).await;
                Err(e)
            }
        }
    }

    /// Perform `effect`; any failure is also shown as a message
    pub async fn dispatch(&self, effect: Effect) -> GorigResult<()> {
        let result = self.perform(effect).await;
        if let Err(e) = &result {
            self.surface(e).await;
        }
        result
    }

    /// Show `error` to the user at its own severity
    pub async fn surface(&self, error: &GorigError) {
        if error.level() == MessageLevel::Error {
            warn!(error = %error, "Action failed");
        }
        self.editor
            .show_message(&error.to_string(), error.level())
            .await;
    }

    async fn perform(&self, effect: Effect) -> GorigResult<()> {
        match effect {
            Effect::Invoke(InvocationRequest::StructuredRun(run)) => {
                let names: Vec<&str> = run
                    .tests
                    .iter()
                    .chain(&run.benchmarks)
                    .map(String::as_str)
                    .collect();
                self.editor
                    .show_message(&format!("Running {}", names.join(", ")), MessageLevel::Info)
                    .await;
                gopls::run_tests(self.executor.as_ref(), &run).await
            }
            Effect::Invoke(InvocationRequest::ShellCommand(command)) => {
                info!(command = %command.text, "Running in terminal");
                self.editor.run_in_terminal(&command.text).await
            }
            Effect::Invoke(InvocationRequest::DebugLaunch(launch)) => {
                info!(program = %launch.program, pattern = %launch.test_pattern, "Launching debugger");
                self.editor.launch_debugger(&launch).await
            }
            Effect::Yank { register, content } => {
                self.editor.set_register(register, &content).await?;
                self.editor
                    .show_message(&format!("yanked to {register} register"), MessageLevel::Info)
                    .await;
                Ok(())
            }
            Effect::AddImport { import_path } => {
                let document = self
                    .editor
                    .active_document()
                    .await
                    .ok_or(GorigError::NoActiveDocument)?;
                gopls::add_import(self.executor.as_ref(), &document.uri, &import_path).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorig_foundation::{DebugLaunch, Document, ShellCommand, StructuredRun};
    use gorig_test_support::{MockCommandExecutor, RecordingEditor};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn dispatcher(
        editor: Arc<RecordingEditor>,
        executor: MockCommandExecutor,
    ) -> Dispatcher {
        Dispatcher::new(editor, Arc::new(executor))
    }

    #[tokio::test]
    async fn structured_run_announces_and_sends() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute_command()
            .with(
                eq(gopls::RUN_TESTS),
                eq(vec![json!({
                    "URI": "file:///a/a_test.go",
                    "Tests": ["TestA"],
                    "Benchmarks": ["BenchmarkB"]
                })]),
            )
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        let editor = Arc::new(RecordingEditor::new());

        dispatcher(editor.clone(), executor)
            .dispatch(Effect::Invoke(InvocationRequest::StructuredRun(
                StructuredRun {
                    uri: "file:///a/a_test.go".to_string(),
                    tests: vec!["TestA".to_string()],
                    benchmarks: vec!["BenchmarkB".to_string()],
                },
            )))
            .await
            .unwrap();

        assert_eq!(
            editor.messages(),
            vec![("Running TestA, BenchmarkB".to_string(), MessageLevel::Info)]
        );
    }

    #[tokio::test]
    async fn yank_sets_register_and_confirms() {
        let editor = Arc::new(RecordingEditor::new());

        dispatcher(editor.clone(), MockCommandExecutor::new())
            .dispatch(Effect::Yank {
                register: '"',
                content: "strings".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(editor.register('"').as_deref(), Some("strings"));
        assert_eq!(
            editor.messages(),
            vec![("yanked to \" register".to_string(), MessageLevel::Info)]
        );
    }

    #[tokio::test]
    async fn shell_and_debug_go_to_the_editor() {
        let editor = Arc::new(RecordingEditor::new());
        let dispatcher = dispatcher(editor.clone(), MockCommandExecutor::new());
        let launch = DebugLaunch {
            name: "TestA".to_string(),
            program: "example.com/a".to_string(),
            test_pattern: "^(TestA)$".to_string(),
        };

        dispatcher
            .dispatch(Effect::Invoke(InvocationRequest::ShellCommand(
                ShellCommand {
                    text: "go test example.com/a -run '^TestA$'".to_string(),
                },
            )))
            .await
            .unwrap();
        dispatcher
            .dispatch(Effect::Invoke(InvocationRequest::DebugLaunch(
                launch.clone(),
            )))
            .await
            .unwrap();

        assert_eq!(
            editor.terminal_commands(),
            vec!["go test example.com/a -run '^TestA$'"]
        );
        assert_eq!(editor.debug_launches(), vec![launch]);
    }

    #[tokio::test]
    async fn add_import_uses_document_active_at_dispatch() {
        let first = Document::from_path("/work/a/a.go").unwrap();
        let second = Document::from_path("/work/b/b.go").unwrap();
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute_command()
            .with(
                eq(gopls::ADD_IMPORT),
                eq(vec![json!({"URI": second.uri.clone(), "ImportPath": "strings"})]),
            )
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        let editor = Arc::new(RecordingEditor::new().with_active_document(first));
        let dispatcher = dispatcher(editor.clone(), executor);

        editor.set_active_document(Some(second));
        dispatcher
            .dispatch(Effect::AddImport {
                import_path: "strings".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failures_are_surfaced_as_messages() {
        let editor = Arc::new(RecordingEditor::new());

        let err = dispatcher(editor.clone(), MockCommandExecutor::new())
            .dispatch(Effect::AddImport {
                import_path: "strings".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, GorigError::NoActiveDocument);
        assert_eq!(
            editor.messages(),
            vec![("No active document".to_string(), MessageLevel::Info)]
        );
    }
}
