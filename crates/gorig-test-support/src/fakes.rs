//! Recording fakes
//!
//! Unlike the mocks these keep state, so a test can drive a whole flow and
//! inspect what happened afterwards.

use async_trait::async_trait;
use gorig_foundation::protocol::{Editor, LanguageServer, ServerLauncher, SymbolSource};
use gorig_foundation::{
    ClientOptions, DebugLaunch, Document, GorigError, GorigResult, LaunchPlan, MessageLevel,
    SymbolRef,
};
use lsp_types::SymbolKind;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A function symbol as a workspace query returns it
pub fn function(name: &str, container: Option<&str>) -> SymbolRef {
    SymbolRef {
        name: name.to_string(),
        kind: SymbolKind::FUNCTION,
        container: container.map(str::to_string),
    }
}

/// A symbol of any kind
pub fn symbol(name: &str, kind: SymbolKind, container: Option<&str>) -> SymbolRef {
    SymbolRef {
        name: name.to_string(),
        kind,
        container: container.map(str::to_string),
    }
}

/// Editor that records every interaction
#[derive(Default)]
pub struct RecordingEditor {
    active: Mutex<Option<Document>>,
    host_env: HashMap<String, String>,
    cwd: PathBuf,
    messages: Mutex<Vec<(String, MessageLevel)>>,
    registers: Mutex<HashMap<char, String>>,
    terminal: Mutex<Vec<String>>,
    debug_launches: Mutex<Vec<DebugLaunch>>,
    lists: Mutex<Vec<String>>,
}

impl RecordingEditor {
    pub fn new() -> Self {
        Self {
            cwd: std::env::temp_dir(),
            ..Self::default()
        }
    }

    pub fn with_active_document(self, document: Document) -> Self {
        self.set_active_document(Some(document));
        self
    }

    pub fn with_host_env(mut self, name: &str, value: &str) -> Self {
        self.host_env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn set_active_document(&self, document: Option<Document>) {
        *self.active.lock().expect("editor lock poisoned") = document;
    }

    pub fn messages(&self) -> Vec<(String, MessageLevel)> {
        self.messages.lock().expect("editor lock poisoned").clone()
    }

    pub fn register(&self, register: char) -> Option<String> {
        self.registers
            .lock()
            .expect("editor lock poisoned")
            .get(&register)
            .cloned()
    }

    pub fn terminal_commands(&self) -> Vec<String> {
        self.terminal.lock().expect("editor lock poisoned").clone()
    }

    pub fn debug_launches(&self) -> Vec<DebugLaunch> {
        self.debug_launches.lock().expect("editor lock poisoned").clone()
    }

    pub fn opened_lists(&self) -> Vec<String> {
        self.lists.lock().expect("editor lock poisoned").clone()
    }
}

#[async_trait]
impl Editor for RecordingEditor {
    async fn active_document(&self) -> Option<Document> {
        self.active.lock().expect("editor lock poisoned").clone()
    }

    async fn show_message(&self, message: &str, level: MessageLevel) {
        self.messages
            .lock()
            .expect("editor lock poisoned")
            .push((message.to_string(), level));
    }

    async fn set_register(&self, register: char, content: &str) -> GorigResult<()> {
        self.registers
            .lock()
            .expect("editor lock poisoned")
            .insert(register, content.to_string());
        Ok(())
    }

    async fn run_in_terminal(&self, command: &str) -> GorigResult<()> {
        self.terminal
            .lock()
            .expect("editor lock poisoned")
            .push(command.to_string());
        Ok(())
    }

    async fn launch_debugger(&self, launch: &DebugLaunch) -> GorigResult<()> {
        self.debug_launches
            .lock()
            .expect("editor lock poisoned")
            .push(launch.clone());
        Ok(())
    }

    async fn open_list(&self, name: &str) -> GorigResult<()> {
        self.lists
            .lock()
            .expect("editor lock poisoned")
            .push(name.to_string());
        Ok(())
    }

    async fn host_env(&self, name: &str) -> Option<String> {
        self.host_env.get(name).cloned()
    }

    fn cwd(&self) -> PathBuf {
        self.cwd.clone()
    }
}

/// In-memory language server
#[derive(Default)]
pub struct FakeLanguageServer {
    responses: HashMap<String, Value>,
    response_delay: Option<Duration>,
    requests: Mutex<Vec<(String, Value)>>,
    notifications: Mutex<Vec<(String, Value)>>,
    shut_down: AtomicBool,
}

impl FakeLanguageServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with `result`; other methods get `null`
    pub fn with_response(mut self, method: &str, result: Value) -> Self {
        self.responses.insert(method.to_string(), result);
        self
    }

    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().expect("server lock poisoned").clone()
    }

    pub fn notifications(&self) -> Vec<(String, Value)> {
        self.notifications.lock().expect("server lock poisoned").clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageServer for FakeLanguageServer {
    async fn request(&self, method: &str, params: Value) -> GorigResult<Value> {
        self.requests
            .lock()
            .expect("server lock poisoned")
            .push((method.to_string(), params));
        if let Some(delay) = self.response_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.responses.get(method).cloned().unwrap_or(Value::Null))
    }

    async fn notify(&self, method: &str, params: Value) -> GorigResult<()> {
        self.notifications
            .lock()
            .expect("server lock poisoned")
            .push((method.to_string(), params));
        Ok(())
    }

    async fn shutdown(&self) -> GorigResult<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

type ServerFactory = Box<dyn Fn() -> FakeLanguageServer + Send + Sync>;

/// Launcher producing [`FakeLanguageServer`]s, counting every attempt
pub struct ScriptedLauncher {
    delay: Option<Duration>,
    failures: usize,
    factory: ServerFactory,
    attempts: AtomicUsize,
    plans: Mutex<Vec<LaunchPlan>>,
    servers: Mutex<Vec<Arc<FakeLanguageServer>>>,
}

impl Default for ScriptedLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self {
            delay: None,
            failures: 0,
            factory: Box::new(FakeLanguageServer::new),
            attempts: AtomicUsize::new(0),
            plans: Mutex::new(Vec::new()),
            servers: Mutex::new(Vec::new()),
        }
    }

    /// Each launch takes `delay` before completing
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The first `count` launches fail with a spawn error
    pub fn failing_first(mut self, count: usize) -> Self {
        self.failures = count;
        self
    }

    pub fn with_server_factory(
        mut self,
        factory: impl Fn() -> FakeLanguageServer + Send + Sync + 'static,
    ) -> Self {
        self.factory = Box::new(factory);
        self
    }

    pub fn launch_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn plans(&self) -> Vec<LaunchPlan> {
        self.plans.lock().expect("launcher lock poisoned").clone()
    }

    /// The `index`-th successfully launched server
    pub fn server(&self, index: usize) -> Arc<FakeLanguageServer> {
        self.servers.lock().expect("launcher lock poisoned")[index].clone()
    }
}

#[async_trait]
impl ServerLauncher for ScriptedLauncher {
    async fn launch(
        &self,
        plan: LaunchPlan,
        _options: ClientOptions,
    ) -> GorigResult<Arc<dyn LanguageServer>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let command = plan.command.display().to_string();
        self.plans
            .lock()
            .expect("launcher lock poisoned")
            .push(plan);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if attempt <= self.failures {
            return Err(GorigError::spawn(command, "scripted launch failure"));
        }

        let server = Arc::new((self.factory)());
        self.servers
            .lock()
            .expect("launcher lock poisoned")
            .push(server.clone());
        Ok(server)
    }
}

/// Symbol index answering from fixed tables and logging every query
#[derive(Default)]
pub struct FakeSymbolSource {
    workspace: HashMap<String, Vec<SymbolRef>>,
    documents: HashMap<String, Vec<SymbolRef>>,
    workspace_queries: Mutex<Vec<String>>,
    document_queries: Mutex<Vec<String>>,
}

impl FakeSymbolSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, query: &str, symbols: Vec<SymbolRef>) -> Self {
        self.workspace.insert(query.to_string(), symbols);
        self
    }

    pub fn with_document(mut self, uri: &str, symbols: Vec<SymbolRef>) -> Self {
        self.documents.insert(uri.to_string(), symbols);
        self
    }

    pub fn workspace_queries(&self) -> Vec<String> {
        self.workspace_queries
            .lock()
            .expect("symbol lock poisoned")
            .clone()
    }

    pub fn document_queries(&self) -> Vec<String> {
        self.document_queries
            .lock()
            .expect("symbol lock poisoned")
            .clone()
    }
}

#[async_trait]
impl SymbolSource for FakeSymbolSource {
    async fn workspace_symbols(&self, query: &str) -> GorigResult<Vec<SymbolRef>> {
        self.workspace_queries
            .lock()
            .expect("symbol lock poisoned")
            .push(query.to_string());
        Ok(self.workspace.get(query).cloned().unwrap_or_default())
    }

    async fn document_symbols(&self, document_uri: &str) -> GorigResult<Vec<SymbolRef>> {
        self.document_queries
            .lock()
            .expect("symbol lock poisoned")
            .push(document_uri.to_string());
        Ok(self.documents.get(document_uri).cloned().unwrap_or_default())
    }
}
