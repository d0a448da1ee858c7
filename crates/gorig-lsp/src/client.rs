//! JSON-RPC client for one gopls process over stdio

use crate::transport::{read_frame, write_message};
use crate::workspace_edit;
use async_trait::async_trait;
use gorig_foundation::protocol::{LanguageServer, ServerLauncher};
use gorig_foundation::{ClientOptions, GorigError, GorigResult, LaunchPlan};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

/// Timeout for LSP requests
const LSP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for LSP initialization
const LSP_INIT_TIMEOUT: Duration = Duration::from_secs(60);
/// Grace period for the process to exit after `exit`
const LSP_EXIT_TIMEOUT: Duration = Duration::from_secs(5);
/// Buffer size for the outgoing message channel
const CHANNEL_BUFFER_SIZE: usize = 256;

type PendingRequests = Arc<Mutex<HashMap<i64, oneshot::Sender<GorigResult<Value>>>>>;

/// Messages written to the server
#[derive(Debug)]
enum OutgoingMessage {
    Request { id: i64, method: String, params: Value },
    Notification { method: String, params: Value },
    Response { id: Value, result: Value },
    ErrorResponse { id: Value, error: Value },
}

impl OutgoingMessage {
    fn to_json(&self) -> Value {
        match self {
            Self::Request { id, method, params } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params
            }),
            Self::Notification { method, params } => json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params
            }),
            Self::Response { id, result } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result
            }),
            Self::ErrorResponse { id, error } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": error
            }),
        }
    }
}

/// What the reader needs to answer server-initiated requests
#[derive(Debug, Clone)]
struct ServerRequestContext {
    settings: Option<Value>,
    root_uri: Option<String>,
    workspace_folders: bool,
}

/// Connection to a gopls process
pub struct LspClient {
    /// Child process, absent for in-memory connections
    process: Option<Mutex<Child>>,
    message_tx: mpsc::Sender<OutgoingMessage>,
    pending_requests: PendingRequests,
    next_id: AtomicI64,
    command: String,
}

impl LspClient {
    /// Spawn the server described by `plan` and complete the handshake
    pub async fn start(plan: &LaunchPlan, options: &ClientOptions) -> GorigResult<Self> {
        let command = plan.command.display().to_string();

        debug!(
            command = %command,
            args = ?plan.args,
            cwd = %plan.working_directory.display(),
            "Spawning language server"
        );

        // The daemon outlives the forwarder, so only the direct child is killed
        let mut child = Command::new(&plan.command)
            .args(&plan.args)
            .env_clear()
            .envs(&plan.environment)
            .current_dir(&plan.working_directory)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(command = %command, error = %e, "Failed to spawn language server");
                GorigError::spawn(&command, e.to_string())
            })?;

        let pid = child.id();
        debug!(command = %command, pid = ?pid, "Language server process spawned");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GorigError::spawn(&command, "failed to get stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GorigError::spawn(&command, "failed to get stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GorigError::spawn(&command, "failed to get stderr"))?;

        spawn_stderr_forwarder(command.clone(), stderr);

        let root_uri = url::Url::from_directory_path(&plan.working_directory)
            .ok()
            .map(|u| u.to_string());
        let mut client = Self::connect(stdout, stdin, command.clone(), root_uri.clone(), options);
        client.process = Some(Mutex::new(child));

        if let Err(e) = client.initialize(root_uri, options).await {
            client.kill().await;
            return Err(match e {
                GorigError::Spawn { .. } => e,
                other => GorigError::spawn(&command, other.to_string()),
            });
        }

        Ok(client)
    }

    /// Run the protocol over arbitrary streams without a process
    fn connect<R, W>(
        reader: R,
        writer: W,
        command: String,
        root_uri: Option<String>,
        options: &ClientOptions,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending_requests: PendingRequests = Arc::new(Mutex::new(HashMap::new()));
        let (message_tx, message_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        spawn_writer(writer, message_rx);

        let context = ServerRequestContext {
            settings: options.initialization_options.clone(),
            root_uri,
            workspace_folders: !options.disable_workspace_folders,
        };
        spawn_reader(
            command.clone(),
            BufReader::new(reader),
            pending_requests.clone(),
            message_tx.clone(),
            context,
        );

        Self {
            process: None,
            message_tx,
            pending_requests,
            next_id: AtomicI64::new(1),
            command,
        }
    }

    /// Send a request and await the response
    pub async fn send_request(&self, method: &str, params: Value) -> GorigResult<Value> {
        self.send_request_with_timeout(method, params, LSP_REQUEST_TIMEOUT)
            .await
    }

    async fn send_request_with_timeout(
        &self,
        method: &str,
        params: Value,
        limit: Duration,
    ) -> GorigResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (response_tx, response_rx) = oneshot::channel();
        self.pending_requests.lock().await.insert(id, response_tx);

        debug!(lsp_method = %method, lsp_request_id = id, "Sending LSP request");

        let message = OutgoingMessage::Request {
            id,
            method: method.to_string(),
            params,
        };
        if self.message_tx.send(message).await.is_err() {
            self.pending_requests.lock().await.remove(&id);
            return Err(GorigError::lsp_method(method, "connection closed"));
        }

        let start_time = std::time::Instant::now();
        match timeout(limit, response_rx).await {
            Ok(Ok(result)) => {
                debug!(
                    lsp_method = %method,
                    lsp_request_id = id,
                    duration_ms = start_time.elapsed().as_millis() as u64,
                    response_success = result.is_ok(),
                    "Received LSP response"
                );
                result.map_err(|e| match e {
                    GorigError::Lsp { message, .. } => GorigError::lsp_method(method, message),
                    other => other,
                })
            }
            Ok(Err(_)) => {
                self.pending_requests.lock().await.remove(&id);
                Err(GorigError::lsp_method(method, "response channel closed"))
            }
            Err(_) => {
                warn!(
                    lsp_method = %method,
                    lsp_request_id = id,
                    timeout_ms = limit.as_millis() as u64,
                    "LSP request timeout"
                );
                self.pending_requests.lock().await.remove(&id);
                Err(GorigError::timeout(format!("LSP request {}", method)))
            }
        }
    }

    /// Send a notification (no response expected)
    pub async fn send_notification(&self, method: &str, params: Value) -> GorigResult<()> {
        let message = OutgoingMessage::Notification {
            method: method.to_string(),
            params,
        };
        self.message_tx
            .send(message)
            .await
            .map_err(|_| GorigError::lsp_method(method, "connection closed"))?;
        debug!(lsp_method = %method, "Queued LSP notification");
        Ok(())
    }

    async fn initialize(
        &self,
        root_uri: Option<String>,
        options: &ClientOptions,
    ) -> GorigResult<()> {
        let mut params = json!({
            "processId": std::process::id(),
            "clientInfo": {
                "name": "gorig",
                "version": env!("CARGO_PKG_VERSION")
            },
            "rootUri": root_uri,
            "capabilities": client_capabilities(options),
        });

        if let Some(obj) = params.as_object_mut() {
            if options.disable_workspace_folders {
                obj.insert("workspaceFolders".to_string(), Value::Null);
            } else if let Some(uri) = &root_uri {
                obj.insert(
                    "workspaceFolders".to_string(),
                    json!([{ "uri": uri, "name": folder_name(uri) }]),
                );
            }
            if let Some(init_options) = &options.initialization_options {
                obj.insert("initializationOptions".to_string(), init_options.clone());
            }
        }

        info!(command = %self.command, "Sending LSP initialize request");

        let result = self
            .send_request_with_timeout("initialize", params, LSP_INIT_TIMEOUT)
            .await?;

        match serde_json::from_value::<lsp_types::InitializeResult>(result) {
            Ok(init_result) => {
                let (name, version) = init_result
                    .server_info
                    .map(|info| (info.name, info.version.unwrap_or_default()))
                    .unwrap_or_default();
                info!(
                    command = %self.command,
                    server = %name,
                    server_version = %version,
                    "Language server initialized"
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse InitializeResult");
            }
        }

        self.send_notification("initialized", json!({})).await
    }

    /// `shutdown` request, `exit` notification, then wait for the process
    pub async fn shutdown(&self) -> GorigResult<()> {
        if let Err(e) = self
            .send_request_with_timeout("shutdown", Value::Null, LSP_EXIT_TIMEOUT)
            .await
        {
            warn!(command = %self.command, error = %e, "LSP shutdown request failed");
        }
        if let Err(e) = self.send_notification("exit", Value::Null).await {
            debug!(command = %self.command, error = %e, "LSP exit notification not sent");
        }

        let Some(process) = &self.process else {
            return Ok(());
        };
        let mut child = process.lock().await;
        let pid = child.id();
        match timeout(LSP_EXIT_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(pid = ?pid, exit_status = ?status, "Language server exited");
                Ok(())
            }
            Ok(Err(e)) => Err(GorigError::from(e)),
            Err(_) => {
                warn!(pid = ?pid, "Language server did not exit in time, killing it");
                child.kill().await.map_err(GorigError::from)
            }
        }
    }

    async fn kill(&self) {
        if let Some(process) = &self.process {
            let mut child = process.lock().await;
            if let Err(e) = child.kill().await {
                warn!(command = %self.command, error = %e, "Failed to kill language server");
            }
        }
    }
}

#[async_trait]
impl LanguageServer for LspClient {
    async fn request(&self, method: &str, params: Value) -> GorigResult<Value> {
        self.send_request(method, params).await
    }

    async fn notify(&self, method: &str, params: Value) -> GorigResult<()> {
        self.send_notification(method, params).await
    }

    async fn shutdown(&self) -> GorigResult<()> {
        LspClient::shutdown(self).await
    }
}

/// Launches gopls processes through [`LspClient`]
#[derive(Debug, Default)]
pub struct ProcessLauncher;

#[async_trait]
impl ServerLauncher for ProcessLauncher {
    async fn launch(
        &self,
        plan: LaunchPlan,
        options: ClientOptions,
    ) -> GorigResult<Arc<dyn LanguageServer>> {
        let client = LspClient::start(&plan, &options).await?;
        Ok(Arc::new(client))
    }
}

fn client_capabilities(options: &ClientOptions) -> Value {
    let mut text_document = json!({
        "synchronization": {
            "didOpen": true,
            "didChange": true,
            "didClose": true
        },
        "documentSymbol": {
            "hierarchicalDocumentSymbolSupport": true
        },
        "hover": {},
        "definition": { "linkSupport": false }
    });
    if let Some(obj) = text_document.as_object_mut() {
        if !options.disable_completion {
            obj.insert(
                "completion".to_string(),
                json!({ "completionItem": { "snippetSupport": true } }),
            );
        }
        if !options.disable_diagnostics {
            obj.insert(
                "publishDiagnostics".to_string(),
                json!({ "relatedInformation": true }),
            );
        }
    }

    json!({
        "textDocument": text_document,
        "workspace": {
            "applyEdit": true,
            "configuration": true,
            "workspaceEdit": { "documentChanges": true },
            "workspaceFolders": !options.disable_workspace_folders,
            "symbol": { "dynamicRegistration": false },
            "executeCommand": { "dynamicRegistration": false }
        },
        "window": { "workDoneProgress": true }
    })
}

fn folder_name(uri: &str) -> String {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("workspace")
        .to_string()
}

fn spawn_writer<W>(mut writer: W, mut message_rx: mpsc::Receiver<OutgoingMessage>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            if let Err(e) = write_message(&mut writer, &message.to_json()).await {
                error!(
                    error_category = "lsp_communication",
                    error = %e,
                    "Failed to write to language server"
                );
                break;
            }
            match &message {
                OutgoingMessage::Request { id, method, .. } => {
                    debug!(lsp_method = %method, lsp_request_id = id, "Sent LSP request")
                }
                OutgoingMessage::Notification { method, .. } => {
                    debug!(lsp_method = %method, "Sent LSP notification")
                }
                OutgoingMessage::Response { id, .. }
                | OutgoingMessage::ErrorResponse { id, .. } => {
                    debug!(id = ?id, "Sent response to server request")
                }
            }
        }
    });
}

fn spawn_stderr_forwarder<R>(command: String, stderr: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let lower = trimmed.to_lowercase();
            if lower.contains("error") || lower.contains("panic") || lower.contains("fatal") {
                warn!(server = %command, stderr = %trimmed, "Language server stderr");
            } else {
                debug!(server = %command, stderr = %trimmed, "Language server stderr");
            }
        }
    });
}

fn spawn_reader<R>(
    command: String,
    mut reader: BufReader<R>,
    pending_requests: PendingRequests,
    message_tx: mpsc::Sender<OutgoingMessage>,
    context: ServerRequestContext,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match read_frame(&mut reader).await {
                Ok(Some(body)) => match serde_json::from_slice::<Value>(&body) {
                    Ok(message) => {
                        handle_message(message, &pending_requests, &message_tx, &context).await
                    }
                    Err(e) => {
                        warn!(
                            error_category = "lsp_communication",
                            server = %command,
                            error = %e,
                            "Skipping malformed message from language server"
                        );
                    }
                },
                Ok(None) => {
                    debug!(server = %command, "Language server stdout closed");
                    break;
                }
                Err(e) => {
                    error!(
                        error_category = "lsp_communication",
                        server = %command,
                        error = %e,
                        "Failed to read from language server"
                    );
                    break;
                }
            }
        }

        let mut pending = pending_requests.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(GorigError::lsp("language server connection closed")));
        }
    });
}

async fn handle_message(
    message: Value,
    pending_requests: &PendingRequests,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    context: &ServerRequestContext,
) {
    if let Some(method) = message.get("method").and_then(|m| m.as_str()) {
        if message.get("id").is_some() {
            handle_server_request(&message, message_tx, context).await;
        } else {
            handle_notification(method, message.get("params"));
        }
        return;
    }

    let Some(id) = message.get("id").and_then(|id| id.as_i64()) else {
        warn!(message = ?message, "Received unhandled message from language server");
        return;
    };

    let Some(sender) = pending_requests.lock().await.remove(&id) else {
        warn!(id, "Received response for unknown request ID");
        return;
    };

    let result = if let Some(error) = message.get("error") {
        let error_msg = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Err(GorigError::lsp(error_msg))
    } else {
        Ok(message.get("result").cloned().unwrap_or(Value::Null))
    };
    let _ = sender.send(result);
}

fn handle_notification(method: &str, params: Option<&Value>) {
    let text = params
        .and_then(|p| p.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or_default();
    match method {
        "window/showMessage" => info!(message = %text, "gopls"),
        "window/logMessage" => debug!(message = %text, "gopls log"),
        _ => debug!(method = %method, "Received notification from language server"),
    }
}

async fn handle_server_request(
    request: &Value,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    context: &ServerRequestContext,
) {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(|m| m.as_str());
    debug!(method = ?method, "Handling server request");

    let response = match method {
        Some("workspace/configuration") => {
            let items_len = request
                .get("params")
                .and_then(|p| p.get("items"))
                .and_then(|i| i.as_array())
                .map(|a| a.len())
                .unwrap_or(0);
            let settings = context.settings.clone().unwrap_or(Value::Null);
            OutgoingMessage::Response {
                id,
                result: json!(vec![settings; items_len]),
            }
        }
        Some("client/registerCapability")
        | Some("client/unregisterCapability")
        | Some("window/workDoneProgress/create") => OutgoingMessage::Response {
            id,
            result: Value::Null,
        },
        Some("workspace/workspaceFolders") => {
            let folders = match (&context.root_uri, context.workspace_folders) {
                (Some(uri), true) => json!([{ "uri": uri, "name": folder_name(uri) }]),
                _ => Value::Null,
            };
            OutgoingMessage::Response {
                id,
                result: folders,
            }
        }
        Some("workspace/applyEdit") => {
            let outcome = match request.get("params").cloned() {
                Some(params) => match serde_json::from_value(params) {
                    Ok(params) => workspace_edit::apply(params).await,
                    Err(e) => Err(format!("Invalid applyEdit params: {}", e)),
                },
                None => Err("Missing params in workspace/applyEdit".to_string()),
            };
            let result = match outcome {
                Ok(()) => json!({ "applied": true }),
                Err(e) => {
                    error!(error = %e, "Failed to apply workspace edit");
                    json!({ "applied": false, "failureReason": e })
                }
            };
            OutgoingMessage::Response { id, result }
        }
        _ => {
            warn!(method = ?method, "Received unsupported server request");
            OutgoingMessage::ErrorResponse {
                id,
                error: json!({
                    "code": -32601,
                    "message": "Method not found"
                }),
            }
        }
    };

    if let Err(e) = message_tx.send(response).await {
        error!(error = %e, "Failed to send response for server request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{read_message, write_message};
    use pretty_assertions::assert_eq;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

    /// Client wired to an in-memory peer playing the server
    fn connected(options: &ClientOptions) -> (LspClient, BufReader<DuplexStream>, DuplexStream) {
        let (client_read, server_write) = duplex(64 * 1024);
        let (server_read, client_write) = duplex(64 * 1024);
        let client = LspClient::connect(
            client_read,
            client_write,
            "fake-gopls".to_string(),
            Some("file:///work/project/".to_string()),
            options,
        );
        (client, BufReader::new(server_read), server_write)
    }

    #[tokio::test]
    async fn request_resolves_with_matching_response() {
        let (client, mut server_in, mut server_out) = connected(&ClientOptions::default());

        let server = tokio::spawn(async move {
            let request = read_message(&mut server_in).await.unwrap().unwrap();
            assert_eq!(request["method"], "workspace/symbol");
            let reply = json!({"jsonrpc": "2.0", "id": request["id"], "result": [1, 2]});
            write_message(&mut server_out, &reply).await.unwrap();
            (server_in, server_out)
        });

        let result = client
            .send_request("workspace/symbol", json!({"query": "^pkg.Test"}))
            .await
            .unwrap();
        assert_eq!(result, json!([1, 2]));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_message_does_not_drop_pending_requests() {
        let (client, mut server_in, mut server_out) = connected(&ClientOptions::default());

        let server = tokio::spawn(async move {
            let request = read_message(&mut server_in).await.unwrap().unwrap();
            server_out
                .write_all(b"Content-Length: 9\r\n\r\nnot json!")
                .await
                .unwrap();
            let reply = json!({"jsonrpc": "2.0", "id": request["id"], "result": "ok"});
            write_message(&mut server_out, &reply).await.unwrap();
            (server_in, server_out)
        });

        let result = client
            .send_request("workspace/symbol", json!({}))
            .await
            .unwrap();
        assert_eq!(result, json!("ok"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn error_response_names_the_method() {
        let (client, mut server_in, mut server_out) = connected(&ClientOptions::default());

        tokio::spawn(async move {
            let request = read_message(&mut server_in).await.unwrap().unwrap();
            let reply = json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": {"code": -32603, "message": "no views"}
            });
            write_message(&mut server_out, &reply).await.unwrap();
            (server_in, server_out)
        });

        let err = client
            .send_request("workspace/executeCommand", json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GorigError::lsp_method("workspace/executeCommand", "no views")
        );
    }

    #[tokio::test]
    async fn pending_requests_fail_when_server_goes_away() {
        let (client, mut server_in, server_out) = connected(&ClientOptions::default());

        tokio::spawn(async move {
            let _ = read_message(&mut server_in).await;
            drop(server_out);
            server_in
        });

        let err = client
            .send_request("workspace/symbol", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GorigError::Lsp { .. }));
    }

    #[tokio::test]
    async fn configuration_requests_get_gopls_options_per_item() {
        let options = ClientOptions {
            initialization_options: Some(json!({"staticcheck": true})),
            ..ClientOptions::default()
        };
        let (_client, mut server_in, mut server_out) = connected(&options);

        let request = json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "workspace/configuration",
            "params": {"items": [{"section": "gopls"}, {"section": "gopls"}]}
        });
        write_message(&mut server_out, &request).await.unwrap();

        let response = read_message(&mut server_in).await.unwrap().unwrap();
        assert_eq!(response["id"], 7);
        assert_eq!(
            response["result"],
            json!([{"staticcheck": true}, {"staticcheck": true}])
        );
    }

    #[tokio::test]
    async fn workspace_folders_request_returns_root() {
        let (_client, mut server_in, mut server_out) = connected(&ClientOptions::default());

        let request = json!({"jsonrpc": "2.0", "id": "a", "method": "workspace/workspaceFolders"});
        write_message(&mut server_out, &request).await.unwrap();

        let response = read_message(&mut server_in).await.unwrap().unwrap();
        assert_eq!(
            response["result"],
            json!([{"uri": "file:///work/project/", "name": "project"}])
        );
    }

    #[tokio::test]
    async fn unknown_server_requests_get_method_not_found() {
        let (_client, mut server_in, mut server_out) = connected(&ClientOptions::default());

        let request = json!({"jsonrpc": "2.0", "id": 3, "method": "window/showDocument", "params": {}});
        write_message(&mut server_out, &request).await.unwrap();

        let response = read_message(&mut server_in).await.unwrap().unwrap();
        assert_eq!(response["error"]["code"], -32601);
    }

    #[test]
    fn capabilities_follow_disable_flags() {
        let options = ClientOptions {
            disable_completion: true,
            disable_diagnostics: true,
            disable_workspace_folders: true,
            ..ClientOptions::default()
        };
        let caps = client_capabilities(&options);
        assert!(caps["textDocument"].get("completion").is_none());
        assert!(caps["textDocument"].get("publishDiagnostics").is_none());
        assert_eq!(caps["workspace"]["workspaceFolders"], false);

        let caps = client_capabilities(&ClientOptions::default());
        assert!(caps["textDocument"].get("completion").is_some());
        assert_eq!(caps["workspace"]["workspaceFolders"], true);
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let plan = LaunchPlan {
            command: std::path::PathBuf::from("/nonexistent/gopls"),
            args: vec![],
            working_directory: std::env::temp_dir(),
            environment: Default::default(),
        };
        let err = match LspClient::start(&plan, &ClientOptions::default()).await {
            Ok(_) => panic!("spawning a missing binary must fail"),
            Err(e) => e,
        };
        assert!(matches!(err, GorigError::Spawn { ref command, .. } if command == "/nonexistent/gopls"));
    }
}
