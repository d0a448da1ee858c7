//! gopls-specific surface: execute-command verbs and symbol queries

use crate::session::SessionSupervisor;
use async_trait::async_trait;
use gorig_foundation::protocol::{CommandExecutor, SymbolSource};
use gorig_foundation::{GorigError, GorigResult, StructuredRun, SymbolRef};
use lsp_types::{DocumentSymbol, DocumentSymbolResponse, WorkspaceSymbolResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const TIDY: &str = "gopls.tidy";
pub const RUN_TESTS: &str = "gopls.run_tests";
pub const LIST_KNOWN_PACKAGES: &str = "gopls.list_known_packages";
pub const ADD_IMPORT: &str = "gopls.add_import";

#[derive(Debug, Serialize)]
struct UrisArgs<'a> {
    #[serde(rename = "URIs")]
    uris: &'a [String],
}

#[derive(Debug, Serialize)]
struct UriArg<'a> {
    #[serde(rename = "URI")]
    uri: &'a str,
}

#[derive(Debug, Serialize)]
struct AddImportArgs<'a> {
    #[serde(rename = "URI")]
    uri: &'a str,
    #[serde(rename = "ImportPath")]
    import_path: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct KnownPackages {
    #[serde(rename = "Packages", default)]
    packages: Option<Vec<String>>,
}

/// Run `go mod tidy` for the modules of `uris`
pub async fn tidy(executor: &dyn CommandExecutor, uris: &[String]) -> GorigResult<()> {
    let args = serde_json::to_value(UrisArgs { uris })?;
    executor.execute_command(TIDY, vec![args]).await?;
    Ok(())
}

/// Run tests and benchmarks through gopls
pub async fn run_tests(executor: &dyn CommandExecutor, run: &StructuredRun) -> GorigResult<()> {
    executor
        .execute_command(RUN_TESTS, vec![serde_json::to_value(run)?])
        .await?;
    Ok(())
}

/// Packages importable from the document at `uri`
///
/// A missing or null package list is an empty list.
pub async fn list_known_packages(
    executor: &dyn CommandExecutor,
    uri: &str,
) -> GorigResult<Vec<String>> {
    let result = executor
        .execute_command(LIST_KNOWN_PACKAGES, vec![serde_json::to_value(UriArg { uri })?])
        .await?;
    if result.is_null() {
        return Ok(Vec::new());
    }
    let known: KnownPackages = serde_json::from_value(result)?;
    Ok(known.packages.unwrap_or_default())
}

/// Add `import_path` to the imports of the document at `uri`
pub async fn add_import(
    executor: &dyn CommandExecutor,
    uri: &str,
    import_path: &str,
) -> GorigResult<()> {
    let args = serde_json::to_value(AddImportArgs { uri, import_path })?;
    executor.execute_command(ADD_IMPORT, vec![args]).await?;
    Ok(())
}

/// Symbols of a `workspace/symbol` response
pub fn workspace_symbols_from(result: Value) -> GorigResult<Vec<SymbolRef>> {
    let response: Option<WorkspaceSymbolResponse> = serde_json::from_value(result)?;
    Ok(match response {
        None => Vec::new(),
        Some(WorkspaceSymbolResponse::Flat(symbols)) => symbols
            .into_iter()
            .map(|s| SymbolRef {
                name: s.name,
                kind: s.kind,
                container: s.container_name,
            })
            .collect(),
        Some(WorkspaceSymbolResponse::Nested(symbols)) => symbols
            .into_iter()
            .map(|s| SymbolRef {
                name: s.name,
                kind: s.kind,
                container: s.container_name,
            })
            .collect(),
    })
}

/// Symbols of a `textDocument/documentSymbol` response, hierarchy flattened
pub fn document_symbols_from(result: Value) -> GorigResult<Vec<SymbolRef>> {
    let response: Option<DocumentSymbolResponse> = serde_json::from_value(result)?;
    Ok(match response {
        None => Vec::new(),
        Some(DocumentSymbolResponse::Flat(symbols)) => symbols
            .into_iter()
            .map(|s| SymbolRef {
                name: s.name,
                kind: s.kind,
                container: s.container_name,
            })
            .collect(),
        Some(DocumentSymbolResponse::Nested(symbols)) => {
            let mut flat = Vec::new();
            flatten(symbols, &mut flat);
            flat
        }
    })
}

fn flatten(symbols: Vec<DocumentSymbol>, out: &mut Vec<SymbolRef>) {
    for symbol in symbols {
        out.push(SymbolRef {
            name: symbol.name,
            kind: symbol.kind,
            container: None,
        });
        if let Some(children) = symbol.children {
            flatten(children, out);
        }
    }
}

/// Starts the session on demand before sending
#[async_trait]
impl CommandExecutor for SessionSupervisor {
    async fn execute_command(&self, command: &str, arguments: Vec<Value>) -> GorigResult<Value> {
        self.ensure_started().await?;
        debug!(command = %command, "Executing gopls command");
        self.send_request(
            "workspace/executeCommand",
            json!({ "command": command, "arguments": arguments }),
        )
        .await
    }
}

#[async_trait]
impl SymbolSource for SessionSupervisor {
    async fn workspace_symbols(&self, query: &str) -> GorigResult<Vec<SymbolRef>> {
        self.ensure_started().await?;
        let result = self
            .send_request("workspace/symbol", json!({ "query": query }))
            .await?;
        workspace_symbols_from(result)
    }

    async fn document_symbols(&self, document_uri: &str) -> GorigResult<Vec<SymbolRef>> {
        self.ensure_started().await?;
        let result = self
            .send_request(
                "textDocument/documentSymbol",
                json!({ "textDocument": { "uri": document_uri } }),
            )
            .await?;
        document_symbols_from(result).map_err(|e| match e {
            GorigError::Json { message } => {
                GorigError::lsp_method("textDocument/documentSymbol", message)
            }
            other => other,
        })
    }
}
