//! Data model shared by the session supervisor and the test workflow

use lsp_types::SymbolKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Label of the synthetic item that aggregates every discovered test
pub const ALL_TESTS_LABEL: &str = "all";

/// Severity of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// A tool binary the system depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    /// Binary name, also the file name inside the tools directory
    pub logical_name: String,
    /// Explicit path from configuration; disables auto-install when set
    pub configured_path: Option<String>,
    /// Module path handed to `go install`
    pub install_hint: String,
}

impl ToolSpec {
    /// Spec for the gopls language server
    pub fn gopls(configured_path: Option<String>) -> Self {
        Self {
            logical_name: "gopls".to_string(),
            configured_path,
            install_hint: "golang.org/x/tools/gopls@latest".to_string(),
        }
    }
}

/// Everything needed to spawn one server process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub working_directory: PathBuf,
    /// Complete environment of the child; nothing else is inherited
    pub environment: BTreeMap<String, String>,
}

/// Options of the language client side of a session
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub document_selector: Vec<String>,
    pub initialization_options: Option<Value>,
    pub disable_workspace_folders: bool,
    pub disable_diagnostics: bool,
    pub disable_completion: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            document_selector: vec!["go".to_string(), "gomod".to_string()],
            initialization_options: None,
            disable_workspace_folders: false,
            disable_diagnostics: false,
            disable_completion: false,
        }
    }
}

/// A document open in the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub uri: String,
    pub path: PathBuf,
}

impl Document {
    /// Build a document from an absolute file path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let uri = url::Url::from_file_path(path).ok()?;
        Some(Self {
            uri: uri.to_string(),
            path: path.to_path_buf(),
        })
    }

    /// Directory holding the document
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn is_test_file(&self) -> bool {
        self.uri.ends_with("_test.go")
    }
}

/// Name of the package a document belongs to; empty means unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIdentifier(String);

impl PackageIdentifier {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One symbol returned by a symbol query
///
/// Workspace queries return package qualified names (`pkg.TestFoo`) with a
/// container; document queries return bare names and no container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRef {
    pub name: String,
    pub kind: SymbolKind,
    pub container: Option<String>,
}

impl SymbolRef {
    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::FUNCTION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestKind {
    Test,
    Benchmark,
}

impl TestKind {
    /// Classify a function name by its `Test`/`Benchmark` prefix
    pub fn from_name(name: &str) -> Option<Self> {
        if name.starts_with("Test") {
            Some(Self::Test)
        } else if name.starts_with("Benchmark") {
            Some(Self::Benchmark)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestEntry {
    pub name: String,
    pub kind: TestKind,
}

impl TestEntry {
    /// Returns `None` for names that are neither tests nor benchmarks
    pub fn from_name(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let kind = TestKind::from_name(&name)?;
        Some(Self { name, kind })
    }
}

/// Tests discovered around one document
///
/// Immutable once built: a new discovery produces a new set. The document
/// URI is captured at discovery time so a resumed list still targets the
/// file it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSet {
    document_uri: Option<String>,
    container: Option<String>,
    entries: Vec<TestEntry>,
}

impl TestSet {
    /// Build a set, dropping repeated names while keeping first-seen order
    pub fn new(
        document_uri: Option<String>,
        container: Option<String>,
        entries: impl IntoIterator<Item = TestEntry>,
    ) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.name.clone()))
            .collect();
        Self {
            document_uri,
            container,
            entries,
        }
    }

    /// Set with nothing discovered
    pub fn empty(document_uri: Option<String>) -> Self {
        Self::new(document_uri, None, Vec::new())
    }

    pub fn document_uri(&self) -> Option<&str> {
        self.document_uri.as_deref()
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn entries(&self) -> &[TestEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Presentation items: one per entry, plus `all` when there are several
    pub fn items(&self) -> Vec<TestItem> {
        let mut items: Vec<TestItem> = self
            .entries
            .iter()
            .map(|entry| self.item(entry.name.clone(), vec![entry.name.clone()]))
            .collect();
        if self.entries.len() > 1 {
            items.push(self.item(ALL_TESTS_LABEL.to_string(), self.names()));
        }
        items
    }

    fn item(&self, label: String, tests: Vec<String>) -> TestItem {
        TestItem {
            label,
            document_uri: self.document_uri.clone(),
            container: self.container.clone(),
            tests,
        }
    }
}

/// One selectable row of the tests list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestItem {
    pub label: String,
    pub document_uri: Option<String>,
    pub container: Option<String>,
    pub tests: Vec<String>,
}

/// Payload of the gopls `run_tests` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRun {
    #[serde(rename = "URI")]
    pub uri: String,
    #[serde(rename = "Tests")]
    pub tests: Vec<String>,
    #[serde(rename = "Benchmarks")]
    pub benchmarks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCommand {
    pub text: String,
}

/// Debugger launch for `go test` binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLaunch {
    /// Display name of the session
    pub name: String,
    /// Package the test binary is built from
    pub program: String,
    /// Anchored alternation of the selected names
    pub test_pattern: String,
}

impl DebugLaunch {
    /// Launch configuration in the shape debug adapters for Go expect
    pub fn launch_configuration(&self) -> Value {
        json!({
            "type": "go",
            "name": self.name,
            "request": "launch",
            "mode": "test",
            "program": self.program,
            "args": ["-test.run", self.test_pattern],
        })
    }
}

/// An executable form of a test selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationRequest {
    StructuredRun(StructuredRun),
    ShellCommand(ShellCommand),
    DebugLaunch(DebugLaunch),
}
