//! Symbol query strategies for test discovery
//!
//! The workspace index answers with package qualified names and a
//! container, but only for packages gopls has indexed globally. The
//! document listing always works for the open file, but carries no
//! container. A strategy reports which of the two it found as a
//! [`Discovered`] value, and [`Discovered::qualify`] fills in the missing
//! container before a [`TestSet`] is built.

use async_trait::async_trait;
use gorig_foundation::protocol::SymbolSource;
use gorig_foundation::{
    Document, GorigError, GorigResult, PackageIdentifier, SymbolRef, TestEntry, TestSet,
};
use tracing::debug;

/// Name prefixes queried in the workspace index, in order
const WORKSPACE_PREFIXES: [&str; 2] = ["Test", "Benchmark"];

/// What a strategy is asked about
#[derive(Debug, Clone, Copy)]
pub struct QueryScope<'a> {
    pub package: &'a PackageIdentifier,
    pub document: &'a Document,
}

/// Tests found by a strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    /// Names came from the workspace index together with their container
    Qualified {
        entries: Vec<TestEntry>,
        container: Option<String>,
    },
    /// Names came from the document alone; the container is still missing
    Unqualified { entries: Vec<TestEntry> },
}

impl Discovered {
    pub fn entries(&self) -> &[TestEntry] {
        match self {
            Self::Qualified { entries, .. } | Self::Unqualified { entries } => entries,
        }
    }

    /// Turn the result into a [`TestSet`] for `document_uri`
    ///
    /// An unqualified result issues one more workspace query for the first
    /// test's qualified name. Anything but exactly one matching function
    /// fails with [`GorigError::ContainerResolutionAmbiguous`].
    pub async fn qualify(
        self,
        source: &dyn SymbolSource,
        package: &PackageIdentifier,
        document_uri: &str,
    ) -> GorigResult<TestSet> {
        let (entries, container) = match self {
            Self::Qualified { entries, container } => (entries, container),
            Self::Unqualified { entries } => {
                let container = match entries.first() {
                    Some(first) => Some(resolve_container(source, package, &first.name).await?),
                    None => None,
                };
                (entries, container)
            }
        };
        Ok(TestSet::new(
            Some(document_uri.to_string()),
            container,
            entries,
        ))
    }
}

async fn resolve_container(
    source: &dyn SymbolSource,
    package: &PackageIdentifier,
    name: &str,
) -> GorigResult<String> {
    let query = if package.is_unknown() {
        format!("'{name}")
    } else {
        format!("'{package}.{name}")
    };
    let suffix = format!(".{name}");

    let matches: Vec<SymbolRef> = source
        .workspace_symbols(&query)
        .await?
        .into_iter()
        .filter(|s| s.is_function() && (s.name == name || s.name.ends_with(&suffix)))
        .collect();

    match matches.as_slice() {
        [only] => only
            .container
            .clone()
            .ok_or(GorigError::ContainerUnresolved),
        _ => Err(GorigError::ContainerResolutionAmbiguous {
            query,
            matches: matches.len(),
        }),
    }
}

/// One way of asking the symbol index for tests
#[async_trait]
pub trait SymbolQueryStrategy: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this strategy found nothing
    async fn query(
        &self,
        source: &dyn SymbolSource,
        scope: QueryScope<'_>,
    ) -> GorigResult<Option<Discovered>>;
}

/// Prefix queries `^<pkg>.Test` and `^<pkg>.Benchmark` on the workspace index
#[derive(Debug, Default)]
pub struct WorkspaceSymbolStrategy;

#[async_trait]
impl SymbolQueryStrategy for WorkspaceSymbolStrategy {
    fn name(&self) -> &'static str {
        "workspace"
    }

    async fn query(
        &self,
        source: &dyn SymbolSource,
        scope: QueryScope<'_>,
    ) -> GorigResult<Option<Discovered>> {
        if scope.package.is_unknown() {
            return Ok(None);
        }

        let mut functions = Vec::new();
        for prefix in WORKSPACE_PREFIXES {
            let query = format!("^{}.{prefix}", scope.package);
            let symbols = source.workspace_symbols(&query).await?;
            debug!(query = %query, results = symbols.len(), "Workspace symbol query");
            functions.extend(symbols.into_iter().filter(SymbolRef::is_function));
        }

        let container = functions.first().and_then(|s| s.container.clone());
        let entries: Vec<TestEntry> = functions
            .into_iter()
            .filter_map(|s| {
                let (_, name) = s.name.split_once('.')?;
                TestEntry::from_name(name)
            })
            .collect();

        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(Discovered::Qualified { entries, container }))
    }
}

/// Test functions declared in the open document
#[derive(Debug, Default)]
pub struct DocumentSymbolStrategy;

#[async_trait]
impl SymbolQueryStrategy for DocumentSymbolStrategy {
    fn name(&self) -> &'static str {
        "document"
    }

    async fn query(
        &self,
        source: &dyn SymbolSource,
        scope: QueryScope<'_>,
    ) -> GorigResult<Option<Discovered>> {
        let entries: Vec<TestEntry> = source
            .document_symbols(&scope.document.uri)
            .await?
            .into_iter()
            .filter(SymbolRef::is_function)
            .filter_map(|s| TestEntry::from_name(s.name))
            .collect();

        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(Discovered::Unqualified { entries }))
    }
}
