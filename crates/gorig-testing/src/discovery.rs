//! Test discovery around the active document

use crate::package::PackageResolver;
use crate::symbols::{
    DocumentSymbolStrategy, QueryScope, SymbolQueryStrategy, WorkspaceSymbolStrategy,
};
use gorig_foundation::protocol::{Editor, SymbolSource};
use gorig_foundation::{Document, GorigResult, TestSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Finds the tests and benchmarks of the active document's package
///
/// Holds no state between calls: every discovery queries live symbol data
/// and returns a fresh [`TestSet`].
pub struct TestDiscoveryEngine {
    editor: Arc<dyn Editor>,
    symbols: Arc<dyn SymbolSource>,
    packages: Arc<PackageResolver>,
    strategies: Vec<Box<dyn SymbolQueryStrategy>>,
}

impl TestDiscoveryEngine {
    /// Engine with the workspace strategy first and the document fallback second
    pub fn new(
        editor: Arc<dyn Editor>,
        symbols: Arc<dyn SymbolSource>,
        packages: Arc<PackageResolver>,
    ) -> Self {
        Self::with_strategies(
            editor,
            symbols,
            packages,
            vec![
                Box::new(WorkspaceSymbolStrategy),
                Box::new(DocumentSymbolStrategy),
            ],
        )
    }

    pub fn with_strategies(
        editor: Arc<dyn Editor>,
        symbols: Arc<dyn SymbolSource>,
        packages: Arc<PackageResolver>,
        strategies: Vec<Box<dyn SymbolQueryStrategy>>,
    ) -> Self {
        Self {
            editor,
            symbols,
            packages,
            strategies,
        }
    }

    /// Discover around the active document
    ///
    /// Without an active document this is an empty set with no document
    /// and no container, not an error.
    pub async fn discover(&self) -> GorigResult<TestSet> {
        match self.editor.active_document().await {
            Some(document) => self.discover_in(&document).await,
            None => {
                debug!("No active document, nothing to discover");
                Ok(TestSet::empty(None))
            }
        }
    }

    /// Discover around `document`
    ///
    /// Strategies run one after another; the first one that finds anything
    /// wins and the rest are never queried.
    pub async fn discover_in(&self, document: &Document) -> GorigResult<TestSet> {
        let package = self.packages.resolve(Some(document)).await;
        let scope = QueryScope {
            package: &package,
            document,
        };

        for strategy in &self.strategies {
            let Some(found) = strategy.query(self.symbols.as_ref(), scope).await? else {
                debug!(strategy = strategy.name(), "Strategy found no tests");
                continue;
            };

            let set = found
                .qualify(self.symbols.as_ref(), &package, &document.uri)
                .await?;
            info!(
                strategy = strategy.name(),
                document = %document.uri,
                tests = set.entries().len(),
                "Discovered tests"
            );
            return Ok(set);
        }

        Ok(TestSet::empty(Some(document.uri.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorig_test_support::{function, FakeSymbolSource, MockPackageQuery, RecordingEditor};

    fn engine(
        editor: RecordingEditor,
        source: Arc<FakeSymbolSource>,
        query: MockPackageQuery,
    ) -> TestDiscoveryEngine {
        let editor: Arc<dyn Editor> = Arc::new(editor);
        let packages = Arc::new(PackageResolver::new(editor.clone(), Arc::new(query)));
        TestDiscoveryEngine::new(editor, source, packages)
    }

    #[tokio::test]
    async fn no_document_yields_empty_set_without_queries() {
        let mut query = MockPackageQuery::new();
        query.expect_package_name().never();
        let source = Arc::new(FakeSymbolSource::new());

        let set = engine(RecordingEditor::new(), source.clone(), query)
            .discover()
            .await
            .unwrap();

        assert!(set.is_empty());
        assert_eq!(set.container(), None);
        assert_eq!(set.document_uri(), None);
        assert!(source.workspace_queries().is_empty());
        assert!(source.document_queries().is_empty());
    }

    #[tokio::test]
    async fn nothing_found_keeps_document_uri() {
        let mut query = MockPackageQuery::new();
        query
            .expect_package_name()
            .times(1)
            .returning(|_| Ok("parser".to_string()));
        let doc = Document::from_path("/work/parser/parse_test.go").unwrap();
        let source = Arc::new(FakeSymbolSource::new());

        let set = engine(
            RecordingEditor::new().with_active_document(doc.clone()),
            source.clone(),
            query,
        )
        .discover()
        .await
        .unwrap();

        assert!(set.is_empty());
        assert_eq!(set.document_uri(), Some(doc.uri.as_str()));
        assert_eq!(source.document_queries(), vec![doc.uri]);
    }

    #[tokio::test]
    async fn package_is_resolved_once_per_discovery() {
        let mut query = MockPackageQuery::new();
        query
            .expect_package_name()
            .times(1)
            .returning(|_| Ok("parser".to_string()));
        let doc = Document::from_path("/work/parser/parse_test.go").unwrap();
        let source = Arc::new(
            FakeSymbolSource::new()
                .with_document(&doc.uri, vec![function("TestParse", None)])
                .with_workspace(
                    "'parser.TestParse",
                    vec![function("parser.TestParse", Some("example.com/parser"))],
                ),
        );

        let set = engine(RecordingEditor::new(), source, query)
            .discover_in(&doc)
            .await
            .unwrap();

        assert_eq!(set.container(), Some("example.com/parser"));
    }
}
