//! Package of the active document

use async_trait::async_trait;
use gorig_foundation::protocol::{Editor, PackageQuery};
use gorig_foundation::{Document, GorigError, GorigResult, PackageIdentifier};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// `go list -f {{.Name}}` run inside the directory
#[derive(Debug, Default)]
pub struct GoListQuery;

#[async_trait]
impl PackageQuery for GoListQuery {
    async fn package_name(&self, dir: &Path) -> GorigResult<String> {
        let output = Command::new("go")
            .args(["list", "-f", "{{.Name}}"])
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| GorigError::external("go list", e.to_string()))?;

        if !output.status.success() {
            return Err(GorigError::external(
                "go list",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Derives the [`PackageIdentifier`] of a document
pub struct PackageResolver {
    editor: Arc<dyn Editor>,
    query: Arc<dyn PackageQuery>,
}

impl PackageResolver {
    pub fn new(editor: Arc<dyn Editor>, query: Arc<dyn PackageQuery>) -> Self {
        Self { editor, query }
    }

    /// Package of the active document, unknown when nothing is open
    pub async fn resolve_current(&self) -> PackageIdentifier {
        let document = self.editor.active_document().await;
        self.resolve(document.as_ref()).await
    }

    /// Package of `document`
    ///
    /// Runs the external query once. A failing query yields the unknown
    /// package; callers treat that like a package without tests.
    pub async fn resolve(&self, document: Option<&Document>) -> PackageIdentifier {
        let Some(document) = document else {
            return PackageIdentifier::unknown();
        };

        match self.query.package_name(document.directory()).await {
            Ok(name) => {
                let package = PackageIdentifier::new(name);
                debug!(document = %document.uri, package = %package, "Resolved package");
                package
            }
            Err(e) => {
                warn!(document = %document.uri, error = %e, "Package lookup failed");
                PackageIdentifier::unknown()
            }
        }
    }
}
