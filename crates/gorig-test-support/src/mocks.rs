//! Mock implementations for interaction assertions

use async_trait::async_trait;
use gorig_foundation::protocol::{
    CommandExecutor, PackageQuery, PackageSink, SymbolSource, ToolInstaller,
};
use gorig_foundation::{Document, GorigResult, SymbolRef, ToolSpec};
use mockall::mock;
use serde_json::Value;
use std::path::{Path, PathBuf};

mock! {
    pub ToolInstaller {}

    #[async_trait]
    impl ToolInstaller for ToolInstaller {
        async fn install(&self, spec: &ToolSpec, bin_dir: &Path) -> GorigResult<PathBuf>;
    }
}

mock! {
    pub CommandExecutor {}

    #[async_trait]
    impl CommandExecutor for CommandExecutor {
        async fn execute_command(&self, command: &str, arguments: Vec<Value>) -> GorigResult<Value>;
    }
}

mock! {
    pub PackageQuery {}

    #[async_trait]
    impl PackageQuery for PackageQuery {
        async fn package_name(&self, dir: &Path) -> GorigResult<String>;
    }
}

mock! {
    pub PackageSink {
        pub fn current_package_changed<'a>(&self, document: Option<&'a Document>, package: &str);
    }
}

#[async_trait]
impl PackageSink for MockPackageSink {
    async fn current_package_changed(&self, document: Option<&Document>, package: &str) {
        MockPackageSink::current_package_changed(self, document, package)
    }
}

mock! {
    pub SymbolSource {}

    #[async_trait]
    impl SymbolSource for SymbolSource {
        async fn workspace_symbols(&self, query: &str) -> GorigResult<Vec<SymbolRef>>;
        async fn document_symbols(&self, document_uri: &str) -> GorigResult<Vec<SymbolRef>>;
    }
}
