//! Go test discovery and invocation
//!
//! Finds the tests and benchmarks around the active document through the
//! gopls symbol index, presents them as action-bound lists and turns a
//! selection into a gopls test run, a `go test` command line or a
//! debugger launch.

pub mod commands;
pub mod discovery;
pub mod dispatch;
pub mod invocation;
pub mod lists;
pub mod package;
pub mod symbols;

pub use commands::GoCommands;
pub use discovery::TestDiscoveryEngine;
pub use dispatch::Dispatcher;
pub use lists::{
    Effect, GoKnownPackagesList, GoTestsList, ItemList, PackageAction, TestAction,
};
pub use package::{GoListQuery, PackageResolver};
pub use symbols::{
    Discovered, DocumentSymbolStrategy, QueryScope, SymbolQueryStrategy, WorkspaceSymbolStrategy,
};
