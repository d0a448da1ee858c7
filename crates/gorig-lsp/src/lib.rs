//! gopls session supervision
//!
//! Resolves (and installs) the gopls binary, plans its launch with daemon
//! reuse, speaks JSON-RPC to it over stdio and supervises the session
//! lifecycle for the rest of gorig.

pub mod binary;
pub mod client;
pub mod gopls;
pub mod launch;
pub mod session;
pub mod transport;
mod workspace_edit;

pub use binary::{BinaryResolver, GoInstaller};
pub use client::{LspClient, ProcessLauncher};
pub use session::{SessionStatus, SessionSupervisor};
