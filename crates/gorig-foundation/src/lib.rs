//! Foundation Layer - errors, data model and collaborator traits
//!
//! This crate provides the building blocks shared by every gorig crate:
//! - The error taxonomy surfaced to users ([`error`])
//! - Tool specs, launch plans, documents, symbols and test sets ([`model`])
//! - The traits through which the core reaches the editor, the server
//!   process and external tools ([`protocol`])

pub mod error;
pub mod model;
pub mod protocol;

// Re-export commonly used types for convenience
pub use error::{GorigError, GorigResult};
pub use model::*;
