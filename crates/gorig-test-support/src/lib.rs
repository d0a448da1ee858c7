//! Shared test doubles for the gorig collaborator traits

pub mod fakes;
pub mod mocks;

pub use fakes::*;
pub use mocks::*;
