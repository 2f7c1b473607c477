//! flkr-restore library interface
//!
//! Resumable migration of a Flickr data export into a Google Photos library.
//! Exposes the engine and its collaborators for the binary and for
//! integration testing.

pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::error::{MigrationError, MigrationResult};
pub use crate::workflow::{MigrationEngine, MigrationSummary};
