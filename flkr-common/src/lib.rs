//! # flickr-restore common library
//!
//! Shared code for the flickr-restore workspace:
//! - Error and result types
//! - Configuration file loading
//! - Logging setup (console + log file)

pub mod config;
pub mod error;
pub mod logging;

pub use config::{RestoreConfig, RetryConfig};
pub use error::{Error, Result};
