//! Error types for flkr-restore
//!
//! Everything here ends the run: the driver logs the error, reports the
//! successful-operation count and exits with status 1. The engine absorbs an
//! upload's `RetriesExhausted` or `MalformedResponse` as an item skip; every
//! other error reaches the driver.

use crate::remote::RemoteError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal migration error
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A remote operation kept failing after every allowed attempt
    #[error("Failed: {action} after {attempts} attempts (successful operations: {succeeded}): {last}")]
    RetriesExhausted {
        action: String,
        attempts: u32,
        succeeded: u64,
        last: RemoteError,
    },

    /// The remote accepted the request but its reply was unusable
    #[error("Malformed response for {action}: {detail}")]
    MalformedResponse { action: String, detail: String },

    /// The destination refused the credentials; no further call can succeed
    #[error("Authorization failed during {action}: {detail}")]
    Unauthorized { action: String, detail: String },

    /// Progress could not be persisted
    #[error("Ledger write to {path} failed: {source}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// flkr-common error
    #[error("Common error: {0}")]
    Common(#[from] flkr_common::Error),
}

impl MigrationError {
    /// Whether the last remote failure was a rate limit (quota exhausted)
    pub fn is_quota_related(&self) -> bool {
        matches!(
            self,
            MigrationError::RetriesExhausted { last, .. } if last.is_rate_limited()
        )
    }
}

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;
