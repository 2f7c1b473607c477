//! Destination library access
//!
//! The engine talks to the destination only through [`RemoteClient`].
//! [`GooglePhotosClient`] implements it over the Photos Library REST API.

pub mod auth;
pub mod google_photos;

pub use auth::TokenProvider;
pub use google_photos::GooglePhotosClient;

use crate::models::RemoteAlbum;
use async_trait::async_trait;
use thiserror::Error;

/// Remote operation failures
///
/// Every remote result is distinguishable as success, rate-limited,
/// other failure, or a success whose body could not be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// HTTP 429: request quota exhausted for now
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status
    #[error("API error {0}: {1}")]
    Status(u16, String),

    /// Request never produced a response (connect, timeout, body read)
    #[error("Network error: {0}")]
    Transport(String),

    /// Success status, but the response lacked what the caller needs
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Access token could not be obtained
    #[error("Authorization failed: {0}")]
    Auth(String),
}

impl RemoteError {
    /// Whether another attempt may succeed
    ///
    /// A malformed success already had its side effect, and refused
    /// credentials stay refused.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemoteError::Malformed(_) | RemoteError::Auth(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteError::RateLimited(_))
    }
}

/// Result of one remote call
pub type RemoteResult<T> = Result<T, RemoteError>;

/// One page of the destination's album listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumPage {
    pub albums: Vec<RemoteAlbum>,
    pub next_page_token: Option<String>,
}

/// Operations the migration needs from the destination library
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// List albums this application created, one page at a time
    async fn list_albums(&self, page_token: Option<&str>) -> RemoteResult<AlbumPage>;

    /// Create an album; the result carries its remote id
    async fn create_album(&self, title: &str) -> RemoteResult<RemoteAlbum>;

    /// Add a text enrichment at the top of an album
    async fn enrich_album(&self, remote_id: &str, text: &str) -> RemoteResult<()>;

    /// Upload raw bytes, returning the upload token
    async fn upload_bytes(&self, bytes: Vec<u8>, file_name: &str) -> RemoteResult<String>;

    /// Add an uploaded item to an album, optionally as its first item
    async fn attach_to_album(
        &self,
        remote_album_id: &str,
        upload_token: &str,
        make_first: bool,
    ) -> RemoteResult<()>;

    /// Create the library item for an upload with a description
    async fn attach_description(&self, upload_token: &str, text: &str) -> RemoteResult<()>;
}
