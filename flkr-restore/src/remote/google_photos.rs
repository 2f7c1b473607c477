//! Google Photos Library API client
//!
//! Covers the five endpoints a migration needs: album listing, album
//! creation, album enrichment, raw byte upload and media item creation.
//! Rate limiting is left to the caller's retry policy; this client only
//! reports 429 responses distinctly.

use super::auth::TokenProvider;
use super::{AlbumPage, RemoteClient, RemoteError, RemoteResult};
use crate::models::RemoteAlbum;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const PHOTOS_LIBRARY_BASE_URL: &str = "https://photoslibrary.googleapis.com/v1";
const USER_AGENT: &str = concat!("flickr-restore/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize)]
struct AlbumListResponse {
    #[serde(default)]
    albums: Vec<RemoteAlbum>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

/// Photos Library API client
pub struct GooglePhotosClient {
    http_client: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
}

impl GooglePhotosClient {
    pub fn new(tokens: TokenProvider) -> Result<Self, RemoteError> {
        Self::with_base_url(tokens, PHOTOS_LIBRARY_BASE_URL)
    }

    /// Client against a different API root (used by tests)
    pub fn with_base_url(tokens: TokenProvider, base_url: &str) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request with the bearer token; non-success becomes an error
    async fn send(&self, request: reqwest::RequestBuilder) -> RemoteResult<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited(body));
        }
        Err(RemoteError::Status(status.as_u16(), body))
    }

    async fn batch_create(&self, body: serde_json::Value) -> RemoteResult<()> {
        tracing::debug!("    req: {}", body);
        let response = self
            .send(self.http_client.post(self.url("mediaItems:batchCreate")).json(&body))
            .await?;
        let text = response.text().await.unwrap_or_default();
        tracing::debug!("    resp: {}", text);
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for GooglePhotosClient {
    async fn list_albums(&self, page_token: Option<&str>) -> RemoteResult<AlbumPage> {
        let mut query = vec![("excludeNonAppCreatedData", "true")];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .send(self.http_client.get(self.url("albums")).query(&query))
            .await?;
        let page: AlbumListResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(format!("album list: {}", e)))?;

        tracing::debug!(
            albums = page.albums.len(),
            more = page.next_page_token.is_some(),
            "Retrieved album list page"
        );

        Ok(AlbumPage {
            albums: page.albums,
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn create_album(&self, title: &str) -> RemoteResult<RemoteAlbum> {
        let body = json!({ "album": { "title": title } });
        let response = self
            .send(self.http_client.post(self.url("albums")).json(&body))
            .await?;

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(format!("create album: {}", e)))?;
        let album: RemoteAlbum = serde_json::from_value(value.clone())
            .map_err(|_| RemoteError::Malformed(format!("No id in google_album: {}", value)))?;

        if album.remote_id.is_empty() {
            return Err(RemoteError::Malformed(format!("Empty id in google_album: {}", value)));
        }
        Ok(album)
    }

    async fn enrich_album(&self, remote_id: &str, text: &str) -> RemoteResult<()> {
        let body = json!({
            "newEnrichmentItem": { "textEnrichment": { "text": text } },
            "albumPosition": { "position": "FIRST_IN_ALBUM" }
        });
        let response = self
            .send(
                self.http_client
                    .post(self.url(&format!("albums/{}:addEnrichment", remote_id)))
                    .json(&body),
            )
            .await?;
        let text = response.text().await.unwrap_or_default();
        tracing::debug!("Enrich album response: {}", text);
        Ok(())
    }

    async fn upload_bytes(&self, bytes: Vec<u8>, file_name: &str) -> RemoteResult<String> {
        let response = self
            .send(
                self.http_client
                    .post(self.url("uploads"))
                    .header("Content-Type", "application/octet-stream")
                    .header("X-Goog-Upload-File-Name", file_name)
                    .header("X-Goog-Upload-Protocol", "raw")
                    .body(bytes),
            )
            .await?;

        let token = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(RemoteError::Malformed("empty upload token".to_string()));
        }
        Ok(token)
    }

    async fn attach_to_album(
        &self,
        remote_album_id: &str,
        upload_token: &str,
        make_first: bool,
    ) -> RemoteResult<()> {
        let mut body = json!({
            "albumId": remote_album_id,
            "newMediaItems": [
                { "simpleMediaItem": { "uploadToken": upload_token } }
            ]
        });
        if make_first {
            body["albumPosition"] = json!({ "position": "FIRST_IN_ALBUM" });
        }
        self.batch_create(body).await
    }

    async fn attach_description(&self, upload_token: &str, text: &str) -> RemoteResult<()> {
        let body = json!({
            "newMediaItems": [
                {
                    "description": text,
                    "simpleMediaItem": { "uploadToken": upload_token }
                }
            ]
        });
        self.batch_create(body).await
    }
}
