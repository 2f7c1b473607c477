//! Configuration file loading
//!
//! The run configuration is a JSON document (the format the Flickr export
//! tooling has always used); a `.toml` file with the same keys is accepted too.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of attempts per remote operation (first try + 4 retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff between attempts, per the Photos API retry guidance
pub const DEFAULT_BACKOFF_SECS: u64 = 31;

/// Retry settings for remote operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed sleep between attempts
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_secs: DEFAULT_BACKOFF_SECS,
        }
    }
}

/// Run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreConfig {
    /// Directory holding the exported photo files
    pub flickr_photo_dir: PathBuf,
    /// Directory holding `photo_<id>.json` metadata records
    pub flickr_photo_json_dir: PathBuf,
    /// Albums manifest (`albums.json`)
    pub flickr_albums_json: PathBuf,
    /// OAuth client secrets downloaded from the API console
    pub client_secrets_file: PathBuf,
    /// Cached refresh token
    pub auth_token_file: PathBuf,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Override for the Photos Library API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

impl RestoreConfig {
    /// Load configuration from a JSON or TOML file (chosen by extension)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let config: RestoreConfig = if is_toml {
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?
        };

        config.validate()?;
        tracing::debug!(
            "Loaded configuration from {} (retry: {} attempts, {}s backoff)",
            path.display(),
            config.retry.max_attempts,
            config.retry.backoff_secs
        );
        Ok(config)
    }

    /// Check that the export inputs exist and retry settings are usable
    ///
    /// Auth files are not checked here: the client secrets file is optional
    /// when the token cache already carries client credentials.
    pub fn validate(&self) -> Result<()> {
        if !self.flickr_photo_dir.is_dir() {
            return Err(Error::Config(format!(
                "flickr_photo_dir is not a directory: {}",
                self.flickr_photo_dir.display()
            )));
        }
        if !self.flickr_photo_json_dir.is_dir() {
            return Err(Error::Config(format!(
                "flickr_photo_json_dir is not a directory: {}",
                self.flickr_photo_json_dir.display()
            )));
        }
        if !self.flickr_albums_json.is_file() {
            return Err(Error::Config(format!(
                "flickr_albums_json not found: {}",
                self.flickr_albums_json.display()
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}
