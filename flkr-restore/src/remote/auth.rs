//! OAuth access tokens for the Photos Library API
//!
//! Uses the refresh token cached by a previous interactive authorization.
//! Access tokens are refreshed shortly before they expire, so long runs keep
//! working past the one-hour token lifetime.

use super::{RemoteError, RemoteResult};
use flkr_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Contents of the auth token cache file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecretSection>,
    web: Option<ClientSecretSection>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct AccessToken {
    token: String,
    refresh_at: Instant,
}

enum TokenSource {
    Fixed(String),
    Refresh {
        http_client: reqwest::Client,
        token_uri: String,
        refresh_token: String,
        client_id: String,
        client_secret: String,
    },
}

/// Supplies bearer tokens to the API client
pub struct TokenProvider {
    source: TokenSource,
    current: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    /// Provider that always returns the same token
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Fixed(token.into()),
            current: Mutex::new(None),
        }
    }

    /// Build a refreshing provider from the token cache and client secrets
    ///
    /// Client credentials missing from the token cache are taken from the
    /// client secrets file, and the completed credentials are written back.
    pub fn from_files(client_secrets_file: &Path, auth_token_file: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(auth_token_file).map_err(|e| {
            Error::Config(format!(
                "No cached authorization at {} ({}). Authorize the application once to create it.",
                auth_token_file.display(),
                e
            ))
        })?;
        let mut stored: StoredCredentials = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Parse {} failed: {}", auth_token_file.display(), e))
        })?;

        let secrets = match (&stored.client_id, &stored.client_secret) {
            (Some(_), Some(_)) => None,
            _ => Some(read_client_secrets(client_secrets_file)?),
        };

        let token_uri = secrets
            .as_ref()
            .and_then(|s| s.token_uri.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        if let Some(section) = secrets {
            stored.client_id = Some(section.client_id);
            stored.client_secret = Some(section.client_secret);
            save_credentials(&stored, auth_token_file)?;
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            source: TokenSource::Refresh {
                http_client,
                token_uri,
                refresh_token: stored.refresh_token,
                client_id: stored.client_id.unwrap_or_default(),
                client_secret: stored.client_secret.unwrap_or_default(),
            },
            current: Mutex::new(None),
        })
    }

    /// Current access token, refreshing it when close to expiry
    pub async fn access_token(&self) -> RemoteResult<String> {
        let (http_client, token_uri, refresh_token, client_id, client_secret) = match &self.source
        {
            TokenSource::Fixed(token) => return Ok(token.clone()),
            TokenSource::Refresh {
                http_client,
                token_uri,
                refresh_token,
                client_id,
                client_secret,
            } => (http_client, token_uri, refresh_token, client_id, client_secret),
        };

        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.token.clone());
            }
        }

        tracing::debug!("Refreshing access token");
        let response = http_client
            .post(token_uri.as_str())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        // Only a refusal of the grant itself is final
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(RemoteError::Auth(format!("{}: {}", status.as_u16(), body)));
            }
            return Err(RemoteError::Status(status.as_u16(), body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Auth(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        let refresh_at = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);
        let access_token = token.access_token.clone();
        *current = Some(AccessToken {
            token: token.access_token,
            refresh_at,
        });

        Ok(access_token)
    }
}

fn read_client_secrets(path: &Path) -> Result<ClientSecretSection> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read client secrets {} failed: {}", path.display(), e))
    })?;
    let file: ClientSecretsFile = serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    file.installed.or(file.web).ok_or_else(|| {
        Error::Config(format!(
            "{} has neither an \"installed\" nor a \"web\" section",
            path.display()
        ))
    })
}

fn save_credentials(credentials: &StoredCredentials, path: &Path) -> Result<()> {
    let content = serde_json::to_string(credentials)?;
    std::fs::write(path, content)?;
    tracing::debug!("Saved credentials to {}", path.display());
    Ok(())
}
