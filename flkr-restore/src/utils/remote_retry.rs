//! Remote Retry Policy
//!
//! Runs a remote operation with a bounded number of attempts and a fixed
//! backoff between them. The Photos API asks clients to wait before retrying
//! both quota (429) and server errors, so every failure gets the same sleep.
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, count it and return the result
//! 3. If the failure is not retryable: return immediately, as
//!    [`MigrationError::MalformedResponse`] (the remote side effect already
//!    happened) or [`MigrationError::Unauthorized`] (refused credentials
//!    fail every call alike)
//! 4. Otherwise, if attempts remain: log, sleep `backoff`, retry
//! 5. Out of attempts: log the action and the successful-operation count,
//!    return [`MigrationError::RetriesExhausted`]

use crate::error::{MigrationError, MigrationResult};
use crate::remote::{RemoteError, RemoteResult};
use flkr_common::RetryConfig;
use std::future::Future;
use std::time::Duration;

const QUOTA_DOCS_URL: &str = "https://developers.google.com/photos/overview/api-limits-quotas";

/// A remote operation together with a label for logs and errors
pub struct RemoteCall<F> {
    pub action: String,
    pub invoke: F,
}

impl<F> RemoteCall<F> {
    pub fn new(action: impl Into<String>, invoke: F) -> Self {
        Self {
            action: action.into(),
            invoke,
        }
    }
}

/// Bounded fixed-backoff retry with a successful-operation counter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
    succeeded: u64,
}

impl RetryPolicy {
    /// `max_attempts` counts the first attempt and is at least 1
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            succeeded: 0,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.backoff_secs))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Remote operations accepted so far in this run
    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    /// Run `call` until it succeeds or attempts run out
    pub async fn execute<T, F, Fut>(&mut self, call: RemoteCall<F>) -> MigrationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let RemoteCall { action, mut invoke } = call;
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tracing::debug!(action = %action, attempt, "Retrying remote operation");
            }

            match invoke().await {
                Ok(value) => {
                    self.succeeded += 1;
                    if attempt > 1 {
                        tracing::debug!(action = %action, attempt, "Remote operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => {
                    tracing::warn!(action = %action, error = %err, "Remote operation not retryable");
                    return Err(match err {
                        RemoteError::Malformed(detail) => {
                            MigrationError::MalformedResponse { action, detail }
                        }
                        RemoteError::Auth(detail) => MigrationError::Unauthorized { action, detail },
                        last => MigrationError::RetriesExhausted {
                            action,
                            attempts: attempt,
                            succeeded: self.succeeded,
                            last,
                        },
                    });
                }
                Err(err) => {
                    if err.is_rate_limited() {
                        tracing::debug!(action = %action, attempt, "Rate limited");
                    } else {
                        tracing::warn!(action = %action, attempt, error = %err, "Remote operation failed");
                    }
                    last_error = Some(err);

                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        let last = last_error.unwrap_or_else(|| RemoteError::Transport("no attempt made".to_string()));

        tracing::error!("    Failed: {}", action);
        if last.is_rate_limited() {
            tracing::error!("    Possible quota limit: {}", QUOTA_DOCS_URL);
        }
        tracing::error!("    Posted count: {}", self.succeeded);

        Err(MigrationError::RetriesExhausted {
            action,
            attempts: self.max_attempts,
            succeeded: self.succeeded,
            last,
        })
    }

    /// Run `call` exactly once, for operations whose failure is tolerable
    pub async fn attempt_once<T, F, Fut>(&mut self, call: RemoteCall<F>) -> RemoteResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let RemoteCall { action, invoke } = call;
        let result = invoke().await;
        match &result {
            Ok(_) => self.succeeded += 1,
            Err(err) => tracing::warn!(action = %action, error = %err, "Best-effort operation failed"),
        }
        result
    }
}
