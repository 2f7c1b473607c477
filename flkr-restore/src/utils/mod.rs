//! Utility modules for flkr-restore

pub mod description;
pub mod remote_retry;

pub use description::{convert_description, DESCRIPTION_PLACEHOLDER, MAX_DESCRIPTION_CHARS};
pub use remote_retry::{RemoteCall, RetryPolicy};
