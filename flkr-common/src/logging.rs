//! Logging setup
//!
//! Debug detail goes to a log file that is truncated on every run; info and
//! above go to the console. `RUST_LOG` overrides the console filter.

use crate::{Error, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize global tracing with a file layer (DEBUG) and a console layer (INFO)
pub fn init_logging(log_file: &Path) -> Result<()> {
    let file = File::create(log_file).map_err(|e| {
        Error::Config(format!("Create log file {} failed: {}", log_file.display(), e))
    })?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::DEBUG);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Internal(format!("Tracing already initialized: {}", e)))
}
