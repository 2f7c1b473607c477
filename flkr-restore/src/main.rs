//! flickr-restore - Flickr export to Google Photos migration
//!
//! Uploads every photo of a Flickr data export, restores descriptions,
//! albums and tags, and records progress so an interrupted run resumes
//! where it stopped.
//!
//! Exit status: 0 when all remaining items were processed, 1 on a fatal
//! error (exhausted retries, ledger write failure, bad arguments or config).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};

use flkr_common::logging::init_logging;
use flkr_common::RestoreConfig;
use flkr_restore::export::{ExportReader, FlickrExport};
use flkr_restore::remote::{GooglePhotosClient, TokenProvider};
use flkr_restore::services::{ProgressLedger, RecordOnlyPreparer};
use flkr_restore::utils::RetryPolicy;
use flkr_restore::MigrationEngine;

/// Command-line arguments for flickr-restore
#[derive(Parser, Debug)]
#[command(name = "flickr-restore")]
#[command(about = "Migrate a Flickr data export into a Google Photos library")]
#[command(version)]
struct Args {
    /// Configuration file (JSON, or TOML by extension)
    config: PathBuf,

    /// Directory for progress logs and the work-item cache
    #[arg(long, default_value = ".", env = "FLICKR_RESTORE_STATE_DIR")]
    state_dir: PathBuf,

    /// Debug log file, truncated on each run
    #[arg(long, default_value = "flickr-restore.log")]
    log_file: PathBuf,

    /// List remaining work and exit without contacting the destination
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    if let Err(e) = init_logging(&args.log_file) {
        eprintln!("{}", e);
        return ExitCode::from(1);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting flickr-restore {}", env!("CARGO_PKG_VERSION"));

    let config = RestoreConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    std::fs::create_dir_all(&args.state_dir)
        .with_context(|| format!("Failed to create {}", args.state_dir.display()))?;

    let export = FlickrExport::open(
        &config.flickr_photo_dir,
        &config.flickr_photo_json_dir,
        &config.flickr_albums_json,
        &args.state_dir,
    )
    .context("Failed to open Flickr export")?;

    let ledger = ProgressLedger::open(&args.state_dir).context("Failed to open progress ledger")?;

    if args.dry_run {
        let remaining = ledger.load_remaining(export.list_work_items());
        info!("{} photos remaining", remaining.len());
        for item in &remaining {
            info!("  {} {}", item.id, item.source_file_name);
        }
        return Ok(());
    }

    let tokens = TokenProvider::from_files(&config.client_secrets_file, &config.auth_token_file)
        .context("Failed to load authorization")?;
    let client = match &config.api_base_url {
        Some(url) => GooglePhotosClient::with_base_url(tokens, url),
        None => GooglePhotosClient::new(tokens),
    }
    .context("Failed to create Photos Library client")?;

    let mut engine = MigrationEngine::new(
        export,
        client,
        RecordOnlyPreparer,
        ledger,
        RetryPolicy::from_config(&config.retry),
    );

    match engine.run().await {
        Ok(summary) => {
            info!(
                "Done: {} migrated, {} skipped (retried next run), {} albums created",
                summary.migrated, summary.skipped, summary.albums_created
            );
            Ok(())
        }
        Err(e) => {
            error!("    Exit on posted count: {}", engine.successful_operations());
            Err(e.into())
        }
    }
}
