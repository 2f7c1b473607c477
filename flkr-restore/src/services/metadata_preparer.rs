//! Embedded metadata preparation before upload
//!
//! The destination derives capture time and location from the file itself,
//! so a full implementation rewrites EXIF from the export's metadata before
//! the bytes are sent. File mutation is delegated through
//! [`MetadataPreparer`]; the engine treats any failure as non-fatal.

use crate::models::ItemMetadata;
use std::path::Path;
use thiserror::Error;

/// Metadata preparation errors
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File format the preparer cannot write to
    #[error("Unsupported file: {0}")]
    Unsupported(String),
}

/// Writes export metadata (geo, date) into a local photo file
pub trait MetadataPreparer {
    fn prepare(&self, path: &Path, metadata: &ItemMetadata) -> Result<(), PrepareError>;
}

/// Leaves files untouched and logs what would have been embedded
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOnlyPreparer;

impl MetadataPreparer for RecordOnlyPreparer {
    fn prepare(&self, path: &Path, metadata: &ItemMetadata) -> Result<(), PrepareError> {
        if let Some(geo) = metadata.geo {
            tracing::debug!(
                file = %path.display(),
                latitude = geo.latitude,
                longitude = geo.longitude,
                "Geo not embedded"
            );
        }
        if let Some(date_taken) = metadata.date_taken {
            tracing::debug!(
                file = %path.display(),
                date_taken = %date_taken,
                "Date taken not embedded"
            );
        }
        Ok(())
    }
}
