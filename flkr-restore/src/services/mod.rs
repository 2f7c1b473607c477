//! Service modules for the migration workflow

pub mod metadata_preparer;
pub mod progress_ledger;

pub use metadata_preparer::{MetadataPreparer, PrepareError, RecordOnlyPreparer};
pub use progress_ledger::{AlbumLogState, ProgressLedger, DONE_ALBUMS_FILE, DONE_ITEMS_FILE};
