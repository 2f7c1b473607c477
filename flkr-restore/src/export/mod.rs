//! Source export access
//!
//! The migration engine sees the export only through [`ExportReader`].
//! [`FlickrExport`] reads a Flickr data export from disk.

pub mod flickr;
pub mod work_items;

pub use flickr::FlickrExport;
pub use work_items::{load_or_scan_work_items, scan_photo_dir, ScanError, WORK_ITEM_CACHE_FILE};

use crate::models::{ItemMetadata, WorkItem};
use std::io::Read;
use std::path::PathBuf;

/// Read-only view of a photo export
pub trait ExportReader {
    /// Every item in the export, in enumeration order
    fn list_work_items(&self) -> Vec<WorkItem>;

    /// Metadata for one item; `None` when the export has no usable record
    fn metadata(&self, item_id: &str) -> Option<ItemMetadata>;

    /// Whether a metadata record exists for the item
    fn has_metadata(&self, item_id: &str) -> bool;

    /// Location of a photo file on local storage
    fn photo_path(&self, file_name: &str) -> PathBuf;

    /// Open a photo file for reading
    fn open_file(&self, file_name: &str) -> std::io::Result<Box<dyn Read + Send>>;
}
