//! Work-item enumeration
//!
//! Walks the photo directory once and snapshots the result to
//! `id_files.json`. Later runs reuse the snapshot instead of re-scanning a
//! large export.

use crate::models::WorkItem;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Work-item cache file name, relative to the state directory
pub const WORK_ITEM_CACHE_FILE: &str = "id_files.json";

/// Photo directory scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Work-item cache could not be written
    #[error("Write {0} failed: {1}")]
    CacheWrite(PathBuf, String),
}

/// Export photo id embedded in a file name
///
/// Flickr names exported files `<title>_<id>_o.<ext>`; the id is the last
/// `_`-separated part of the stem made only of digits.
pub fn photo_id_from_file_name(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    stem.split('_')
        .filter(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .last()
        .map(str::to_string)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Walk the photo directory and build one work item per photo file
///
/// Files without an id in their name are skipped, as are repeated ids (the
/// first file wins).
pub fn scan_photo_dir(photo_dir: &Path) -> Result<Vec<WorkItem>, ScanError> {
    if !photo_dir.exists() {
        return Err(ScanError::PathNotFound(photo_dir.to_path_buf()));
    }
    if !photo_dir.is_dir() {
        return Err(ScanError::NotADirectory(photo_dir.to_path_buf()));
    }

    let mut items = Vec::new();
    let mut seen = HashSet::new();

    let walker = WalkDir::new(photo_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error accessing entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(photo_dir).unwrap_or(entry.path());
        let file_name = relative.to_string_lossy().to_string();
        let base_name = entry.file_name().to_string_lossy();

        let Some(id) = photo_id_from_file_name(&base_name) else {
            tracing::warn!(file = %file_name, "No photo id in file name, skipping");
            continue;
        };

        if !seen.insert(id.clone()) {
            tracing::warn!(id = %id, file = %file_name, "Duplicate photo id, skipping");
            continue;
        }

        items.push(WorkItem::new(id, file_name));
    }

    tracing::debug!(count = items.len(), dir = %photo_dir.display(), "Photo scan complete");
    Ok(items)
}

/// Read the work-item cache if present, otherwise scan and write it
pub fn load_or_scan_work_items(
    state_dir: &Path,
    photo_dir: &Path,
) -> Result<Vec<WorkItem>, ScanError> {
    let cache_path = state_dir.join(WORK_ITEM_CACHE_FILE);

    if let Ok(content) = std::fs::read_to_string(&cache_path) {
        match serde_json::from_str::<Vec<WorkItem>>(&content) {
            Ok(items) => {
                tracing::info!(count = items.len(), "Read {}", cache_path.display());
                return Ok(items);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Ignoring unreadable {}, re-scanning export",
                    cache_path.display()
                );
            }
        }
    }

    let items = scan_photo_dir(photo_dir)?;

    let file = File::create(&cache_path)
        .map_err(|e| ScanError::CacheWrite(cache_path.clone(), e.to_string()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &items)
        .map_err(|e| ScanError::CacheWrite(cache_path.clone(), e.to_string()))?;
    writer
        .flush()
        .map_err(|e| ScanError::CacheWrite(cache_path.clone(), e.to_string()))?;

    tracing::info!("Wrote {} ids to {}", items.len(), cache_path.display());
    Ok(items)
}
