//! Flickr data export reader
//!
//! Layout of a Flickr export:
//! - photo files, named `<title>_<id>_o.<ext>`
//! - `photo_<id>.json` per photo (title, description, date, geo, albums, tags)
//! - `albums.json` listing every album with its description and cover photo

use super::work_items::{load_or_scan_work_items, ScanError};
use super::ExportReader;
use crate::models::{AlbumRef, GeoPoint, ItemMetadata, TagRef, WorkItem};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DATE_TAKEN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flickr export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Albums manifest missing or unparseable
    #[error("Albums manifest {0}: {1}")]
    Manifest(PathBuf, String),
}

#[derive(Debug, Deserialize)]
struct AlbumsManifest {
    #[serde(default)]
    albums: Vec<ManifestAlbum>,
}

#[derive(Debug, Deserialize)]
struct ManifestAlbum {
    #[serde(default)]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    cover_photo: String,
}

#[derive(Debug, Deserialize)]
struct PhotoRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date_taken: Option<String>,
    #[serde(default)]
    geo: Vec<GeoRecord>,
    #[serde(default)]
    albums: Vec<AlbumMembership>,
    #[serde(default)]
    tags: Vec<TagRecord>,
}

#[derive(Debug, Deserialize)]
struct GeoRecord {
    latitude: serde_json::Value,
    longitude: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AlbumMembership {
    title: String,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    tag: String,
}

/// Reader over an on-disk Flickr export
pub struct FlickrExport {
    photo_dir: PathBuf,
    photo_json_dir: PathBuf,
    work_items: Vec<WorkItem>,
    albums_by_title: HashMap<String, AlbumRef>,
    /// photo id -> ids of albums it is the cover of
    covers: HashMap<String, BTreeSet<String>>,
}

impl FlickrExport {
    /// Open an export, enumerating work items through the cache in `state_dir`
    pub fn open(
        photo_dir: &Path,
        photo_json_dir: &Path,
        albums_json: &Path,
        state_dir: &Path,
    ) -> Result<Self, ExportError> {
        let work_items = load_or_scan_work_items(state_dir, photo_dir)?;
        Self::with_work_items(photo_dir, photo_json_dir, albums_json, work_items)
    }

    /// Open an export with an already known work set
    pub fn with_work_items(
        photo_dir: &Path,
        photo_json_dir: &Path,
        albums_json: &Path,
        work_items: Vec<WorkItem>,
    ) -> Result<Self, ExportError> {
        let content = std::fs::read_to_string(albums_json)
            .map_err(|e| ExportError::Manifest(albums_json.to_path_buf(), e.to_string()))?;
        let manifest: AlbumsManifest = serde_json::from_str(&content)
            .map_err(|e| ExportError::Manifest(albums_json.to_path_buf(), e.to_string()))?;

        let mut albums_by_title = HashMap::new();
        let mut covers: HashMap<String, BTreeSet<String>> = HashMap::new();

        for album in manifest.albums {
            let album_ref = if album.cover_photo.is_empty() {
                AlbumRef::new(album.title.clone(), album.description)
            } else {
                AlbumRef::new(album.title.clone(), album.description)
                    .with_cover_photo(album.cover_photo)
            };
            if let Some(cover_id) = album_ref.cover_photo_id() {
                covers
                    .entry(cover_id.to_string())
                    .or_default()
                    .insert(album.id.clone());
            }
            albums_by_title.insert(album.title, album_ref);
        }

        tracing::info!(
            albums = albums_by_title.len(),
            photos = work_items.len(),
            "Flickr export opened"
        );

        Ok(Self {
            photo_dir: photo_dir.to_path_buf(),
            photo_json_dir: photo_json_dir.to_path_buf(),
            work_items,
            albums_by_title,
            covers,
        })
    }

    fn photo_json_path(&self, item_id: &str) -> PathBuf {
        self.photo_json_dir.join(format!("photo_{}.json", item_id))
    }

    fn read_photo_record(&self, item_id: &str) -> Option<PhotoRecord> {
        let path = self.photo_json_path(item_id);
        let result = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

        match result {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Photo json file {} read error {}", path.display(), e);
                None
            }
        }
    }
}

/// Coordinate given as a number or numeric string
///
/// Values outside the valid degree range are micro-degrees and are scaled.
fn coordinate(value: &serde_json::Value, limit: f64) -> Option<f64> {
    let raw = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let degrees = if raw.abs() > limit { raw / 1_000_000.0 } else { raw };
    (degrees.abs() <= limit).then_some(degrees)
}

fn geo_point(record: &GeoRecord) -> Option<GeoPoint> {
    Some(GeoPoint {
        latitude: coordinate(&record.latitude, 90.0)?,
        longitude: coordinate(&record.longitude, 180.0)?,
    })
}

impl ExportReader for FlickrExport {
    fn list_work_items(&self) -> Vec<WorkItem> {
        self.work_items.clone()
    }

    fn metadata(&self, item_id: &str) -> Option<ItemMetadata> {
        let record = self.read_photo_record(item_id)?;

        let date_taken = record.date_taken.as_deref().and_then(|s| {
            NaiveDateTime::parse_from_str(s, DATE_TAKEN_FORMAT)
                .map_err(|e| {
                    tracing::debug!(item_id, date_taken = s, error = %e, "Unparseable date_taken")
                })
                .ok()
        });

        let albums = record
            .albums
            .iter()
            .filter_map(|membership| {
                let album = self.albums_by_title.get(&membership.title);
                if album.is_none() {
                    tracing::debug!(
                        item_id,
                        album = %membership.title,
                        "Album not in manifest, skipping"
                    );
                }
                album.cloned()
            })
            .collect();

        Some(ItemMetadata {
            description: ItemMetadata::caption(&record.name, &record.description),
            name: record.name,
            date_taken,
            geo: record.geo.first().and_then(geo_point),
            albums,
            tags: record.tags.into_iter().map(|t| TagRef::new(t.tag)).collect(),
            cover_of_album_ids: self.covers.get(item_id).cloned().unwrap_or_default(),
        })
    }

    fn has_metadata(&self, item_id: &str) -> bool {
        self.photo_json_path(item_id).is_file()
    }

    fn photo_path(&self, file_name: &str) -> PathBuf {
        self.photo_dir.join(file_name)
    }

    fn open_file(&self, file_name: &str) -> std::io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.photo_path(file_name))?;
        Ok(Box::new(file))
    }
}
