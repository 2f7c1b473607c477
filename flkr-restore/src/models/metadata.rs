//! Per-photo metadata read from the export

use crate::models::AlbumRef;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// A source tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub tag: String,
}

impl TagRef {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Metadata of one exported photo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemMetadata {
    /// Photo title
    pub name: String,
    /// Caption sent to the destination (title and description joined)
    pub description: String,
    pub date_taken: Option<NaiveDateTime>,
    pub geo: Option<GeoPoint>,
    /// Albums in export order
    pub albums: Vec<AlbumRef>,
    /// Tags in export order
    pub tags: Vec<TagRef>,
    /// Ids of albums that use this photo as their cover
    pub cover_of_album_ids: BTreeSet<String>,
}

impl ItemMetadata {
    /// Join title and description with a blank line, dropping empty parts
    pub fn caption(name: &str, description: &str) -> String {
        [name, description]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
