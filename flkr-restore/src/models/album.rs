//! Album references (source side) and resolved remote albums

use serde::{Deserialize, Serialize};

/// Title prefix for the pseudo-albums that carry source tags
pub const TAG_ALBUM_PREFIX: &str = "tag ";

/// A destination grouping, keyed by title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumRef {
    pub title: String,
    pub description: String,
    /// Raw cover reference from the export (a photo page URL)
    pub cover_photo: Option<String>,
}

impl AlbumRef {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            cover_photo: None,
        }
    }

    pub fn with_cover_photo(mut self, cover_photo: impl Into<String>) -> Self {
        self.cover_photo = Some(cover_photo.into());
        self
    }

    /// Synthetic album for a source tag: `"tag <name>"`, no description, no cover
    pub fn for_tag(tag: &str) -> Self {
        Self::new(format!("{}{}", TAG_ALBUM_PREFIX, tag), "")
    }

    /// Id of the photo designated as this album's cover, if any
    pub fn cover_photo_id(&self) -> Option<&str> {
        self.cover_photo.as_deref().and_then(cover_photo_id)
    }
}

/// Extract the photo id from a path-like cover reference
///
/// The id is the trailing path segment. A reference without a `/`, or one
/// ending in `/`, has no cover id.
pub fn cover_photo_id(cover_ref: &str) -> Option<&str> {
    match cover_ref.rsplit_once('/') {
        Some((_, id)) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Remote counterpart of an [`AlbumRef`]
///
/// Field names follow the Photos Library album resource so that records in
/// the album log are the remote JSON as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAlbum {
    #[serde(rename = "id")]
    pub remote_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "productUrl", default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
}

impl RemoteAlbum {
    pub fn new(remote_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            title: title.into(),
            product_url: None,
        }
    }
}
