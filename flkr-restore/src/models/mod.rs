//! Data models for the migration workflow

pub mod album;
pub mod metadata;
pub mod work_item;

pub use album::{cover_photo_id, AlbumRef, RemoteAlbum, TAG_ALBUM_PREFIX};
pub use metadata::{GeoPoint, ItemMetadata, TagRef};
pub use work_item::{UploadRecord, WorkItem};
