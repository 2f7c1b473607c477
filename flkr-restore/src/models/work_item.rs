//! Work items: one exported photo each

use serde::{Deserialize, Serialize};

/// One source photo to migrate
///
/// Serialized as an `[id, file_name]` pair, the layout of the work-item cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct WorkItem {
    /// Export-local photo id (unique across the work set)
    pub id: String,
    /// File name relative to the photo directory
    pub source_file_name: String,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, source_file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_file_name: source_file_name.into(),
        }
    }
}

impl From<(String, String)> for WorkItem {
    fn from((id, source_file_name): (String, String)) -> Self {
        Self { id, source_file_name }
    }
}

impl From<WorkItem> for (String, String) {
    fn from(item: WorkItem) -> Self {
        (item.id, item.source_file_name)
    }
}

/// Proof that an item's bytes were accepted remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub item_id: String,
    /// Opaque token consumed by the attachment calls
    pub upload_token: String,
}
