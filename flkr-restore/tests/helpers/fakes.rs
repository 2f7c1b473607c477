//! In-memory collaborators for engine tests

use async_trait::async_trait;
use flkr_restore::export::ExportReader;
use flkr_restore::models::{AlbumRef, ItemMetadata, RemoteAlbum, TagRef, WorkItem};
use flkr_restore::remote::{AlbumPage, RemoteClient, RemoteError, RemoteResult};
use flkr_restore::services::{MetadataPreparer, PrepareError};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ============================================================================
// Export
// ============================================================================

/// Export held in memory
#[derive(Default)]
pub struct FakeExport {
    items: Vec<WorkItem>,
    metadata: HashMap<String, ItemMetadata>,
    files: HashMap<String, Vec<u8>>,
}

impl FakeExport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a photo with bytes and metadata
    pub fn with_photo(mut self, id: &str, metadata: ItemMetadata) -> Self {
        let file_name = format!("photo_{}_o.jpg", id);
        self.files.insert(file_name.clone(), format!("bytes of {}", id).into_bytes());
        self.items.push(WorkItem::new(id, file_name));
        self.metadata.insert(id.to_string(), metadata);
        self
    }

    /// Add a photo that has no metadata record
    pub fn with_bare_photo(mut self, id: &str) -> Self {
        let file_name = format!("photo_{}_o.jpg", id);
        self.files.insert(file_name.clone(), b"bare".to_vec());
        self.items.push(WorkItem::new(id, file_name));
        self
    }

    /// Add a work item whose file cannot be opened
    pub fn with_missing_file(mut self, id: &str) -> Self {
        self.items.push(WorkItem::new(id, format!("gone_{}.jpg", id)));
        self
    }
}

impl ExportReader for FakeExport {
    fn list_work_items(&self) -> Vec<WorkItem> {
        self.items.clone()
    }

    fn metadata(&self, item_id: &str) -> Option<ItemMetadata> {
        self.metadata.get(item_id).cloned()
    }

    fn has_metadata(&self, item_id: &str) -> bool {
        self.metadata.contains_key(item_id)
    }

    fn photo_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from("/fake/photos").join(file_name)
    }

    fn open_file(&self, file_name: &str) -> std::io::Result<Box<dyn Read + Send>> {
        match self.files.get(file_name) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(std::io::Error::new(std::io::ErrorKind::NotFound, file_name.to_string())),
        }
    }
}

/// Metadata builder for tests
pub fn metadata(description: &str, albums: Vec<AlbumRef>, tags: &[&str]) -> ItemMetadata {
    ItemMetadata {
        name: String::new(),
        description: description.to_string(),
        albums,
        tags: tags.iter().map(|t| TagRef::new(*t)).collect(),
        ..Default::default()
    }
}

// ============================================================================
// Remote
// ============================================================================

/// Remote operation kinds, for scripting failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListAlbums,
    CreateAlbum,
    EnrichAlbum,
    Upload,
    AttachToAlbum,
    AttachDescription,
}

/// A recorded remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListAlbums { page_token: Option<String> },
    CreateAlbum { title: String },
    EnrichAlbum { remote_id: String, text: String },
    Upload { file_name: String, len: usize },
    AttachToAlbum { album_id: String, upload_token: String, make_first: bool },
    AttachDescription { upload_token: String, text: String },
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::ListAlbums { .. } => Op::ListAlbums,
            Call::CreateAlbum { .. } => Op::CreateAlbum,
            Call::EnrichAlbum { .. } => Op::EnrichAlbum,
            Call::Upload { .. } => Op::Upload,
            Call::AttachToAlbum { .. } => Op::AttachToAlbum,
            Call::AttachDescription { .. } => Op::AttachDescription,
        }
    }
}

#[derive(Default)]
struct FakeRemoteState {
    calls: Vec<Call>,
    existing_albums: Vec<RemoteAlbum>,
    /// Operations that always fail, and how
    always_fail: HashMap<Op, RemoteError>,
    /// Operations that fail this many more times before succeeding
    fail_times: HashMap<Op, (usize, RemoteError)>,
    /// File names whose upload always fails
    failing_uploads: HashSet<String>,
    malformed_create: bool,
    next_id: usize,
}

/// Scripted remote library; clones share state
#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<FakeRemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Albums the library already has (listed one per page)
    pub fn with_existing_albums(self, albums: Vec<RemoteAlbum>) -> Self {
        self.state.lock().unwrap().existing_albums = albums;
        self
    }

    pub fn fail_always(&self, op: Op, error: RemoteError) {
        self.state.lock().unwrap().always_fail.insert(op, error);
    }

    pub fn fail_times(&self, op: Op, times: usize, error: RemoteError) {
        self.state.lock().unwrap().fail_times.insert(op, (times, error));
    }

    pub fn heal(&self, op: Op) {
        let mut state = self.state.lock().unwrap();
        state.always_fail.remove(&op);
        state.fail_times.remove(&op);
    }

    pub fn fail_upload_of(&self, file_name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(file_name.to_string());
    }

    pub fn malformed_create(&self) {
        self.state.lock().unwrap().malformed_create = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|c| c.op() == op).count()
    }

    pub fn created_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateAlbum { title } => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn attachments(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AttachToAlbum { album_id, make_first, .. } => Some((album_id, make_first)),
                _ => None,
            })
            .collect()
    }

    /// Record the call, then decide whether it fails
    fn record(&self, call: Call) -> RemoteResult<usize> {
        let mut state = self.state.lock().unwrap();
        let op = call.op();
        let failing_upload = match &call {
            Call::Upload { file_name, .. } => state.failing_uploads.contains(file_name),
            _ => false,
        };
        state.calls.push(call);

        if failing_upload {
            return Err(RemoteError::Status(500, "upload rejected".to_string()));
        }
        if let Some(error) = state.always_fail.get(&op) {
            return Err(error.clone());
        }
        if let Some((remaining, error)) = state.fail_times.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(error.clone());
            }
        }
        state.next_id += 1;
        Ok(state.next_id)
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn list_albums(&self, page_token: Option<&str>) -> RemoteResult<AlbumPage> {
        self.record(Call::ListAlbums {
            page_token: page_token.map(str::to_string),
        })?;
        let state = self.state.lock().unwrap();
        let index: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let albums = state.existing_albums.get(index).cloned().into_iter().collect();
        let next_page_token =
            (index + 1 < state.existing_albums.len()).then(|| (index + 1).to_string());
        Ok(AlbumPage {
            albums,
            next_page_token,
        })
    }

    async fn create_album(&self, title: &str) -> RemoteResult<RemoteAlbum> {
        let id = self.record(Call::CreateAlbum {
            title: title.to_string(),
        })?;
        if self.state.lock().unwrap().malformed_create {
            return Err(RemoteError::Malformed("No id in google_album".to_string()));
        }
        Ok(RemoteAlbum::new(format!("album-{}", id), title))
    }

    async fn enrich_album(&self, remote_id: &str, text: &str) -> RemoteResult<()> {
        self.record(Call::EnrichAlbum {
            remote_id: remote_id.to_string(),
            text: text.to_string(),
        })?;
        Ok(())
    }

    async fn upload_bytes(&self, bytes: Vec<u8>, file_name: &str) -> RemoteResult<String> {
        let id = self.record(Call::Upload {
            file_name: file_name.to_string(),
            len: bytes.len(),
        })?;
        Ok(format!("token-{}", id))
    }

    async fn attach_to_album(
        &self,
        remote_album_id: &str,
        upload_token: &str,
        make_first: bool,
    ) -> RemoteResult<()> {
        self.record(Call::AttachToAlbum {
            album_id: remote_album_id.to_string(),
            upload_token: upload_token.to_string(),
            make_first,
        })?;
        Ok(())
    }

    async fn attach_description(&self, upload_token: &str, text: &str) -> RemoteResult<()> {
        self.record(Call::AttachDescription {
            upload_token: upload_token.to_string(),
            text: text.to_string(),
        })?;
        Ok(())
    }
}

// ============================================================================
// Metadata preparer
// ============================================================================

/// Preparer that counts calls and always fails
#[derive(Clone, Default)]
pub struct FailingPreparer {
    pub calls: Arc<Mutex<usize>>,
}

impl MetadataPreparer for FailingPreparer {
    fn prepare(&self, _path: &Path, _metadata: &ItemMetadata) -> Result<(), PrepareError> {
        *self.calls.lock().unwrap() += 1;
        Err(PrepareError::Unsupported("test".to_string()))
    }
}
