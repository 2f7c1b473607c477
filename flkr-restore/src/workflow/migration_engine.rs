//! Migration Engine
//!
//! Drives each remaining work item through:
//!
//! `PENDING → METADATA_PREPARED → UPLOADED → ALBUMS_ATTACHED → TAGS_ATTACHED → DONE`
//!
//! Items are processed strictly one after another. That keeps the album
//! cache race-free (no two creations of the same title can interleave) and
//! lets an item be marked done only after all of its attachments succeeded.
//!
//! Every network call goes through the [`RetryPolicy`]. An upload that fails
//! skips the item (the next run retries it); any other exhausted call ends
//! the run with a [`MigrationError`].

use crate::error::{MigrationError, MigrationResult};
use crate::export::ExportReader;
use crate::models::{AlbumRef, ItemMetadata, RemoteAlbum, UploadRecord, WorkItem};
use crate::remote::RemoteClient;
use crate::services::{AlbumLogState, MetadataPreparer, ProgressLedger};
use crate::utils::{convert_description, RemoteCall, RetryPolicy};
use std::fmt;
use std::io::Read;

/// Per-item progress (only `DONE` is persisted)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Pending,
    MetadataPrepared,
    Uploaded,
    AlbumsAttached,
    TagsAttached,
    Done,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStage::Pending => "PENDING",
            ItemStage::MetadataPrepared => "METADATA_PREPARED",
            ItemStage::Uploaded => "UPLOADED",
            ItemStage::AlbumsAttached => "ALBUMS_ATTACHED",
            ItemStage::TagsAttached => "TAGS_ATTACHED",
            ItemStage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// What happened to one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Uploaded, attached everywhere and recorded as done
    Migrated,
    /// No upload token obtained; left for the next run
    UploadSkipped,
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub migrated: usize,
    pub skipped: usize,
    pub albums_created: usize,
    pub successful_operations: u64,
}

/// Resumable batch migration from an export into a remote library
pub struct MigrationEngine<E, R, P> {
    export: E,
    remote: R,
    preparer: P,
    ledger: ProgressLedger,
    retry: RetryPolicy,
    summary: MigrationSummary,
}

impl<E, R, P> MigrationEngine<E, R, P>
where
    E: ExportReader,
    R: RemoteClient,
    P: MetadataPreparer,
{
    pub fn new(export: E, remote: R, preparer: P, ledger: ProgressLedger, retry: RetryPolicy) -> Self {
        Self {
            export,
            remote,
            preparer,
            ledger,
            retry,
            summary: MigrationSummary::default(),
        }
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Remote operations accepted so far
    pub fn successful_operations(&self) -> u64 {
        self.retry.succeeded()
    }

    /// Export items not yet recorded as done, in enumeration order
    pub fn remaining_items(&self) -> Vec<WorkItem> {
        self.ledger.load_remaining(self.export.list_work_items())
    }

    /// Migrate every remaining item, stopping at the first fatal error
    pub async fn run(&mut self) -> MigrationResult<MigrationSummary> {
        let remaining = self.remaining_items();
        tracing::info!("Uploading {} photos", remaining.len());

        for item in &remaining {
            self.migrate_item(item).await?;
        }

        self.summary.successful_operations = self.retry.succeeded();
        tracing::info!(
            migrated = self.summary.migrated,
            skipped = self.summary.skipped,
            albums_created = self.summary.albums_created,
            successful_operations = self.summary.successful_operations,
            "Migration finished"
        );
        Ok(self.summary.clone())
    }

    /// Take one item through its whole state machine
    pub async fn migrate_item(&mut self, item: &WorkItem) -> MigrationResult<ItemOutcome> {
        tracing::info!("Uploading photo: {}, {}", item.id, item.source_file_name);
        log_stage(item, ItemStage::Pending);

        let metadata = if self.export.has_metadata(&item.id) {
            self.export.metadata(&item.id)
        } else {
            None
        };

        if let Some(metadata) = &metadata {
            self.prepare_metadata(item, metadata);
        }
        log_stage(item, ItemStage::MetadataPrepared);

        let Some(upload) = self.upload(item, metadata.as_ref()).await? else {
            self.summary.skipped += 1;
            return Ok(ItemOutcome::UploadSkipped);
        };
        log_stage(item, ItemStage::Uploaded);

        if let Some(metadata) = &metadata {
            for album in &metadata.albums {
                self.add_to_album(item, album, &upload.upload_token).await?;
            }
        }
        log_stage(item, ItemStage::AlbumsAttached);

        if let Some(metadata) = &metadata {
            for tag in &metadata.tags {
                self.add_to_album(item, &AlbumRef::for_tag(&tag.tag), &upload.upload_token)
                    .await?;
            }
        }
        log_stage(item, ItemStage::TagsAttached);

        self.ledger
            .mark_item_done(&upload.item_id, &upload.upload_token)?;
        log_stage(item, ItemStage::Done);
        self.summary.migrated += 1;
        Ok(ItemOutcome::Migrated)
    }

    fn prepare_metadata(&self, item: &WorkItem, metadata: &ItemMetadata) {
        tracing::debug!("Going to update exif for photo: '{}'", item.id);
        let path = self.export.photo_path(&item.source_file_name);
        if let Err(e) = self.preparer.prepare(&path, metadata) {
            tracing::warn!(
                item_id = %item.id,
                file = %path.display(),
                error = %e,
                "Metadata preparation failed, uploading file as is"
            );
        }
    }

    /// Upload the item's bytes and attach its description
    ///
    /// `None` means no upload token was obtained and the item is skipped.
    async fn upload(
        &mut self,
        item: &WorkItem,
        metadata: Option<&ItemMetadata>,
    ) -> MigrationResult<Option<UploadRecord>> {
        let bytes = match self.read_photo(item) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    file = %item.source_file_name,
                    error = %e,
                    "Cannot read photo file, skipping"
                );
                return Ok(None);
            }
        };

        let remote = &self.remote;
        let file_name = item.source_file_name.as_str();
        let result = self
            .retry
            .execute(RemoteCall::new(
                format!("upload {}, {}", item.id, file_name),
                || remote.upload_bytes(bytes.clone(), file_name),
            ))
            .await;

        let upload_token = match result {
            Ok(token) if !token.trim().is_empty() => token,
            Ok(_) => {
                tracing::warn!(item_id = %item.id, "Upload returned no token, skipping");
                return Ok(None);
            }
            Err(e @ MigrationError::RetriesExhausted { .. })
            | Err(e @ MigrationError::MalformedResponse { .. }) => {
                tracing::warn!(item_id = %item.id, error = %e, "Upload failed, left for next run");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("Received upload token: {}", upload_token);

        let description = metadata.map(|m| m.description.as_str()).unwrap_or_default();
        if !description.is_empty() {
            let text = convert_description(description, &item.id);
            let token = upload_token.as_str();
            self.retry
                .execute(RemoteCall::new(
                    format!("set description {}, {}", item.id, file_name),
                    || remote.attach_description(token, &text),
                ))
                .await?;
        }

        Ok(Some(UploadRecord {
            item_id: item.id.clone(),
            upload_token,
        }))
    }

    fn read_photo(&self, item: &WorkItem) -> std::io::Result<Vec<u8>> {
        let mut reader = self.export.open_file(&item.source_file_name)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    async fn add_to_album(
        &mut self,
        item: &WorkItem,
        album: &AlbumRef,
        upload_token: &str,
    ) -> MigrationResult<()> {
        let remote_album = self.get_or_create_remote_album(album).await?;
        let make_first = album.cover_photo_id() == Some(item.id.as_str());

        tracing::debug!(
            make_first,
            "adding {} to {}",
            item.id,
            album.title
        );

        let remote = &self.remote;
        let album_id = remote_album.remote_id.as_str();
        self.retry
            .execute(RemoteCall::new(
                format!("add {} to album {}", item.id, album.title),
                || remote.attach_to_album(album_id, upload_token, make_first),
            ))
            .await
    }

    /// Cached remote album for the title, creating it on first reference
    pub async fn get_or_create_remote_album(
        &mut self,
        album: &AlbumRef,
    ) -> MigrationResult<RemoteAlbum> {
        self.ensure_album_cache().await?;
        if let Some(existing) = self.ledger.resolved_album(&album.title) {
            return Ok(existing.clone());
        }

        let title = album.title.as_str();
        tracing::info!("Creating google album: {}", title);

        let remote = &self.remote;
        let created = self
            .retry
            .execute(RemoteCall::new(
                format!("create google album: {}", title),
                || remote.create_album(title),
            ))
            .await?;

        self.ledger.record_resolved_album(title, created.clone())?;
        self.summary.albums_created += 1;

        if !album.description.is_empty() {
            self.set_album_description(&created.remote_id, &album.description)
                .await;
        }
        Ok(created)
    }

    /// Best-effort album text; failures only cost cosmetics
    async fn set_album_description(&mut self, remote_id: &str, description: &str) {
        let text = convert_description(description, "album");
        let remote = &self.remote;
        let result = self
            .retry
            .attempt_once(RemoteCall::new(
                format!("describe album {}", remote_id),
                || remote.enrich_album(remote_id, &text),
            ))
            .await;
        if result.is_ok() {
            tracing::debug!(remote_id, "Album description set");
        }
    }

    /// Load the album cache, seeding it from the remote library on first run
    async fn ensure_album_cache(&mut self) -> MigrationResult<()> {
        if self.ledger.albums_loaded() {
            return Ok(());
        }
        if let AlbumLogState::Missing = self.ledger.open_album_log()? {
            let existing = self.list_remote_albums().await?;
            let seeded = self.ledger.seed_album_log(existing)?;
            tracing::info!(albums = seeded, "Seeded album cache from existing remote albums");
        }
        Ok(())
    }

    /// Every album in the remote library, following all listing pages
    ///
    /// Nothing is recorded until the last page arrived; a failure part way
    /// leaves the album log absent so the next run lists again. Of several
    /// albums sharing a title, the first listed is the one reused.
    async fn list_remote_albums(&mut self) -> MigrationResult<Vec<RemoteAlbum>> {
        let mut albums = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let remote = &self.remote;
            let token = page_token.as_deref();
            let page = self
                .retry
                .execute(RemoteCall::new("list google albums", || remote.list_albums(token)))
                .await?;

            albums.extend(page.albums);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(albums)
    }
}

fn log_stage(item: &WorkItem, stage: ItemStage) {
    tracing::debug!(item_id = %item.id, stage = %stage, "Item stage");
}
