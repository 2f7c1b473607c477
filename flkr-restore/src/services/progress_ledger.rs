//! Progress Ledger
//!
//! Durable, append-only record of migration progress, kept in two files in
//! the state directory:
//! - `done_ids.txt`: `<itemId> <uploadToken>` per fully migrated item
//! - `done_albums.txt`: `[title, album]` JSON per resolved remote album
//!
//! Both files are opened once in append mode and every record is synced
//! before the call returns. Nothing is ever rewritten or removed.
//!
//! The album log only comes into existence once it is complete: the
//! destination's existing albums are written to a side file that is renamed
//! into place after the last listing page. An interrupted seeding therefore
//! leaves no album log, and the next run lists the destination again.
//!
//! An item is recorded only after every remote step for it succeeded. A
//! crash after a remote side effect but before the record is written makes
//! the next run repeat that item's remote work (at-least-once): a duplicate
//! remote media item is possible, lost progress is not.

use crate::error::{MigrationError, MigrationResult};
use crate::models::{RemoteAlbum, WorkItem};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const DONE_ITEMS_FILE: &str = "done_ids.txt";
pub const DONE_ALBUMS_FILE: &str = "done_albums.txt";
const SEEDING_SUFFIX: &str = ".seeding";

/// How the album cache was initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumLogState {
    /// An album log existed and this many albums were replayed from it
    Replayed(usize),
    /// No album log exists yet; it must be seeded before albums are resolved
    Missing,
}

struct AlbumCache {
    by_title: HashMap<String, RemoteAlbum>,
    log: File,
    path: PathBuf,
}

/// Durable record of completed items and resolved albums
pub struct ProgressLedger {
    state_dir: PathBuf,
    done_item_ids: HashSet<String>,
    done_items_log: File,
    done_items_path: PathBuf,
    albums: Option<AlbumCache>,
}

impl ProgressLedger {
    /// Open the ledger in `state_dir`, replaying completed items
    ///
    /// A missing or unreadable item log means nothing is done yet.
    pub fn open(state_dir: &Path) -> MigrationResult<Self> {
        let done_items_path = state_dir.join(DONE_ITEMS_FILE);
        let done_item_ids = read_done_ids(&done_items_path);
        let done_items_log = open_append(&done_items_path)?;

        tracing::debug!(
            done = done_item_ids.len(),
            path = %done_items_path.display(),
            "Progress ledger opened"
        );

        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            done_item_ids,
            done_items_log,
            done_items_path,
            albums: None,
        })
    }

    pub fn is_done(&self, item_id: &str) -> bool {
        self.done_item_ids.contains(item_id)
    }

    pub fn done_count(&self) -> usize {
        self.done_item_ids.len()
    }

    /// Items from `all_items` not yet done, in their original order
    pub fn load_remaining(&self, all_items: Vec<WorkItem>) -> Vec<WorkItem> {
        let total = all_items.len();
        let remaining: Vec<WorkItem> = all_items
            .into_iter()
            .filter(|item| !self.done_item_ids.contains(&item.id))
            .collect();

        if remaining.len() < total {
            tracing::info!(
                "Skipping {} of {} already done as listed in {}",
                total - remaining.len(),
                total,
                DONE_ITEMS_FILE
            );
        }
        remaining
    }

    /// Durably record an item as fully migrated
    pub fn mark_item_done(&mut self, item_id: &str, upload_token: &str) -> MigrationResult<()> {
        let line = format!("{} {}\n", item_id, upload_token);
        append_record(&mut self.done_items_log, &self.done_items_path, &line)?;
        self.done_item_ids.insert(item_id.to_string());
        Ok(())
    }

    /// Whether the album cache has been initialized this run
    pub fn albums_loaded(&self) -> bool {
        self.albums.is_some()
    }

    /// Initialize the album cache by replaying the album log
    ///
    /// Returns [`AlbumLogState::Missing`] without touching storage when no log
    /// exists; the caller then lists the destination and calls
    /// [`seed_album_log`](Self::seed_album_log). Calling this again after
    /// initialization reports the current cache size.
    pub fn open_album_log(&mut self) -> MigrationResult<AlbumLogState> {
        if let Some(cache) = &self.albums {
            return Ok(AlbumLogState::Replayed(cache.by_title.len()));
        }

        let path = self.state_dir.join(DONE_ALBUMS_FILE);
        if !path.is_file() {
            return Ok(AlbumLogState::Missing);
        }

        let by_title = read_album_log(&path);
        let log = open_append(&path)?;
        let replayed = by_title.len();
        self.albums = Some(AlbumCache { by_title, log, path });

        tracing::info!("Read {} albums from {}", replayed, DONE_ALBUMS_FILE);
        Ok(AlbumLogState::Replayed(replayed))
    }

    /// Create the album log from the destination's complete album listing
    ///
    /// Albums with an empty title are ignored. When several albums share a
    /// title, the first one listed wins and the rest are never used. The log
    /// is written to a side file and renamed into place, so it never exists
    /// in a partially seeded state. Returns the number of albums recorded.
    pub fn seed_album_log(
        &mut self,
        existing: impl IntoIterator<Item = RemoteAlbum>,
    ) -> MigrationResult<usize> {
        let path = self.state_dir.join(DONE_ALBUMS_FILE);
        let seeding_path = self.state_dir.join(format!("{}{}", DONE_ALBUMS_FILE, SEEDING_SUFFIX));
        let ledger_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| MigrationError::Ledger { path, source }
        };

        let mut by_title = HashMap::new();
        let mut records = String::new();
        for album in existing {
            if album.title.is_empty() {
                continue;
            }
            if by_title.contains_key(&album.title) {
                tracing::debug!("Duplicate existing album title: '{}'", album.title);
                continue;
            }
            tracing::debug!("Found existing album: '{}'", album.title);
            records.push_str(&album_record(&album.title, &album)?);
            by_title.insert(album.title.clone(), album);
        }

        let mut seeding = File::create(&seeding_path).map_err(ledger_err(&seeding_path))?;
        append_record(&mut seeding, &seeding_path, &records)?;
        drop(seeding);
        std::fs::rename(&seeding_path, &path).map_err(ledger_err(&path))?;

        let log = open_append(&path)?;
        let seeded = by_title.len();
        self.albums = Some(AlbumCache { by_title, log, path });
        Ok(seeded)
    }

    /// Previously resolved remote album for a title
    pub fn resolved_album(&self, title: &str) -> Option<&RemoteAlbum> {
        self.albums.as_ref()?.by_title.get(title)
    }

    pub fn resolved_album_count(&self) -> usize {
        self.albums.as_ref().map(|c| c.by_title.len()).unwrap_or(0)
    }

    /// Durably record a resolved remote album
    ///
    /// Without an album log, one is started empty.
    pub fn record_resolved_album(&mut self, title: &str, album: RemoteAlbum) -> MigrationResult<()> {
        if let AlbumLogState::Missing = self.open_album_log()? {
            self.seed_album_log(Vec::new())?;
        }
        let Some(cache) = self.albums.as_mut() else {
            return Err(MigrationError::Common(flkr_common::Error::Internal(
                "album cache not initialized".to_string(),
            )));
        };

        let record = album_record(title, &album)?;
        append_record(&mut cache.log, &cache.path, &record)?;
        cache.by_title.insert(title.to_string(), album);
        Ok(())
    }
}

/// Completed ids from the item log
///
/// Each record is `<itemId> <uploadToken>`; a line without a token is the
/// remains of an interrupted write and does not count.
fn read_done_ids(path: &Path) -> HashSet<String> {
    let content = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashSet::new(),
        Err(e) => {
            tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
            return HashSet::new();
        }
    };

    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(id), Some(_token)) => Some(id.to_string()),
                (Some(id), None) => {
                    tracing::warn!(id, "Ignoring incomplete record in {}", path.display());
                    None
                }
                _ => None,
            }
        })
        .collect()
}

fn read_album_log(path: &Path) -> HashMap<String, RemoteAlbum> {
    let content = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let mut by_title = HashMap::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<(String, RemoteAlbum)>(line) {
            Ok((title, album)) => {
                by_title.insert(title, album);
            }
            Err(e) => {
                tracing::warn!(
                    line = index + 1,
                    error = %e,
                    "Ignoring malformed record in {}",
                    path.display()
                );
            }
        }
    }
    by_title
}

/// Open a log for appending, terminating any torn last line
fn open_append(path: &Path) -> MigrationResult<File> {
    let ledger_err = |source| MigrationError::Ledger {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(ledger_err)?;

    let len = file.metadata().map_err(ledger_err)?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1)).map_err(ledger_err)?;
        file.read_exact(&mut last).map_err(ledger_err)?;
        if last[0] != b'\n' {
            append_record(&mut file, path, "\n")?;
        }
    }
    Ok(file)
}

/// One album log line: `[title, album]` JSON, newline-terminated
fn album_record(title: &str, album: &RemoteAlbum) -> MigrationResult<String> {
    let record = serde_json::to_string(&(title, album)).map_err(|e| MigrationError::Common(e.into()))?;
    Ok(format!("{}\n", record))
}

fn append_record(file: &mut File, path: &Path, record: &str) -> MigrationResult<()> {
    file.write_all(record.as_bytes())
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_data())
        .map_err(|source| MigrationError::Ledger {
            path: path.to_path_buf(),
            source,
        })
}
