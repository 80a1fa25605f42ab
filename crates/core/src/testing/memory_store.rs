//! In-memory metadata store for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::store::{
    FileRecord, InfoHash, MetadataStore, StoreError, StoreStats, TorrentRecord,
};

/// A torrent row as held by the in-memory store.
#[derive(Debug, Clone)]
pub struct StoredTorrent {
    pub record: TorrentRecord,
    /// Epoch seconds of the last freshness refresh.
    pub actived_at: i64,
    /// How many times the freshness marker was refreshed.
    pub refresh_count: u32,
}

#[derive(Debug, Default)]
struct Inner {
    torrents: HashMap<InfoHash, StoredTorrent>,
    files: Vec<FileRecord>,
    fail_next_torrent: Option<String>,
    fail_file_batch: Option<String>,
}

/// Mock implementation of [`MetadataStore`].
///
/// Clones share state, so a test can keep a handle while the sink owns
/// another. Conflicts arise naturally when an info-hash is already present;
/// other store faults are injected with the `fail_*` knobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a torrent row, as if a concurrent writer had raced it in.
    pub fn seed_torrent(&self, record: TorrentRecord) {
        let mut inner = self.inner.lock().unwrap();
        let info_hash = record.info_hash;
        inner.torrents.insert(
            info_hash,
            StoredTorrent {
                record,
                actived_at: Utc::now().timestamp(),
                refresh_count: 0,
            },
        );
    }

    /// Make the next `insert_torrent` fail with a non-conflict store error.
    pub fn fail_next_torrent(&self, message: &str) {
        self.inner.lock().unwrap().fail_next_torrent = Some(message.to_string());
    }

    /// Make the next `insert_files` batch fail (simulated rollback).
    pub fn fail_file_batch(&self, message: &str) {
        self.inner.lock().unwrap().fail_file_batch = Some(message.to_string());
    }

    pub fn torrent(&self, info_hash: &InfoHash) -> Option<StoredTorrent> {
        self.inner.lock().unwrap().torrents.get(info_hash).cloned()
    }

    pub fn files_for(&self, info_hash: &InfoHash) -> Vec<FileRecord> {
        self.inner
            .lock()
            .unwrap()
            .files
            .iter()
            .filter(|f| f.info_hash == *info_hash)
            .cloned()
            .collect()
    }

    pub fn torrent_count(&self) -> usize {
        self.inner.lock().unwrap().torrents.len()
    }

    pub fn file_count(&self) -> usize {
        self.inner.lock().unwrap().files.len()
    }
}

impl MetadataStore for MemoryStore {
    fn insert_torrent(&mut self, torrent: &TorrentRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.fail_next_torrent.take() {
            return Err(StoreError::Database(message));
        }
        if inner.torrents.contains_key(&torrent.info_hash) {
            return Err(StoreError::Conflict(torrent.info_hash));
        }
        inner.torrents.insert(
            torrent.info_hash,
            StoredTorrent {
                record: torrent.clone(),
                actived_at: Utc::now().timestamp(),
                refresh_count: 0,
            },
        );
        Ok(())
    }

    fn insert_files(&mut self, files: &[FileRecord]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.fail_file_batch.take() {
            return Err(StoreError::Database(message));
        }
        // All-or-nothing: verify every owner resolves before attaching anything
        for file in files {
            if !inner.torrents.contains_key(&file.info_hash) {
                return Err(StoreError::Database(format!(
                    "no torrent row for {}",
                    file.info_hash
                )));
            }
        }
        inner.files.extend_from_slice(files);
        Ok(())
    }

    fn exists(&mut self, info_hash: &InfoHash) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().torrents.contains_key(info_hash))
    }

    fn update_freshness(&mut self, info_hash: &InfoHash) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.torrents.get_mut(info_hash) {
            Some(row) => {
                // Non-decreasing, even within the same second
                row.actived_at = row.actived_at.max(Utc::now().timestamp());
                row.refresh_count += 1;
                Ok(())
            }
            None => Err(StoreError::Database(format!(
                "no torrent row for {info_hash}"
            ))),
        }
    }

    fn stats(&mut self) -> Result<StoreStats, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(StoreStats {
            torrents: inner.torrents.len() as u64,
            files: inner.files.len() as u64,
        })
    }
}
