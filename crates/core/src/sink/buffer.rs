//! In-memory buffer of records awaiting the next flush.

use crate::store::{FileRecord, InfoHash, TorrentRecord};

/// Pending torrent and file records, in ingest order.
///
/// The buffer performs no deduplication of its own; `is_new` is expected to
/// run before metadata is fetched and ingested. Not safe for concurrent
/// mutation - the engine assumes a single logical writer.
#[derive(Debug)]
pub(crate) struct Buffer {
    torrents: Vec<TorrentRecord>,
    files: Vec<FileRecord>,
    flush_threshold: usize,
}

impl Buffer {
    pub(crate) fn new(flush_threshold: usize) -> Self {
        Self {
            torrents: Vec::new(),
            files: Vec::new(),
            flush_threshold,
        }
    }

    /// Append one torrent and all of its files.
    pub(crate) fn push(&mut self, torrent: TorrentRecord, files: Vec<FileRecord>) {
        self.torrents.push(torrent);
        self.files.extend(files);
    }

    pub(crate) fn contains(&self, info_hash: &InfoHash) -> bool {
        self.torrents.iter().any(|t| t.info_hash == *info_hash)
    }

    pub(crate) fn pending_torrents(&self) -> usize {
        self.torrents.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.torrents.is_empty()
    }

    /// Whether the configured flush threshold has been reached.
    pub(crate) fn at_threshold(&self) -> bool {
        self.torrents.len() >= self.flush_threshold
    }

    /// Take everything out, leaving the buffer empty.
    pub(crate) fn drain(&mut self) -> (Vec<TorrentRecord>, Vec<FileRecord>) {
        (
            std::mem::take(&mut self.torrents),
            std::mem::take(&mut self.files),
        )
    }
}
