//! Buffered ingest of crawled torrent metadata.
//!
//! The sink sits between the crawling pipeline and the persisted store:
//! `is_new` gates metadata fetches, `ingest` validates and buffers decoded
//! blobs, and the commit engine flushes the buffer in batches once the
//! configured threshold is reached (or at shutdown, via `close`).

mod buffer;
mod flush;
mod parser;
mod types;

pub use parser::{parse_metadata, ParsedMetadata};
pub use types::{CommitOutcome, CommitStatus, FlushReport, MetadataError, SkipReason};

use tracing::{debug, info, warn};

use buffer::Buffer;
use crate::store::{InfoHash, MetadataStore};

/// Buffering, deduplicating front-end to a [`MetadataStore`].
///
/// One instance owns its store handle and both pending buffers; construct one
/// per pipeline and serialize access externally - nothing in here is safe for
/// concurrent mutation, and flushes run inline in whichever call triggers
/// them. None of the public operations ever propagate an error; outcomes are
/// communicated through return values and log entries.
pub struct MetadataSink<S: MetadataStore> {
    store: S,
    buffer: Buffer,
}

impl<S: MetadataStore> MetadataSink<S> {
    /// Create a sink that flushes automatically once `flush_threshold`
    /// torrents are pending.
    pub fn new(store: S, flush_threshold: usize) -> Self {
        Self {
            store,
            buffer: Buffer::new(flush_threshold),
        }
    }

    /// Whether this info-hash is worth fetching metadata for.
    ///
    /// Consults the pending buffer first, then the store. A torrent the store
    /// already knows gets its freshness marker refreshed as a side effect, so
    /// downstream ranking sees the swarm is still alive without the metadata
    /// being re-ingested. A store fault is logged and treated as "new": the
    /// worst case is a redundant fetch later rejected by the uniqueness
    /// constraint.
    pub fn is_new(&mut self, info_hash: &InfoHash) -> bool {
        if self.buffer.contains(info_hash) {
            return false;
        }

        match self.store.exists(info_hash) {
            Ok(true) => {
                if let Err(e) = self.store.update_freshness(info_hash) {
                    warn!(info_hash = %info_hash, error = %e, "could not refresh known torrent");
                }
                false
            }
            Ok(false) => true,
            Err(e) => {
                warn!(info_hash = %info_hash, error = %e, "existence check failed, assuming new");
                true
            }
        }
    }

    /// Validate a raw metadata blob and append it to the pending buffer.
    ///
    /// Returns `false`, with the buffer untouched, on any decode or
    /// validation failure. On success the torrent and its files are buffered
    /// atomically and, if that crossed the flush threshold, a flush runs
    /// synchronously before this call returns `true`.
    pub fn ingest(&mut self, info_hash: InfoHash, metadata: &[u8]) -> bool {
        let parsed = match parse_metadata(info_hash, metadata) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(info_hash = %info_hash, error = %e, "rejected metadata");
                return false;
            }
        };

        info!(info_hash = %info_hash, name = %parsed.torrent.name, "added torrent");
        self.buffer.push(parsed.torrent, parsed.files);

        if self.buffer.at_threshold() {
            self.flush();
        }

        true
    }

    /// Persist everything currently buffered.
    ///
    /// At-most-once delivery: all pending records leave the buffer whether or
    /// not their commit succeeded. The report says which went where.
    pub fn flush(&mut self) -> FlushReport {
        let (torrents, files) = self.buffer.drain();
        flush::commit(&mut self.store, torrents, files)
    }

    /// Number of torrents awaiting the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.pending_torrents()
    }

    /// Flush any outstanding records, then release the store handle.
    ///
    /// Best effort: records can still be lost under the commit engine's
    /// failure policy, but an orderly shutdown always gets exactly one final
    /// flush.
    pub fn close(mut self) -> Option<FlushReport> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.flush())
    }
}
