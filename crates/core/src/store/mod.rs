//! Persisted metadata store - the relational side of the ingest engine.
//!
//! The store is modeled as an injectable capability so the buffering, dedupe,
//! and flush logic can run against an in-memory fake, decoupled from a real
//! database.

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::*;

/// Capability trait for the persisted torrent-metadata store.
///
/// All calls are blocking and assume a single logical writer over one shared
/// connection; implementations do no locking, pooling, or timeouts of their
/// own.
pub trait MetadataStore {
    /// Insert one torrent row in its own transaction.
    ///
    /// A uniqueness violation on info-hash maps to [`StoreError::Conflict`];
    /// any failure rolls back just this insert.
    fn insert_torrent(&mut self, torrent: &TorrentRecord) -> Result<(), StoreError>;

    /// Insert a batch of file rows in one all-or-nothing transaction.
    ///
    /// Each row resolves its owning torrent's internal id by info-hash; an
    /// unresolvable owner fails, and rolls back, the whole batch.
    fn insert_files(&mut self, files: &[FileRecord]) -> Result<(), StoreError>;

    /// Whether a torrent with this info-hash is already persisted.
    fn exists(&mut self, info_hash: &InfoHash) -> Result<bool, StoreError>;

    /// Refresh the "last active" marker on a known torrent, committed
    /// immediately and independently of any buffered flush.
    fn update_freshness(&mut self, info_hash: &InfoHash) -> Result<(), StoreError>;

    /// Current row counts.
    fn stats(&mut self) -> Result<StoreStats, StoreError>;
}
