//! Buffered ingest and batched persistence for DHT-crawled torrent metadata.
//!
//! An external crawler discovers info-hashes and fetches raw bencoded
//! metadata blobs; this crate validates the blobs, deduplicates them against
//! a pending in-memory buffer and the persisted store, and commits them to
//! SQLite in batches for throughput:
//!
//! ```text
//! crawler -> is_new? -> fetch -> ingest -> buffer -> threshold -> flush -> store
//! ```
//!
//! [`MetadataSink`] is the entry point; it owns the store handle and both
//! pending buffers, and guarantees a final flush on [`MetadataSink::close`].

pub mod config;
pub mod sink;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    IngestConfig,
};
pub use sink::{
    CommitOutcome, CommitStatus, FlushReport, MetadataError, MetadataSink, SkipReason,
};
pub use store::{
    FileRecord, InfoHash, MetadataStore, SqliteStore, StoreError, StoreStats, TorrentRecord,
};
