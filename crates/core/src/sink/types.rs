//! Outcome and error types for the metadata sink.

use serde::Serialize;
use thiserror::Error;

use crate::store::InfoHash;

/// Why a metadata blob was rejected during ingest.
///
/// These never cross the `ingest` boundary; they exist for logging and so the
/// validation rules can be exercised directly in tests.
#[derive(Debug, Error, PartialEq)]
pub enum MetadataError {
    #[error("failed to decode metadata: {0}")]
    Decode(String),

    #[error("missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("key `{0}` has the wrong type")]
    WrongType(&'static str),

    #[error("text field is not valid UTF-8")]
    InvalidUtf8,

    #[error("path component contains a separator: `{0}`")]
    IllegalPath(String),

    #[error("declared file length is negative")]
    NegativeLength,

    #[error("declared file lengths overflow the total size")]
    SizeOverflow,

    #[error("torrent declares no files")]
    EmptyTorrent,
}

/// Outcome of one pending torrent's insert attempt during a flush.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CommitStatus {
    /// The torrent row was inserted and committed.
    Committed,
    /// The torrent row was skipped; its files were dropped from the batch.
    Skipped(SkipReason),
}

/// Why a pending torrent was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    /// A concurrent writer raced this info-hash into the store.
    Conflict,
    /// Any other store fault; the single-record transaction rolled back.
    Store(String),
}

/// Per-torrent outcome of a flush, in buffer order.
#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub info_hash: InfoHash,
    pub status: CommitStatus,
}

/// Summary of one flush.
///
/// Once a report is returned, everything it covers has left the buffer -
/// there is no retry queue, successful or not (at-most-once delivery).
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlushReport {
    /// One outcome per pending torrent.
    pub outcomes: Vec<CommitOutcome>,
    /// Files committed by the all-or-nothing batch.
    pub files_committed: usize,
    /// Files dropped up front because their owning torrent was skipped.
    pub files_dropped: usize,
    /// Files lost to a file-batch rollback.
    pub files_failed: usize,
}

impl FlushReport {
    /// Torrents committed by this flush.
    pub fn committed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == CommitStatus::Committed)
            .count()
    }

    /// Torrents skipped by this flush.
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.committed()
    }
}
