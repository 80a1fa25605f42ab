//! Record and error types for the persisted metadata store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 20-byte torrent info-hash.
///
/// The canonical textual form is the lowercase hex string; that is also how
/// the store persists it and how it appears in logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for InfoHash {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self)
    }
}

impl FromStr for InfoHash {
    type Err = ParseInfoHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseInfoHashError::BadHex(e.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ParseInfoHashError::BadLength(b.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for InfoHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for InfoHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors from parsing the hex form of an info-hash.
#[derive(Debug, Error, PartialEq)]
pub enum ParseInfoHashError {
    #[error("info-hash must be 20 bytes, got {0}")]
    BadLength(usize),

    #[error("info-hash is not valid hex: {0}")]
    BadHex(String),
}

/// A torrent awaiting (or after) persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Info-hash of the torrent's metadata.
    pub info_hash: InfoHash,
    /// Torrent name; never contains a path separator.
    pub name: String,
    /// Total size in bytes, exactly the sum of the owning files' sizes.
    pub total_size: u64,
    /// Epoch seconds at the moment the metadata was ingested.
    pub discovered_on: i64,
}

/// A file within a torrent, referencing its owner by info-hash value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Info-hash of the owning torrent.
    pub info_hash: InfoHash,
    /// File size in bytes.
    pub size: u64,
    /// "/"-joined path components; no component contains "/".
    pub path: String,
}

/// Row counts, for reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Persisted torrent rows.
    pub torrents: u64,
    /// Persisted file rows.
    pub files: u64,
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Uniqueness violation on info-hash; a concurrent writer got there first.
    #[error("info_hash already stored: {0}")]
    Conflict(InfoHash),

    /// Any other transport or query fault.
    #[error("database error: {0}")]
    Database(String),
}
