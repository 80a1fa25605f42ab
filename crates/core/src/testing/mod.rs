//! Testing utilities and mock implementations.
//!
//! [`MemoryStore`] stands in for the SQLite store so the buffering, dedupe,
//! and flush logic can be exercised without a database, including injected
//! store faults. `fixtures` builds the bencoded blobs the ingest path
//! consumes.

mod memory_store;

pub use memory_store::{MemoryStore, StoredTorrent};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::store::InfoHash;

    /// Deterministic info-hash for tests.
    pub fn info_hash(seed: u8) -> InfoHash {
        InfoHash::new([seed; 20])
    }

    /// Bencoded single-file metadata blob: `{"length": ..., "name": ...}`.
    pub fn single_file(name: &str, length: u64) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("d6:lengthi{length}e").as_bytes());
        out.extend_from_slice(format!("4:name{}:{name}", name.len()).as_bytes());
        out.push(b'e');
        out
    }

    /// Bencoded multi-file metadata blob; each file is (length, path components).
    pub fn multi_file(name: &str, files: &[(u64, &[&str])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"d5:filesl");
        for (length, components) in files {
            out.extend_from_slice(format!("d6:lengthi{length}e4:pathl").as_bytes());
            for component in *components {
                out.extend_from_slice(format!("{}:{component}", component.len()).as_bytes());
            }
            out.extend_from_slice(b"ee");
        }
        out.extend_from_slice(format!("e4:name{}:{name}e", name.len()).as_bytes());
        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_single_file_encoding() {
            assert_eq!(
                single_file("movie.mkv", 1000),
                b"d6:lengthi1000e4:name9:movie.mkve"
            );
        }

        #[test]
        fn test_multi_file_encoding() {
            assert_eq!(
                multi_file("X", &[(5, &["dir", "a.mp3"])]),
                b"d5:filesld6:lengthi5e4:pathl3:dir5:a.mp3eee4:name1:Xe"
            );
        }
    }
}
