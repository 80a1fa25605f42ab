//! Validation of raw bencoded metadata blobs into torrent and file records.
//!
//! The blob is the BEP 9 "info" dictionary: a `name`, then either a `files`
//! list (multi-file form) or a top-level `length` (single-file form). Any
//! decode failure, missing key, type mismatch, bad UTF-8, or illegal path
//! component rejects the whole blob; nothing is ever partially accepted.

use std::collections::HashMap;

use chrono::Utc;
use serde_bencode::value::Value;

use super::MetadataError;
use crate::store::{FileRecord, InfoHash, TorrentRecord};

/// A fully validated metadata blob, ready for the pending buffer.
#[derive(Debug, Clone)]
pub struct ParsedMetadata {
    pub torrent: TorrentRecord,
    pub files: Vec<FileRecord>,
}

/// Parse and validate one raw metadata blob.
///
/// `discovered_on` is captured once, up front, so it reflects the moment the
/// blob arrived rather than how long validation took.
pub fn parse_metadata(
    info_hash: InfoHash,
    metadata: &[u8],
) -> Result<ParsedMetadata, MetadataError> {
    let discovered_on = Utc::now().timestamp();

    let decoded: Value =
        serde_bencode::from_bytes(metadata).map_err(|e| MetadataError::Decode(e.to_string()))?;
    let info = as_dict(&decoded).ok_or(MetadataError::WrongType("info"))?;

    let name = text(lookup(info, "name")?, "name")?;
    if name.contains('/') {
        return Err(MetadataError::IllegalPath(name.to_string()));
    }

    let mut files = Vec::new();
    match info.get(b"files".as_slice()) {
        // Multi-file form: one entry per file, path as a list of components.
        Some(Value::List(entries)) => {
            for entry in entries {
                let entry = as_dict(entry).ok_or(MetadataError::WrongType("files"))?;
                let size = length(lookup(entry, "length")?, "length")?;
                let components = match lookup(entry, "path")? {
                    Value::List(components) => components,
                    _ => return Err(MetadataError::WrongType("path")),
                };
                if components.is_empty() {
                    return Err(MetadataError::WrongType("path"));
                }
                let parts = components
                    .iter()
                    .map(component)
                    .collect::<Result<Vec<_>, _>>()?;
                files.push(FileRecord {
                    info_hash,
                    size,
                    path: parts.join("/"),
                });
            }
        }
        Some(_) => return Err(MetadataError::WrongType("files")),
        // Single-file form: the torrent is its one file, named after itself.
        None => {
            let size = length(lookup(info, "length")?, "length")?;
            files.push(FileRecord {
                info_hash,
                size,
                path: name.to_string(),
            });
        }
    }

    if files.is_empty() {
        return Err(MetadataError::EmptyTorrent);
    }

    // Each length fits in a u64, but their sum may not.
    let total_size = files
        .iter()
        .try_fold(0u64, |acc, f| acc.checked_add(f.size))
        .ok_or(MetadataError::SizeOverflow)?;
    Ok(ParsedMetadata {
        torrent: TorrentRecord {
            info_hash,
            name: name.to_string(),
            total_size,
            discovered_on,
        },
        files,
    })
}

fn as_dict(value: &Value) -> Option<&HashMap<Vec<u8>, Value>> {
    match value {
        Value::Dict(dict) => Some(dict),
        _ => None,
    }
}

fn lookup<'a>(
    dict: &'a HashMap<Vec<u8>, Value>,
    key: &'static str,
) -> Result<&'a Value, MetadataError> {
    dict.get(key.as_bytes()).ok_or(MetadataError::MissingKey(key))
}

fn text<'a>(value: &'a Value, key: &'static str) -> Result<&'a str, MetadataError> {
    match value {
        Value::Bytes(bytes) => std::str::from_utf8(bytes).map_err(|_| MetadataError::InvalidUtf8),
        _ => Err(MetadataError::WrongType(key)),
    }
}

fn length(value: &Value, key: &'static str) -> Result<u64, MetadataError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n as u64),
        Value::Int(_) => Err(MetadataError::NegativeLength),
        _ => Err(MetadataError::WrongType(key)),
    }
}

fn component(value: &Value) -> Result<&str, MetadataError> {
    let part = text(value, "path")?;
    if part.contains('/') {
        return Err(MetadataError::IllegalPath(part.to_string()));
    }
    Ok(part)
}
