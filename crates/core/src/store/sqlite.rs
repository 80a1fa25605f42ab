//! SQLite-backed metadata store implementation.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{FileRecord, InfoHash, MetadataStore, StoreError, StoreStats, TorrentRecord};

/// SQLite-backed metadata store.
///
/// Holds a single connection; no locking or pooling. Callers serialize
/// access themselves.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and initialize the schema.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            -- Torrent metadata (one row per unique info_hash)
            CREATE TABLE IF NOT EXISTS torrents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                info_hash TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                total_size INTEGER NOT NULL DEFAULT 0,
                discovered_on INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                actived_at TEXT NOT NULL,
                visited_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_torrents_info_hash ON torrents(info_hash);

            -- Files within each torrent
            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                torrent_id INTEGER NOT NULL REFERENCES torrents(id),
                size INTEGER NOT NULL,
                path TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_files_torrent_id ON files(torrent_id);
            "#,
        )
        .map_err(db_err)
    }
}

impl MetadataStore for SqliteStore {
    fn insert_torrent(&mut self, torrent: &TorrentRecord) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(db_err)?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT INTO torrents
                 (info_hash, name, total_size, discovered_on,
                  created_at, updated_at, actived_at, visited_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                torrent.info_hash.to_string(),
                torrent.name,
                torrent.total_size as i64,
                torrent.discovered_on,
                now,
                now,
                now,
                now,
            ],
        )
        .map_err(|e| insert_err(&torrent.info_hash, e))?;

        tx.commit().map_err(db_err)
    }

    fn insert_files(&mut self, files: &[FileRecord]) -> Result<(), StoreError> {
        if files.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on any error rolls back the whole batch;
        // an owner the sub-select cannot resolve fails the NOT NULL check.
        let tx = self.conn.transaction().map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO files (torrent_id, size, path)
                     VALUES ((SELECT id FROM torrents WHERE info_hash = ?), ?, ?)",
                )
                .map_err(db_err)?;

            for file in files {
                stmt.execute(params![
                    file.info_hash.to_string(),
                    file.size as i64,
                    file.path
                ])
                .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)
    }

    fn exists(&mut self, info_hash: &InfoHash) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM torrents WHERE info_hash = ?",
                params![info_hash.to_string()],
                |_| Ok(()),
            )
            .optional()
            .map_err(db_err)?;

        Ok(found.is_some())
    }

    fn update_freshness(&mut self, info_hash: &InfoHash) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();

        // Autocommit: this lands independently of any buffered flush.
        self.conn
            .execute(
                "UPDATE torrents SET actived_at = ?, updated_at = ? WHERE info_hash = ?",
                params![now, now, info_hash.to_string()],
            )
            .map_err(db_err)?;

        Ok(())
    }

    fn stats(&mut self) -> Result<StoreStats, StoreError> {
        let torrents: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM torrents", [], |row| row.get(0))
            .map_err(db_err)?;

        let files: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .map_err(db_err)?;

        Ok(StoreStats { torrents, files })
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn insert_err(info_hash: &InfoHash, e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict(*info_hash)
        }
        _ => StoreError::Database(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(seed: u8) -> InfoHash {
        InfoHash::new([seed; 20])
    }

    fn torrent(seed: u8, name: &str, total_size: u64) -> TorrentRecord {
        TorrentRecord {
            info_hash: hash(seed),
            name: name.to_string(),
            total_size,
            discovered_on: 1_700_000_000,
        }
    }

    fn file(seed: u8, size: u64, path: &str) -> FileRecord {
        FileRecord {
            info_hash: hash(seed),
            size,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_insert_and_exists() {
        let mut store = SqliteStore::in_memory().unwrap();

        assert!(!store.exists(&hash(1)).unwrap());
        store.insert_torrent(&torrent(1, "Album", 1000)).unwrap();
        assert!(store.exists(&hash(1)).unwrap());
        assert!(!store.exists(&hash(2)).unwrap());
    }

    #[test]
    fn test_duplicate_insert_is_conflict() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert_torrent(&torrent(1, "Album", 1000)).unwrap();

        let result = store.insert_torrent(&torrent(1, "Album again", 1000));
        assert!(matches!(result, Err(StoreError::Conflict(h)) if h == hash(1)));

        // The original row is untouched
        assert_eq!(store.stats().unwrap().torrents, 1);
    }

    #[test]
    fn test_insert_files_resolves_owner() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert_torrent(&torrent(1, "Album", 300)).unwrap();

        store
            .insert_files(&[file(1, 100, "Album/a.mp3"), file(1, 200, "Album/b.mp3")])
            .unwrap();

        let owner_id: i64 = store
            .conn
            .query_row(
                "SELECT id FROM torrents WHERE info_hash = ?",
                params![hash(1).to_string()],
                |row| row.get(0),
            )
            .unwrap();
        let attached: u64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM files WHERE torrent_id = ?",
                params![owner_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(attached, 2);
    }

    #[test]
    fn test_file_batch_with_unknown_owner_rolls_back() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert_torrent(&torrent(1, "Album", 100)).unwrap();

        let result = store.insert_files(&[
            file(1, 100, "Album/a.mp3"),
            file(9, 50, "orphan.mp3"), // no torrent row for this hash
        ]);
        assert!(matches!(result, Err(StoreError::Database(_))));

        // All-or-nothing: the resolvable file must not have landed either
        assert_eq!(store.stats().unwrap().files, 0);
    }

    #[test]
    fn test_empty_file_batch_is_noop() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert_files(&[]).unwrap();
        assert_eq!(store.stats().unwrap().files, 0);
    }

    #[test]
    fn test_update_freshness_is_non_decreasing() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert_torrent(&torrent(1, "Album", 100)).unwrap();

        let actived_at = |store: &SqliteStore| -> String {
            store
                .conn
                .query_row(
                    "SELECT actived_at FROM torrents WHERE info_hash = ?",
                    params![hash(1).to_string()],
                    |row| row.get(0),
                )
                .unwrap()
        };

        let first = actived_at(&store);
        store.update_freshness(&hash(1)).unwrap();
        let second = actived_at(&store);
        store.update_freshness(&hash(1)).unwrap();
        let third = actived_at(&store);

        // RFC 3339 UTC strings order chronologically
        assert!(second >= first);
        assert!(third >= second);
    }

    #[test]
    fn test_stats_counts_rows() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert_torrent(&torrent(1, "A", 10)).unwrap();
        store.insert_torrent(&torrent(2, "B", 20)).unwrap();
        store.insert_files(&[file(1, 10, "a"), file(2, 20, "b")]).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats, StoreStats { torrents: 2, files: 2 });
    }

    #[test]
    fn test_on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftnet.db");

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store.insert_torrent(&torrent(1, "Album", 100)).unwrap();
            store.insert_files(&[file(1, 100, "Album/a.mp3")]).unwrap();
        }

        let mut store = SqliteStore::new(&path).unwrap();
        assert!(store.exists(&hash(1)).unwrap());
        assert_eq!(store.stats().unwrap(), StoreStats { torrents: 1, files: 1 });
    }
}
