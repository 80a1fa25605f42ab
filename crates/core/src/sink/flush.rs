//! The commit engine: batched, partial-failure-tolerant writes to the store.

use std::collections::HashSet;

use tracing::{error, info, warn};

use super::{CommitOutcome, CommitStatus, FlushReport, SkipReason};
use crate::store::{FileRecord, InfoHash, MetadataStore, StoreError, TorrentRecord};

/// Attempt to persist one drained batch of pending records.
///
/// Torrent inserts are isolated: a conflict or store fault is logged with the
/// offending info-hash and skipped without aborting the rest. The file batch
/// is all-or-nothing, so files are pre-filtered to owners this call actually
/// committed - a skipped torrent either already has its files or never got a
/// row at all. Never returns an error; the report is the whole story.
pub(crate) fn commit<S: MetadataStore>(
    store: &mut S,
    torrents: Vec<TorrentRecord>,
    files: Vec<FileRecord>,
) -> FlushReport {
    let mut report = FlushReport::default();
    if torrents.is_empty() && files.is_empty() {
        return report;
    }

    let mut committed: HashSet<InfoHash> = HashSet::with_capacity(torrents.len());
    for torrent in &torrents {
        let status = match store.insert_torrent(torrent) {
            Ok(()) => {
                committed.insert(torrent.info_hash);
                CommitStatus::Committed
            }
            Err(StoreError::Conflict(_)) => {
                warn!(info_hash = %torrent.info_hash, "already stored, skipping torrent");
                CommitStatus::Skipped(SkipReason::Conflict)
            }
            Err(e) => {
                warn!(info_hash = %torrent.info_hash, error = %e, "could not commit torrent");
                CommitStatus::Skipped(SkipReason::Store(e.to_string()))
            }
        };
        report.outcomes.push(CommitOutcome {
            info_hash: torrent.info_hash,
            status,
        });
    }

    let total = files.len();
    let batch: Vec<FileRecord> = files
        .into_iter()
        .filter(|f| committed.contains(&f.info_hash))
        .collect();
    report.files_dropped = total - batch.len();

    if !batch.is_empty() {
        match store.insert_files(&batch) {
            Ok(()) => report.files_committed = batch.len(),
            Err(e) => {
                report.files_failed = batch.len();
                error!(error = %e, files = batch.len(), "file batch rolled back");
            }
        }
    }

    info!(
        torrents = report.committed(),
        files = report.files_committed,
        skipped = report.skipped(),
        "flush finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::info_hash;
    use crate::testing::MemoryStore;

    fn torrent(seed: u8) -> TorrentRecord {
        TorrentRecord {
            info_hash: info_hash(seed),
            name: format!("torrent-{seed}"),
            total_size: 100,
            discovered_on: 1_700_000_000,
        }
    }

    fn file(seed: u8, path: &str) -> FileRecord {
        FileRecord {
            info_hash: info_hash(seed),
            size: 100,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_clean_batch_commits_everything() {
        let mut store = MemoryStore::new();

        let report = commit(
            &mut store,
            vec![torrent(1), torrent(2)],
            vec![file(1, "a"), file(2, "b"), file(2, "c")],
        );

        assert_eq!(report.committed(), 2);
        assert_eq!(report.skipped(), 0);
        assert_eq!(report.files_committed, 3);
        assert_eq!(report.files_dropped, 0);
        assert_eq!(store.torrent_count(), 2);
        assert_eq!(store.file_count(), 3);
    }

    #[test]
    fn test_conflict_skips_one_torrent_and_drops_its_files() {
        let store = MemoryStore::new();
        // A concurrent writer already raced torrent 1 into the store.
        store.seed_torrent(torrent(1));
        let mut handle = store.clone();

        let report = commit(
            &mut handle,
            vec![torrent(1), torrent(2)],
            vec![file(1, "a"), file(2, "b")],
        );

        assert_eq!(report.outcomes[0].status, CommitStatus::Skipped(SkipReason::Conflict));
        assert_eq!(report.outcomes[1].status, CommitStatus::Committed);
        assert_eq!(report.files_committed, 1);
        assert_eq!(report.files_dropped, 1);

        // Torrent 2's files still landed
        assert_eq!(store.files_for(&info_hash(2)).len(), 1);
        assert!(store.files_for(&info_hash(1)).is_empty());
    }

    #[test]
    fn test_store_fault_skips_record_without_aborting_batch() {
        let store = MemoryStore::new();
        store.fail_next_torrent("disk on fire");
        let mut handle = store.clone();

        let report = commit(
            &mut handle,
            vec![torrent(1), torrent(2)],
            vec![file(1, "a"), file(2, "b")],
        );

        assert_eq!(
            report.outcomes[0].status,
            CommitStatus::Skipped(SkipReason::Store("database error: disk on fire".to_string()))
        );
        assert_eq!(report.outcomes[1].status, CommitStatus::Committed);
        assert_eq!(report.files_committed, 1);
        assert_eq!(report.files_dropped, 1);
    }

    #[test]
    fn test_file_batch_failure_keeps_torrent_outcomes() {
        let store = MemoryStore::new();
        store.fail_file_batch("rollback");
        let mut handle = store.clone();

        let report = commit(
            &mut handle,
            vec![torrent(1)],
            vec![file(1, "a"), file(1, "b")],
        );

        assert_eq!(report.committed(), 1);
        assert_eq!(report.files_committed, 0);
        assert_eq!(report.files_failed, 2);
        assert_eq!(store.file_count(), 0);
        // The torrent row itself already committed in its own transaction
        assert_eq!(store.torrent_count(), 1);
    }

    #[test]
    fn test_empty_batch_is_silent() {
        let mut store = MemoryStore::new();
        let report = commit(&mut store, Vec::new(), Vec::new());
        assert!(report.outcomes.is_empty());
        assert_eq!(report.files_committed, 0);
    }
}
