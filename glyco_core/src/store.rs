//! Dual-store persistence for basal doses.
//!
//! The remote store is authoritative and the local cache is advisory:
//! - Every dose is offered to the remote first
//! - A dose the remote did not accept goes to a local pending WAL and is
//!   retried by `reconcile`
//! - Every dose is also mirrored to a local journal so history stays
//!   readable while the remote is unreachable
//!
//! Remote failures are reported as `PersistOutcome::CachedOnly`, never as
//! errors. Only a failure to write the local cache as well is an error.
//!
//! Appends, the reconcile hand-off and journal compaction all take the
//! cache directory's lock file, so several processes can share one cache.

use crate::history::merge_entries;
use crate::wal::{read_entries, rewrite_entries, with_lock, DoseSink, JsonlSink};
use crate::{BasalDoseEntry, Error, Result, TargetGlucoseRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Doses not yet accepted by the remote store
pub const PENDING_FILE: &str = "pending_basal.wal";

/// Pending doses claimed by a reconcile in progress
pub const PROCESSING_FILE: &str = "pending_basal.wal.processing";

/// Local mirror of every dose logged on this device
pub const JOURNAL_FILE: &str = "basal_journal.wal";

/// Held while appending to or swapping the cache files
pub const LOCK_FILE: &str = "basal.lock";

/// Held for the whole of a reconcile
pub const RECONCILE_LOCK_FILE: &str = "reconcile.lock";

/// Confirmed journal entries younger than this are kept for offline reads
pub const JOURNAL_RETENTION_DAYS: i64 = 90;

/// Reply from the remote data API
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RemoteResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl RemoteResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Remote data API keyed by user identity
pub trait RemoteStore {
    /// Store one dose. Must be idempotent on `entry.id`.
    fn insert_entry(&mut self, user_id: &str, entry: &BasalDoseEntry) -> RemoteResponse;

    /// All doses the remote holds for the user
    fn fetch_entries(&self, user_id: &str) -> Result<Vec<BasalDoseEntry>>;

    fn update_target_range(&mut self, user_id: &str, range: &TargetGlucoseRange)
        -> RemoteResponse;
}

/// Remote used when none is configured; rejects every request
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineRemote;

impl RemoteStore for OfflineRemote {
    fn insert_entry(&mut self, _user_id: &str, _entry: &BasalDoseEntry) -> RemoteResponse {
        RemoteResponse::failed("no remote store configured")
    }

    fn fetch_entries(&self, _user_id: &str) -> Result<Vec<BasalDoseEntry>> {
        Err(Error::Persistence("no remote store configured".into()))
    }

    fn update_target_range(
        &mut self,
        _user_id: &str,
        _range: &TargetGlucoseRange,
    ) -> RemoteResponse {
        RemoteResponse::failed("no remote store configured")
    }
}

/// Remote backed by a shared directory with one subdirectory per user
pub struct DirectoryRemote {
    root: PathBuf,
}

impl DirectoryRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.root.join(user_id)
    }

    fn doses_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("basal_doses.jsonl")
    }

    /// Path of the stored target range for a user
    pub fn range_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("target_range.json")
    }

    fn try_insert(&self, user_id: &str, entry: &BasalDoseEntry) -> Result<()> {
        std::fs::create_dir_all(self.user_dir(user_id))?;
        let path = self.doses_path(user_id);

        if read_entries(&path)?.iter().any(|e| e.id == entry.id) {
            tracing::debug!("Remote already holds entry {}", entry.id);
            return Ok(());
        }
        JsonlSink::new(path).append(entry)
    }

    fn try_update_range(&self, user_id: &str, range: &TargetGlucoseRange) -> Result<()> {
        std::fs::create_dir_all(self.user_dir(user_id))?;
        std::fs::write(self.range_path(user_id), serde_json::to_string(range)?)?;
        Ok(())
    }
}

impl RemoteStore for DirectoryRemote {
    fn insert_entry(&mut self, user_id: &str, entry: &BasalDoseEntry) -> RemoteResponse {
        match self.try_insert(user_id, entry) {
            Ok(()) => RemoteResponse::ok(),
            Err(e) => RemoteResponse::failed(e.to_string()),
        }
    }

    fn fetch_entries(&self, user_id: &str) -> Result<Vec<BasalDoseEntry>> {
        if !self.root.is_dir() {
            return Err(Error::Persistence(format!(
                "remote store {:?} is unavailable",
                self.root
            )));
        }
        read_entries(&self.doses_path(user_id))
    }

    fn update_target_range(
        &mut self,
        user_id: &str,
        range: &TargetGlucoseRange,
    ) -> RemoteResponse {
        match self.try_update_range(user_id, range) {
            Ok(()) => RemoteResponse::ok(),
            Err(e) => RemoteResponse::failed(e.to_string()),
        }
    }
}

/// Where a dose ended up after `persist`
#[derive(Clone, Debug, PartialEq)]
pub enum PersistOutcome {
    /// Accepted by the remote store
    Confirmed,
    /// Held locally; the remote rejected it or was unreachable
    CachedOnly { reason: String },
}

impl PersistOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PersistOutcome::Confirmed)
    }
}

/// Result of retrying pending doses
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileReport {
    pub confirmed: Vec<Uuid>,
    pub still_pending: usize,
}

/// Write-through store: remote first, local pending cache as fallback
pub struct WriteThroughStore<R: RemoteStore> {
    remote: R,
    user_id: String,
    pending_path: PathBuf,
    processing_path: PathBuf,
    journal_path: PathBuf,
    lock_path: PathBuf,
    reconcile_lock_path: PathBuf,
}

impl<R: RemoteStore> WriteThroughStore<R> {
    /// Cache files live in `cache_dir`
    pub fn new(remote: R, user_id: impl Into<String>, cache_dir: &Path) -> Self {
        Self {
            remote,
            user_id: user_id.into(),
            pending_path: cache_dir.join(PENDING_FILE),
            processing_path: cache_dir.join(PROCESSING_FILE),
            journal_path: cache_dir.join(JOURNAL_FILE),
            lock_path: cache_dir.join(LOCK_FILE),
            reconcile_lock_path: cache_dir.join(RECONCILE_LOCK_FILE),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn pending_path(&self) -> &Path {
        &self.pending_path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Persist a freshly appended dose.
    ///
    /// Returns `Err` only when the remote failed and the local pending cache
    /// could not be written either.
    pub fn persist(&mut self, entry: &BasalDoseEntry) -> Result<PersistOutcome> {
        let response = self.remote.insert_entry(&self.user_id, entry);

        let outcome = if response.success {
            tracing::info!("Remote store confirmed entry {}", entry.id);
            PersistOutcome::Confirmed
        } else {
            let reason = response
                .error
                .unwrap_or_else(|| "remote store rejected the entry".into());
            tracing::warn!(
                "Remote store failed for entry {}: {}. Caching locally.",
                entry.id,
                reason
            );

            with_lock(&self.lock_path, || JsonlSink::new(&self.pending_path).append(entry))
                .map_err(|e| {
                    Error::Persistence(format!(
                        "remote failed ({}) and local cache failed ({})",
                        reason, e
                    ))
                })?;
            PersistOutcome::CachedOnly { reason }
        };

        if let Err(e) = with_lock(&self.lock_path, || {
            JsonlSink::new(&self.journal_path).append(entry)
        }) {
            tracing::warn!("Failed to mirror entry {} to journal: {}", entry.id, e);
        }

        Ok(outcome)
    }

    /// Doses still waiting for the remote, including any claimed by an
    /// unfinished reconcile
    fn pending_entries(&self) -> Result<Vec<BasalDoseEntry>> {
        Ok(merge_entries(
            read_entries(&self.processing_path)?,
            read_entries(&self.pending_path)?,
        ))
    }

    /// Ids of doses still waiting for the remote
    pub fn pending_ids(&self) -> Result<HashSet<Uuid>> {
        Ok(self.pending_entries()?.into_iter().map(|e| e.id).collect())
    }

    /// Retry every pending dose and requeue the ones the remote still rejects.
    ///
    /// The pending WAL is renamed to a processing file before any remote
    /// call, so doses cached meanwhile land in a fresh pending WAL and are
    /// never overwritten. Only one reconcile runs at a time per cache
    /// directory. A processing file left by an interrupted run is picked up
    /// by the next one.
    pub fn reconcile(&mut self) -> Result<ReconcileReport> {
        let reconcile_lock = self.reconcile_lock_path.clone();
        with_lock(&reconcile_lock, || self.reconcile_locked())
    }

    fn reconcile_locked(&mut self) -> Result<ReconcileReport> {
        let claimed = with_lock(&self.lock_path, || self.claim_pending())?;
        if claimed.is_empty() {
            tracing::debug!("No pending entries to reconcile");
            with_lock(&self.lock_path, || self.release_processing())?;
            return Ok(ReconcileReport::default());
        }

        let mut report = ReconcileReport::default();
        let mut remaining = Vec::new();

        for entry in claimed {
            let response = self.remote.insert_entry(&self.user_id, &entry);
            if response.success {
                report.confirmed.push(entry.id);
            } else {
                tracing::debug!(
                    "Entry {} still pending: {}",
                    entry.id,
                    response.error.as_deref().unwrap_or("unknown error")
                );
                remaining.push(entry);
            }
        }
        report.still_pending = remaining.len();

        with_lock(&self.lock_path, || {
            let mut sink = JsonlSink::new(&self.pending_path);
            for entry in &remaining {
                sink.append(entry)?;
            }
            self.release_processing()
        })?;

        tracing::info!(
            "Reconciled {} pending entries, {} still pending",
            report.confirmed.len(),
            report.still_pending
        );
        Ok(report)
    }

    /// Move the pending WAL into the processing file and return its entries
    fn claim_pending(&self) -> Result<Vec<BasalDoseEntry>> {
        if self.pending_path.exists() {
            if self.processing_path.exists() {
                tracing::warn!(
                    "Recovering entries from interrupted reconcile at {:?}",
                    self.processing_path
                );
                let merged = self.pending_entries()?;
                rewrite_entries(&self.processing_path, &merged)?;
                std::fs::remove_file(&self.pending_path)?;
            } else {
                std::fs::rename(&self.pending_path, &self.processing_path)?;
            }
        }

        // Deduplicated: a crash between requeue and cleanup can repeat ids
        Ok(merge_entries(read_entries(&self.processing_path)?, Vec::new()))
    }

    fn release_processing(&self) -> Result<()> {
        match std::fs::remove_file(&self.processing_path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Full dose history as best known: remote plus pending, or the local
    /// journal plus pending when the remote cannot be read
    pub fn load_entries(&self) -> Result<Vec<BasalDoseEntry>> {
        let pending = self.pending_entries()?;

        let base = match self.remote.fetch_entries(&self.user_id) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Remote history unavailable ({}), using local journal", e);
                read_entries(&self.journal_path)?
            }
        };

        Ok(merge_entries(base, pending))
    }

    /// Drop journal entries the remote already holds that are older than
    /// `keep_since`, along with duplicate lines.
    ///
    /// Entries the remote does not hold are always kept. Does nothing while
    /// the remote cannot be read. Returns the number of lines removed.
    pub fn compact_journal(&self, keep_since: DateTime<Utc>) -> Result<usize> {
        let remote_ids: HashSet<Uuid> = match self.remote.fetch_entries(&self.user_id) {
            Ok(entries) => entries.into_iter().map(|e| e.id).collect(),
            Err(e) => {
                tracing::debug!("Skipping journal compaction, remote unavailable: {}", e);
                return Ok(0);
            }
        };

        with_lock(&self.lock_path, || {
            let lines = read_entries(&self.journal_path)?;
            let before = lines.len();

            let kept: Vec<BasalDoseEntry> = merge_entries(lines, Vec::new())
                .into_iter()
                .filter(|e| e.timestamp >= keep_since || !remote_ids.contains(&e.id))
                .collect();

            let removed = before - kept.len();
            if removed > 0 {
                rewrite_entries(&self.journal_path, &kept)?;
                tracing::info!("Compacted journal: removed {} entries", removed);
            }
            Ok(removed)
        })
    }

    /// Push a validated target range to the remote store
    pub fn push_target_range(&mut self, range: &TargetGlucoseRange) -> PersistOutcome {
        let response = self.remote.update_target_range(&self.user_id, range);
        if response.success {
            tracing::info!(
                "Remote store updated target range to {}-{}",
                range.minimum,
                range.maximum
            );
            PersistOutcome::Confirmed
        } else {
            let reason = response
                .error
                .unwrap_or_else(|| "remote store rejected the range".into());
            tracing::warn!("Failed to push target range: {}", reason);
            PersistOutcome::CachedOnly { reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    /// In-memory remote whose availability can be toggled
    #[derive(Default)]
    struct FlakyRemote {
        online: bool,
        entries: Vec<BasalDoseEntry>,
        range: Option<TargetGlucoseRange>,
    }

    impl RemoteStore for FlakyRemote {
        fn insert_entry(&mut self, _user_id: &str, entry: &BasalDoseEntry) -> RemoteResponse {
            if !self.online {
                return RemoteResponse::failed("network unreachable");
            }
            if !self.entries.iter().any(|e| e.id == entry.id) {
                self.entries.push(entry.clone());
            }
            RemoteResponse::ok()
        }

        fn fetch_entries(&self, _user_id: &str) -> Result<Vec<BasalDoseEntry>> {
            if self.online {
                Ok(self.entries.clone())
            } else {
                Err(Error::Persistence("network unreachable".into()))
            }
        }

        fn update_target_range(
            &mut self,
            _user_id: &str,
            range: &TargetGlucoseRange,
        ) -> RemoteResponse {
            if !self.online {
                return RemoteResponse::failed("network unreachable");
            }
            self.range = Some(*range);
            RemoteResponse::ok()
        }
    }

    fn entry(hours_ago: i64) -> BasalDoseEntry {
        BasalDoseEntry {
            id: Uuid::new_v4(),
            insulin_name: "Glargine".into(),
            dose_units: 20.0,
            timestamp: Utc::now() - Duration::hours(hours_ago),
        }
    }

    #[test]
    fn test_online_persist_is_confirmed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let remote = FlakyRemote {
            online: true,
            ..Default::default()
        };
        let mut store = WriteThroughStore::new(remote, "user-1", temp_dir.path());

        let e = entry(0);
        assert_eq!(store.persist(&e).unwrap(), PersistOutcome::Confirmed);
        assert!(store.pending_ids().unwrap().is_empty());
        assert_eq!(store.remote().entries, vec![e]);
    }

    #[test]
    fn test_offline_persist_falls_back_to_cache() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(FlakyRemote::default(), "user-1", temp_dir.path());

        let e = entry(0);
        let outcome = store.persist(&e).unwrap();

        assert_eq!(
            outcome,
            PersistOutcome::CachedOnly {
                reason: "network unreachable".into()
            }
        );
        assert!(store.pending_ids().unwrap().contains(&e.id));
        // Remote unreadable: history comes from journal + pending, without duplicates
        assert_eq!(store.load_entries().unwrap(), vec![e]);
    }

    #[test]
    fn test_reconcile_confirms_and_dedupes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(FlakyRemote::default(), "user-1", temp_dir.path());

        let older = entry(30);
        let newer = entry(2);
        store.persist(&older).unwrap();
        store.persist(&newer).unwrap();

        store.remote.online = true;
        let report = store.reconcile().unwrap();

        assert_eq!(report.confirmed, vec![older.id, newer.id]);
        assert_eq!(report.still_pending, 0);
        assert!(store.pending_ids().unwrap().is_empty());

        let history = store.load_entries().unwrap();
        assert_eq!(history, vec![older, newer]);
    }

    #[test]
    fn test_reconcile_keeps_entries_while_offline() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(FlakyRemote::default(), "user-1", temp_dir.path());

        store.persist(&entry(1)).unwrap();
        let report = store.reconcile().unwrap();

        assert!(report.confirmed.is_empty());
        assert_eq!(report.still_pending, 1);
        assert_eq!(store.pending_ids().unwrap().len(), 1);
    }

    #[test]
    fn test_persist_errors_when_cache_also_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A regular file where the cache directory should be
        let blocked = temp_dir.path().join("blocked");
        std::fs::write(&blocked, "x").unwrap();

        let mut store = WriteThroughStore::new(FlakyRemote::default(), "user-1", &blocked);
        let err = store.persist(&entry(0)).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_directory_remote_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut remote = DirectoryRemote::new(temp_dir.path().join("remote"));

        let e = entry(0);
        assert!(remote.insert_entry("user-1", &e).success);
        // Idempotent on retry
        assert!(remote.insert_entry("user-1", &e).success);

        assert_eq!(remote.fetch_entries("user-1").unwrap(), vec![e]);
        assert!(remote.fetch_entries("someone-else").unwrap().is_empty());

        let range = TargetGlucoseRange {
            minimum: 80,
            maximum: 160,
        };
        assert!(remote.update_target_range("user-1", &range).success);
        let stored: TargetGlucoseRange =
            serde_json::from_str(&std::fs::read_to_string(remote.range_path("user-1")).unwrap())
                .unwrap();
        assert_eq!(stored, range);
    }

    #[test]
    fn test_directory_remote_unavailable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("not-a-dir");
        std::fs::write(&root, "x").unwrap();

        let mut remote = DirectoryRemote::new(&root);
        let response = remote.insert_entry("user-1", &entry(0));
        assert!(!response.success);
        assert!(response.error.is_some());
        assert!(remote.fetch_entries("user-1").is_err());
    }

    #[test]
    fn test_offline_remote_always_fails() {
        let mut remote = OfflineRemote;
        assert!(!remote.insert_entry("u", &entry(0)).success);
        assert!(remote.fetch_entries("u").is_err());
        assert!(!remote
            .update_target_range("u", &TargetGlucoseRange::default())
            .success);
    }

    #[test]
    fn test_push_target_range() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(FlakyRemote::default(), "user-1", temp_dir.path());
        let range = TargetGlucoseRange {
            minimum: 75,
            maximum: 150,
        };

        assert!(!store.push_target_range(&range).is_confirmed());
        store.remote.online = true;
        assert!(store.push_target_range(&range).is_confirmed());
        assert_eq!(store.remote().range, Some(range));
    }

    /// Remote that accepts everything and, on its first insert, caches a
    /// new dose the way a concurrent `basal log` would
    struct InterleavingRemote {
        pending_path: PathBuf,
        lock_path: PathBuf,
        injected: Option<BasalDoseEntry>,
    }

    impl RemoteStore for InterleavingRemote {
        fn insert_entry(&mut self, _user_id: &str, _entry: &BasalDoseEntry) -> RemoteResponse {
            if let Some(late) = self.injected.take() {
                with_lock(&self.lock_path, || JsonlSink::new(&self.pending_path).append(&late))
                    .unwrap();
            }
            RemoteResponse::ok()
        }

        fn fetch_entries(&self, _user_id: &str) -> Result<Vec<BasalDoseEntry>> {
            Ok(Vec::new())
        }

        fn update_target_range(
            &mut self,
            _user_id: &str,
            _range: &TargetGlucoseRange,
        ) -> RemoteResponse {
            RemoteResponse::ok()
        }
    }

    #[test]
    fn test_reconcile_keeps_dose_cached_during_remote_calls() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache_dir = temp_dir.path();

        let queued = entry(3);
        JsonlSink::new(cache_dir.join(PENDING_FILE))
            .append(&queued)
            .unwrap();

        let late = entry(0);
        let remote = InterleavingRemote {
            pending_path: cache_dir.join(PENDING_FILE),
            lock_path: cache_dir.join(LOCK_FILE),
            injected: Some(late.clone()),
        };
        let mut store = WriteThroughStore::new(remote, "user-1", cache_dir);

        let report = store.reconcile().unwrap();
        assert_eq!(report.confirmed, vec![queued.id]);

        let pending = store.pending_ids().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending.contains(&late.id));
        assert!(!cache_dir.join(PROCESSING_FILE).exists());

        // The late dose goes out on the next pass
        let report = store.reconcile().unwrap();
        assert_eq!(report.confirmed, vec![late.id]);
        assert!(store.pending_ids().unwrap().is_empty());
    }

    #[test]
    fn test_reconcile_recovers_interrupted_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache_dir = temp_dir.path();

        // Left behind by a reconcile that crashed mid-way
        let stranded = entry(5);
        JsonlSink::new(cache_dir.join(PROCESSING_FILE))
            .append(&stranded)
            .unwrap();
        let mut store = WriteThroughStore::new(FlakyRemote::default(), "user-1", cache_dir);
        let fresh = entry(1);
        store.persist(&fresh).unwrap();

        // Both still count as pending before anything is retried
        assert_eq!(store.pending_ids().unwrap().len(), 2);

        let report = store.reconcile().unwrap();
        assert_eq!(report.still_pending, 2);
        assert!(!cache_dir.join(PROCESSING_FILE).exists());

        store.remote.online = true;
        let report = store.reconcile().unwrap();
        assert_eq!(report.confirmed, vec![stranded.id, fresh.id]);
    }

    #[test]
    fn test_compact_journal_drops_old_confirmed_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(
            FlakyRemote {
                online: true,
                ..Default::default()
            },
            "user-1",
            temp_dir.path(),
        );

        let old = entry(24 * 200);
        let recent = entry(2);
        store.persist(&old).unwrap();
        store.persist(&recent).unwrap();

        // Offline-only dose the remote never saw
        store.remote.online = false;
        let unsynced = entry(24 * 300);
        store.persist(&unsynced).unwrap();
        store.remote.online = true;

        let cutoff = Utc::now() - Duration::days(JOURNAL_RETENTION_DAYS);
        assert_eq!(store.compact_journal(cutoff).unwrap(), 1);

        let journal = read_entries(store.journal_path()).unwrap();
        assert_eq!(journal, vec![unsynced, recent]);
        // Compaction never touches what the remote reports
        assert_eq!(store.load_entries().unwrap().len(), 3);
    }

    #[test]
    fn test_compact_journal_skipped_while_offline() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(FlakyRemote::default(), "user-1", temp_dir.path());
        store.persist(&entry(24 * 200)).unwrap();

        assert_eq!(store.compact_journal(Utc::now()).unwrap(), 0);
        assert_eq!(read_entries(store.journal_path()).unwrap().len(), 1);
    }
}
