//! Basal history loading.
//!
//! Combines entries from the remote store, the local journal and the pending
//! cache into one chronological history and restores a tracker from it.

use crate::adherence::BasalAdherenceTracker;
use crate::store::{RemoteStore, WriteThroughStore};
use crate::{BasalDoseEntry, Result};
use chrono::FixedOffset;
use std::collections::HashSet;

/// Merge two entry sources into one chronological history.
///
/// An entry present in both (same id) appears once; the copy from `primary`
/// wins.
pub fn merge_entries(
    primary: Vec<BasalDoseEntry>,
    secondary: Vec<BasalDoseEntry>,
) -> Vec<BasalDoseEntry> {
    let mut seen_ids = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());

    for entry in primary {
        if seen_ids.insert(entry.id) {
            merged.push(entry);
        }
    }

    let mut secondary_count = 0;
    for entry in secondary {
        if seen_ids.insert(entry.id) {
            merged.push(entry);
            secondary_count += 1;
        }
    }
    tracing::debug!("Merged {} entries not already known", secondary_count);

    // Oldest first
    merged.sort_by_key(|e| e.timestamp);
    merged
}

/// Restore a tracker from the store, marking cached-only entries unconfirmed
pub fn load_tracker<R: RemoteStore>(
    store: &WriteThroughStore<R>,
    offset: FixedOffset,
) -> Result<BasalAdherenceTracker> {
    let entries = store.load_entries()?;
    let pending = store.pending_ids()?;

    let mut tracker = BasalAdherenceTracker::with_history(entries, offset);
    for id in pending {
        tracker.mark_unconfirmed(id);
    }

    tracing::info!(
        "Loaded {} basal entries ({} awaiting remote confirmation)",
        tracker.len(),
        tracker.unconfirmed_count()
    );
    Ok(tracker)
}
