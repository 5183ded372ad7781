//! Basal insulin adherence tracking.
//!
//! The tracker owns one user's chronological basal dose history. Entries are
//! only ever appended; corrections are made by logging a new dose. After each
//! append the history yields:
//! - A timing warning when a dose drifts more than two hours from the usual time
//! - A consistency message when doses were logged on at least 6 of the last 7 days
//! - A per-day report for the last N days, gaps included

use crate::{
    AdherenceFeedback, BasalDoseEntry, DayReport, DayStatus, ValidationError,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Doses further than this from the usual time of day trigger a warning
pub const TIMING_DEVIATION_LIMIT_MINUTES: f64 = 120.0;

/// Length of the trailing consistency window, including the reference day
pub const CONSISTENCY_WINDOW_DAYS: u32 = 7;

/// Distinct logged days within the window needed for a consistency message
pub const CONSISTENT_DAYS_REQUIRED: usize = 6;

/// Longest history window a report may cover
pub const MAX_REPORT_DAYS: u32 = 366;

/// Append-only basal history for a single user
#[derive(Clone, Debug)]
pub struct BasalAdherenceTracker {
    history: Vec<BasalDoseEntry>,
    unconfirmed: HashSet<Uuid>,
    offset: FixedOffset,
}

impl BasalAdherenceTracker {
    /// Empty history. Calendar days are computed in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            history: Vec::new(),
            unconfirmed: HashSet::new(),
            offset,
        }
    }

    /// Restore a tracker from previously persisted entries.
    ///
    /// Entries are ordered by timestamp and duplicates (same id) are dropped.
    pub fn with_history(entries: Vec<BasalDoseEntry>, offset: FixedOffset) -> Self {
        let mut seen = HashSet::new();
        let mut history: Vec<_> = entries
            .into_iter()
            .filter(|e| seen.insert(e.id))
            .collect();
        history.sort_by_key(|e| e.timestamp);

        tracing::debug!("Restored basal history with {} entries", history.len());

        Self {
            history,
            unconfirmed: HashSet::new(),
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn history(&self) -> &[BasalDoseEntry] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Log a dose taken now
    pub fn append(
        &mut self,
        insulin_name: &str,
        dose_units: f64,
    ) -> Result<BasalDoseEntry, ValidationError> {
        self.append_at(insulin_name, dose_units, Utc::now())
    }

    /// Log a dose with an explicit logging instant.
    ///
    /// Validation runs before the history is touched, so a rejected entry
    /// leaves the tracker unchanged. The entry is inserted in timestamp
    /// order, so a clock that stepped backwards cannot unsort the history.
    pub(crate) fn append_at(
        &mut self,
        insulin_name: &str,
        dose_units: f64,
        at: DateTime<Utc>,
    ) -> Result<BasalDoseEntry, ValidationError> {
        let insulin_name = insulin_name.trim();
        if insulin_name.is_empty() {
            return Err(ValidationError::BlankInsulinName);
        }
        if !dose_units.is_finite() || dose_units <= 0.0 {
            return Err(ValidationError::NotPositive {
                field: "dose units",
                value: dose_units,
            });
        }

        let entry = BasalDoseEntry {
            id: Uuid::new_v4(),
            insulin_name: insulin_name.to_string(),
            dose_units,
            timestamp: at,
        };
        let position = self.history.partition_point(|e| e.timestamp <= at);
        self.history.insert(position, entry.clone());

        tracing::info!(
            "Logged basal dose {}: {}u of {}",
            entry.id,
            entry.dose_units,
            entry.insulin_name
        );
        Ok(entry)
    }

    /// Feedback for the most recent append, evaluated at `reference`
    pub fn feedback(&self, reference: DateTime<Utc>) -> AdherenceFeedback {
        AdherenceFeedback {
            timing_deviation_warning: timing_deviation(&self.history, self.offset),
            weekly_consistency_message: weekly_consistency(&self.history, reference, self.offset),
        }
    }

    /// Per-day report for the last `days` calendar days, most recent first
    pub fn history_for_window(
        &self,
        days: u32,
        reference: DateTime<Utc>,
    ) -> Result<Vec<DayReport>, ValidationError> {
        history_for_window(&self.history, days, reference, self.offset)
    }

    /// Record that `id` is held locally but not yet confirmed by the remote store
    pub fn mark_unconfirmed(&mut self, id: Uuid) {
        self.unconfirmed.insert(id);
    }

    /// Record remote confirmation of `id`. Returns false if it was not pending.
    pub fn confirm(&mut self, id: Uuid) -> bool {
        self.unconfirmed.remove(&id)
    }

    pub fn is_confirmed(&self, id: Uuid) -> bool {
        !self.unconfirmed.contains(&id)
    }

    pub fn unconfirmed_count(&self) -> usize {
        self.unconfirmed.len()
    }
}

/// Compare the newest entry's time of day with the mean of all earlier ones.
///
/// Returns a warning when they differ by more than
/// `TIMING_DEVIATION_LIMIT_MINUTES`. With no earlier entries there is no
/// baseline and therefore no warning.
pub fn timing_deviation(history: &[BasalDoseEntry], offset: FixedOffset) -> Option<String> {
    let (latest, earlier) = history.split_last()?;
    if earlier.is_empty() {
        return None;
    }

    let mean = earlier
        .iter()
        .map(|e| minutes_since_midnight(e.timestamp, offset) as f64)
        .sum::<f64>()
        / earlier.len() as f64;
    let latest_minutes = minutes_since_midnight(latest.timestamp, offset) as f64;
    let deviation = latest_minutes - mean;

    if deviation.abs() <= TIMING_DEVIATION_LIMIT_MINUTES {
        return None;
    }

    tracing::debug!(
        "Basal timing deviation of {:.0} minutes from mean {:.0}",
        deviation,
        mean
    );

    let direction = if deviation > 0.0 { "later" } else { "earlier" };
    Some(format!(
        "This dose was logged {:.0} minutes {} than your usual time ({}). \
         Try to take basal insulin at the same time each day.",
        deviation.abs(),
        direction,
        format_clock(mean)
    ))
}

/// Praise when doses were logged on enough distinct days of the trailing week.
///
/// The window is the reference day plus the six days before it, in local
/// time. Falling short yields no message rather than a negative one.
pub fn weekly_consistency(
    history: &[BasalDoseEntry],
    reference: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<String> {
    let last_day = local_date(reference, offset);
    let first_day = last_day - Duration::days(i64::from(CONSISTENCY_WINDOW_DAYS) - 1);

    let logged_days: HashSet<NaiveDate> = history
        .iter()
        .map(|e| local_date(e.timestamp, offset))
        .filter(|d| *d >= first_day && *d <= last_day)
        .collect();

    tracing::debug!(
        "Basal doses logged on {} of the last {} days",
        logged_days.len(),
        CONSISTENCY_WINDOW_DAYS
    );

    if logged_days.len() >= CONSISTENT_DAYS_REQUIRED {
        Some(format!(
            "Great consistency! You logged basal insulin on {} of the last {} days.",
            logged_days.len(),
            CONSISTENCY_WINDOW_DAYS
        ))
    } else {
        None
    }
}

/// One report per calendar day for the last `days` days, most recent first.
///
/// Days without entries are included as `DayStatus::NoEntry` so gaps stay
/// visible. `days` must be between 1 and `MAX_REPORT_DAYS`.
pub fn history_for_window(
    history: &[BasalDoseEntry],
    days: u32,
    reference: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<DayReport>, ValidationError> {
    validate_report_days(days)?;
    let today = local_date(reference, offset);

    let report = (0..i64::from(days))
        .map(|back| {
            let date = today - Duration::days(back);
            let entries: Vec<BasalDoseEntry> = history
                .iter()
                .filter(|e| local_date(e.timestamp, offset) == date)
                .cloned()
                .collect();

            let status = if entries.is_empty() {
                DayStatus::NoEntry
            } else {
                DayStatus::Logged(entries)
            };
            DayReport { date, status }
        })
        .collect::<Vec<_>>();
    Ok(report)
}

/// Check a requested report length against `MAX_REPORT_DAYS`
pub fn validate_report_days(days: u32) -> Result<u32, ValidationError> {
    if (1..=MAX_REPORT_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ValidationError::OutOfRange {
            field: "days",
            value: i64::from(days),
            min: 1,
            max: i64::from(MAX_REPORT_DAYS),
        })
    }
}

/// Calendar day of an instant in the given offset
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

fn minutes_since_midnight(instant: DateTime<Utc>, offset: FixedOffset) -> u32 {
    let local = instant.with_timezone(&offset);
    local.hour() * 60 + local.minute()
}

fn format_clock(minutes: f64) -> String {
    let total = minutes.round() as u32;
    format!("{:02}:{:02}", (total / 60) % 24, total % 60)
}
