//! Caller-facing engine operations.
//!
//! These tie validation, the adherence tracker and the write-through store
//! together:
//! - Log a basal dose and derive feedback against the updated history
//! - Retry doses held only in the local cache
//! - Validate, save and publish a new target range
//! - Fill bolus inputs from the saved profile

use crate::adherence::BasalAdherenceTracker;
use crate::range;
use crate::store::{PersistOutcome, ReconcileReport, RemoteStore, WriteThroughStore};
use crate::{
    AdherenceFeedback, BasalDoseEntry, BolusCalculationInput, DosingProfile, Result,
    TargetGlucoseRange, ValidationError,
};
use chrono::{DateTime, Utc};
use std::path::Path;

/// A basal dose that passed validation and was appended
#[derive(Clone, Debug)]
pub struct LoggedDose {
    pub entry: BasalDoseEntry,
    pub feedback: AdherenceFeedback,
    pub persistence: PersistOutcome,
}

/// Outcome of a target range change
#[derive(Clone, Debug)]
pub struct RangeUpdate {
    pub range: TargetGlucoseRange,
    pub remote: PersistOutcome,
}

/// Log a basal dose taken now
pub fn log_basal_dose<R: RemoteStore>(
    tracker: &mut BasalAdherenceTracker,
    store: &mut WriteThroughStore<R>,
    insulin_name: &str,
    dose_units: f64,
) -> Result<LoggedDose> {
    log_basal_dose_at(tracker, store, insulin_name, dose_units, Utc::now())
}

/// Log a basal dose at an explicit instant.
///
/// A validation failure leaves both tracker and store untouched. Once the
/// entry is appended it stays in the tracker: it is marked unconfirmed until
/// the remote accepts it, and an `Err` is returned only if neither the remote
/// nor the local cache could store it.
pub(crate) fn log_basal_dose_at<R: RemoteStore>(
    tracker: &mut BasalAdherenceTracker,
    store: &mut WriteThroughStore<R>,
    insulin_name: &str,
    dose_units: f64,
    now: DateTime<Utc>,
) -> Result<LoggedDose> {
    let entry = tracker.append_at(insulin_name, dose_units, now)?;
    tracker.mark_unconfirmed(entry.id);

    let persistence = store.persist(&entry)?;
    if persistence.is_confirmed() {
        tracker.confirm(entry.id);
    }

    let feedback = tracker.feedback(now);
    Ok(LoggedDose {
        entry,
        feedback,
        persistence,
    })
}

/// Retry cached-only doses and mark the accepted ones confirmed
pub fn reconcile_pending<R: RemoteStore>(
    tracker: &mut BasalAdherenceTracker,
    store: &mut WriteThroughStore<R>,
) -> Result<ReconcileReport> {
    let report = store.reconcile()?;
    for id in &report.confirmed {
        tracker.confirm(*id);
    }
    Ok(report)
}

/// Validate a new target range, save it to the profile and push it remotely.
///
/// Invalid bounds are rejected before anything is written. A remote failure
/// is reported in `RangeUpdate::remote`; the local profile keeps the range.
pub fn apply_target_range<R: RemoteStore>(
    profile_path: &Path,
    store: &mut WriteThroughStore<R>,
    min: f64,
    max: f64,
) -> Result<RangeUpdate> {
    let range = range::validate(min, max)?;
    save_target_range(profile_path, store, range)
}

/// Save an already validated range to the profile and push it remotely
pub fn save_target_range<R: RemoteStore>(
    profile_path: &Path,
    store: &mut WriteThroughStore<R>,
    range: TargetGlucoseRange,
) -> Result<RangeUpdate> {
    DosingProfile::update(profile_path, |profile| {
        profile.target_range = range;
        Ok(())
    })?;
    tracing::info!("Target range set to {}-{} mg/dL", range.minimum, range.maximum);

    let remote = store.push_target_range(&range);
    Ok(RangeUpdate { range, remote })
}

/// Values typed by the user for a bolus calculation
#[derive(Clone, Debug, Default)]
pub struct BolusRequest {
    pub carbs_grams: f64,
    pub insulin_to_carb_ratio: Option<f64>,
    pub current_glucose: Option<f64>,
    pub target_glucose: Option<f64>,
    pub correction_factor: Option<f64>,
}

/// Complete a bolus request from the saved profile.
///
/// The ratio falls back to the profile. Target glucose and correction factor
/// fall back to the profile only when a current glucose is given, so a
/// meal-only request stays meal-only and a partial request stays partial.
pub fn bolus_input_from_profile(
    request: &BolusRequest,
    profile: &DosingProfile,
) -> std::result::Result<BolusCalculationInput, ValidationError> {
    let insulin_to_carb_ratio = request
        .insulin_to_carb_ratio
        .or(profile.insulin_to_carb_ratio)
        .ok_or(ValidationError::Missing {
            field: "insulin-to-carb ratio",
        })?;

    let (target_glucose, correction_factor) = if request.current_glucose.is_some() {
        (
            request.target_glucose.or(profile.target_glucose),
            request.correction_factor.or(profile.correction_factor),
        )
    } else {
        (request.target_glucose, request.correction_factor)
    };

    Ok(BolusCalculationInput {
        carbs_grams: request.carbs_grams,
        insulin_to_carb_ratio,
        current_glucose: request.current_glucose,
        target_glucose,
        correction_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DirectoryRemote, OfflineRemote};
    use crate::{bolus, Error};
    use chrono::{Duration, FixedOffset, TimeZone};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_log_dose_offline_keeps_entry_unconfirmed() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(OfflineRemote, "user-1", temp_dir.path());
        let mut tracker = BasalAdherenceTracker::new(utc());

        let logged = log_basal_dose(&mut tracker, &mut store, "Glargine", 20.0).unwrap();

        assert!(!logged.persistence.is_confirmed());
        assert!(!tracker.is_confirmed(logged.entry.id));
        assert_eq!(tracker.len(), 1);
        assert!(store.pending_ids().unwrap().contains(&logged.entry.id));
        assert!(logged.feedback.timing_deviation_warning.is_none());
    }

    #[test]
    fn test_log_dose_online_then_reconcile() {
        let temp_dir = tempfile::tempdir().unwrap();
        let remote_dir = temp_dir.path().join("remote");
        let cache_dir = temp_dir.path().join("cache");

        // Offline first: remote root is a plain file
        std::fs::write(&remote_dir, "offline").unwrap();
        let mut store =
            WriteThroughStore::new(DirectoryRemote::new(&remote_dir), "user-1", &cache_dir);
        let mut tracker = BasalAdherenceTracker::new(utc());
        let logged = log_basal_dose(&mut tracker, &mut store, "Glargine", 20.0).unwrap();
        assert!(!logged.persistence.is_confirmed());

        // Remote comes back
        std::fs::remove_file(&remote_dir).unwrap();
        let report = reconcile_pending(&mut tracker, &mut store).unwrap();
        assert_eq!(report.confirmed, vec![logged.entry.id]);
        assert!(tracker.is_confirmed(logged.entry.id));

        let second = log_basal_dose(&mut tracker, &mut store, "Glargine", 20.0).unwrap();
        assert!(second.persistence.is_confirmed());
        assert_eq!(store.load_entries().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_dose_touches_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(OfflineRemote, "user-1", temp_dir.path());
        let mut tracker = BasalAdherenceTracker::new(utc());

        let err = log_basal_dose(&mut tracker, &mut store, "", 20.0).unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::BlankInsulinName));
        assert!(tracker.is_empty());
        assert!(!store.pending_path().exists());
    }

    #[test]
    fn test_week_of_logging_produces_consistency_message() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = WriteThroughStore::new(OfflineRemote, "user-1", temp_dir.path());
        let mut tracker = BasalAdherenceTracker::new(utc());
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap();

        let mut last = None;
        for day in 0..6 {
            let now = start + Duration::days(day);
            last = Some(log_basal_dose_at(&mut tracker, &mut store, "Degludec", 16.0, now).unwrap());
        }

        let last = last.unwrap();
        assert!(last.feedback.weekly_consistency_message.is_some());
        assert!(last.feedback.timing_deviation_warning.is_none());
    }

    #[test]
    fn test_apply_target_range() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile_path = temp_dir.path().join("profile.json");
        let mut store = WriteThroughStore::new(
            DirectoryRemote::new(temp_dir.path().join("remote")),
            "user-1",
            temp_dir.path(),
        );

        let update = apply_target_range(&profile_path, &mut store, 80.0, 160.0).unwrap();
        assert!(update.remote.is_confirmed());
        assert_eq!(
            DosingProfile::load(&profile_path).unwrap().target_range,
            update.range
        );
    }

    #[test]
    fn test_invalid_target_range_not_saved() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile_path = temp_dir.path().join("profile.json");
        let mut store = WriteThroughStore::new(OfflineRemote, "user-1", temp_dir.path());

        let err = apply_target_range(&profile_path, &mut store, 40.0, 300.0).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::OutOfRange { .. })));
        assert!(!profile_path.exists());
    }

    #[test]
    fn test_offline_target_range_still_saved_locally() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile_path = temp_dir.path().join("profile.json");
        let mut store = WriteThroughStore::new(OfflineRemote, "user-1", temp_dir.path());

        let update = apply_target_range(&profile_path, &mut store, 75.0, 150.0).unwrap();
        assert!(!update.remote.is_confirmed());
        assert_eq!(DosingProfile::load(&profile_path).unwrap().target_range.maximum, 150);
    }

    #[test]
    fn test_bolus_input_uses_profile_defaults() {
        let profile = DosingProfile {
            insulin_to_carb_ratio: Some(15.0),
            correction_factor: Some(40.0),
            target_glucose: Some(120.0),
            ..Default::default()
        };
        let request = BolusRequest {
            carbs_grams: 45.0,
            current_glucose: Some(200.0),
            ..Default::default()
        };

        let input = bolus_input_from_profile(&request, &profile).unwrap();
        let result = bolus::calculate(&input).unwrap();
        assert_eq!(result.total_units, 5.0);
    }

    #[test]
    fn test_meal_only_request_ignores_profile_correction() {
        let profile = DosingProfile {
            insulin_to_carb_ratio: Some(10.0),
            correction_factor: Some(40.0),
            target_glucose: Some(120.0),
            ..Default::default()
        };
        let request = BolusRequest {
            carbs_grams: 60.0,
            ..Default::default()
        };

        let input = bolus_input_from_profile(&request, &profile).unwrap();
        assert!(input.target_glucose.is_none());
        assert_eq!(bolus::calculate(&input).unwrap().total_units, 6.0);
    }

    #[test]
    fn test_missing_ratio_rejected() {
        let request = BolusRequest {
            carbs_grams: 60.0,
            ..Default::default()
        };
        assert_eq!(
            bolus_input_from_profile(&request, &DosingProfile::default()).unwrap_err(),
            ValidationError::Missing {
                field: "insulin-to-carb ratio"
            }
        );
    }
}
