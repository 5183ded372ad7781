//! Daily health snapshot aggregation.
//!
//! Reduces the glucose, activity and sleep series for a window of days into a
//! single `HealthSnapshot` for downstream insight features. Aggregation is a
//! pure function; only `HealthSeries::load` touches the filesystem.

use crate::{
    ActivityLevel, DailyActivityRecord, DailyGlucoseRecord, DailySleepRecord, GlucoseSeries,
    HealthSeries, HealthSnapshot, Result, SleepQuality,
};
use chrono::NaiveDate;
use std::path::Path;

/// More sleep than this (hours) rates as good
pub const GOOD_SLEEP_HOURS: f64 = 7.0;

/// More sleep than this (hours), up to `GOOD_SLEEP_HOURS`, rates as average
pub const AVERAGE_SLEEP_HOURS: f64 = 5.0;

/// Number of glucose days carried in `recent_glucose_readings`
pub const RECENT_READINGS_LIMIT: usize = 7;

/// Build the snapshot for `today` from the three daily series.
///
/// Missing records are not errors: each derived field falls back to its
/// neutral value.
pub fn build_snapshot(
    glucose: &GlucoseSeries,
    activity: &[DailyActivityRecord],
    sleep: &[DailySleepRecord],
    today: NaiveDate,
) -> HealthSnapshot {
    let glucose_today = glucose
        .records
        .iter()
        .find(|r| r.date == today)
        .map(|r| r.average_glucose)
        .or(glucose.seven_day_average)
        .unwrap_or(0.0);

    let recent_glucose_readings: Vec<DailyGlucoseRecord> = glucose
        .records
        .iter()
        .take(RECENT_READINGS_LIMIT)
        .cloned()
        .collect();

    let sleep_today = sleep.iter().find(|r| r.date == today);
    let sleep_hours = sleep_today.map(|r| r.total_hours).unwrap_or(0.0);
    let sleep_quality = sleep_today
        .map(|r| rate_sleep(r.total_hours))
        .unwrap_or(SleepQuality::Unknown);

    let activity_today = activity.iter().find(|r| r.date == today);
    let activity_level_today = activity_today
        .map(|r| r.activity_level)
        .unwrap_or(ActivityLevel::Unknown);

    HealthSnapshot {
        glucose_today,
        recent_glucose_readings,
        sleep_hours,
        sleep_quality,
        steps_today: activity_today.map(|r| r.steps).unwrap_or(0),
        active_minutes_today: activity_today.map(|r| r.active_minutes).unwrap_or(0),
        activity_level_today,
        is_sedentary_today: activity_level_today == ActivityLevel::Sedentary,
    }
}

/// Rate a night's sleep by its total hours
pub fn rate_sleep(total_hours: f64) -> SleepQuality {
    if total_hours > GOOD_SLEEP_HOURS {
        SleepQuality::Good
    } else if total_hours > AVERAGE_SLEEP_HOURS {
        SleepQuality::Average
    } else {
        SleepQuality::Poor
    }
}

impl HealthSeries {
    /// Load series exported by the ingestion pipeline from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let series: HealthSeries = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded health series from {:?}: {} glucose, {} activity, {} sleep records",
            path,
            series.glucose.records.len(),
            series.activity.len(),
            series.sleep.len()
        );
        Ok(series)
    }

    /// Build the snapshot for `today` from this bundle
    pub fn snapshot(&self, today: NaiveDate) -> HealthSnapshot {
        build_snapshot(&self.glucose, &self.activity, &self.sleep, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn glucose_days(latest: u32, count: u32) -> Vec<DailyGlucoseRecord> {
        (0..count)
            .map(|i| DailyGlucoseRecord {
                date: day(latest - i),
                average_glucose: 100.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn test_snapshot_uses_todays_records() {
        let glucose = GlucoseSeries {
            records: glucose_days(20, 3),
            seven_day_average: Some(130.0),
        };
        let activity = vec![DailyActivityRecord {
            date: day(20),
            steps: 8500,
            active_minutes: 42,
            activity_level: ActivityLevel::Moderate,
        }];
        let sleep = vec![DailySleepRecord {
            date: day(20),
            total_hours: 7.5,
        }];

        let snap = build_snapshot(&glucose, &activity, &sleep, day(20));

        assert_eq!(snap.glucose_today, 100.0);
        assert_eq!(snap.recent_glucose_readings.len(), 3);
        assert_eq!(snap.sleep_hours, 7.5);
        assert_eq!(snap.sleep_quality, SleepQuality::Good);
        assert_eq!(snap.steps_today, 8500);
        assert_eq!(snap.active_minutes_today, 42);
        assert_eq!(snap.activity_level_today, ActivityLevel::Moderate);
        assert!(!snap.is_sedentary_today);
    }

    #[test]
    fn test_glucose_falls_back_to_seven_day_average() {
        let glucose = GlucoseSeries {
            records: glucose_days(19, 2),
            seven_day_average: Some(128.5),
        };

        let snap = build_snapshot(&glucose, &[], &[], day(20));
        assert_eq!(snap.glucose_today, 128.5);
    }

    #[test]
    fn test_missing_day_yields_neutral_snapshot() {
        let snap = build_snapshot(&GlucoseSeries::default(), &[], &[], day(20));

        assert_eq!(snap.glucose_today, 0.0);
        assert!(snap.recent_glucose_readings.is_empty());
        assert_eq!(snap.sleep_hours, 0.0);
        assert_eq!(snap.sleep_quality, SleepQuality::Unknown);
        assert_eq!(snap.steps_today, 0);
        assert_eq!(snap.active_minutes_today, 0);
        assert_eq!(snap.activity_level_today, ActivityLevel::Unknown);
        assert!(!snap.is_sedentary_today);
        assert_eq!(snap, HealthSnapshot::default());
    }

    #[test]
    fn test_recent_readings_capped_at_seven_in_series_order() {
        let glucose = GlucoseSeries {
            records: glucose_days(20, 10),
            seven_day_average: None,
        };

        let snap = build_snapshot(&glucose, &[], &[], day(20));
        assert_eq!(snap.recent_glucose_readings.len(), RECENT_READINGS_LIMIT);
        assert_eq!(snap.recent_glucose_readings[0].date, day(20));
        assert_eq!(snap.recent_glucose_readings[6].date, day(14));
    }

    #[test]
    fn test_sleep_quality_thresholds() {
        assert_eq!(rate_sleep(7.01), SleepQuality::Good);
        assert_eq!(rate_sleep(7.0), SleepQuality::Average);
        assert_eq!(rate_sleep(5.5), SleepQuality::Average);
        assert_eq!(rate_sleep(5.0), SleepQuality::Poor);
        assert_eq!(rate_sleep(0.0), SleepQuality::Poor);
    }

    #[test]
    fn test_sedentary_flag() {
        let activity = vec![DailyActivityRecord {
            date: day(20),
            steps: 900,
            active_minutes: 3,
            activity_level: ActivityLevel::Sedentary,
        }];

        let snap = build_snapshot(&GlucoseSeries::default(), &activity, &[], day(20));
        assert!(snap.is_sedentary_today);
    }

    #[test]
    fn test_load_series_from_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("series.json");

        let json = r#"{
            "glucose": {
                "records": [
                    {"date": "2024-03-20", "average_glucose": 142.0},
                    {"date": "2024-03-19", "average_glucose": 118.0}
                ],
                "seven_day_average": 125.0
            },
            "activity": [
                {"date": "2024-03-20", "steps": 4000, "active_minutes": 12, "activity_level": "Lightly Active"}
            ],
            "sleep": [
                {"date": "2024-03-20", "total_hours": 4.5}
            ]
        }"#;
        std::fs::write(&path, json).unwrap();

        let series = HealthSeries::load(&path).unwrap();
        let snap = series.snapshot(day(20));

        assert_eq!(snap.glucose_today, 142.0);
        assert_eq!(snap.activity_level_today, ActivityLevel::Light);
        assert_eq!(snap.sleep_quality, SleepQuality::Poor);
    }

    #[test]
    fn test_unrecognized_activity_level_is_unknown() {
        let record: DailyActivityRecord =
            serde_json::from_str(r#"{"date": "2024-03-20", "activity_level": "couch"}"#).unwrap();
        assert_eq!(record.activity_level, ActivityLevel::Unknown);
        assert_eq!(record.steps, 0);
    }
}
