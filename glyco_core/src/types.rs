//! Core domain types for the dosing and adherence engine.
//!
//! This module defines the plain data that flows in and out of the engine:
//! - Daily glucose, activity and sleep records (external input)
//! - The derived health snapshot
//! - Bolus calculation input and result
//! - Basal dose entries, adherence feedback and day reports
//! - The personal target glucose range

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Daily Series Records
// ============================================================================

/// Average glucose for one calendar day (mg/dL)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyGlucoseRecord {
    pub date: NaiveDate,
    pub average_glucose: f64,
}

/// Daily glucose records as produced by the ingestion pipeline.
///
/// Records are ordered most-recent-first. The producer may attach its own
/// 7-day average, which stands in for today's value when today is missing.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct GlucoseSeries {
    #[serde(default)]
    pub records: Vec<DailyGlucoseRecord>,
    #[serde(default)]
    pub seven_day_average: Option<f64>,
}

/// Coarse activity classification for a day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    #[default]
    Unknown,
}

impl From<String> for ActivityLevel {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "light" | "lightly_active" => ActivityLevel::Light,
            "moderate" | "moderately_active" => ActivityLevel::Moderate,
            "active" | "very_active" => ActivityLevel::Active,
            _ => ActivityLevel::Unknown,
        }
    }
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary",
            ActivityLevel::Light => "Light",
            ActivityLevel::Moderate => "Moderate",
            ActivityLevel::Active => "Active",
            ActivityLevel::Unknown => "Unknown",
        }
    }
}

/// Step and movement totals for one calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyActivityRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub active_minutes: u32,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

/// Total sleep attributed to one calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailySleepRecord {
    pub date: NaiveDate,
    pub total_hours: f64,
}

/// All three daily series, as read from the ingestion pipeline's output
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct HealthSeries {
    #[serde(default)]
    pub glucose: GlucoseSeries,
    #[serde(default)]
    pub activity: Vec<DailyActivityRecord>,
    #[serde(default)]
    pub sleep: Vec<DailySleepRecord>,
}

// ============================================================================
// Health Snapshot
// ============================================================================

/// Qualitative rating of a night's sleep
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Good,
    Average,
    Poor,
    /// No sleep record exists for the day
    #[default]
    Unknown,
}

impl SleepQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepQuality::Good => "good",
            SleepQuality::Average => "average",
            SleepQuality::Poor => "poor",
            SleepQuality::Unknown => "unknown",
        }
    }
}

/// Compact, read-only summary of a user's day.
///
/// Every field has a neutral value when its source record is missing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct HealthSnapshot {
    pub glucose_today: f64,
    pub recent_glucose_readings: Vec<DailyGlucoseRecord>,
    pub sleep_hours: f64,
    pub sleep_quality: SleepQuality,
    pub steps_today: u32,
    pub active_minutes_today: u32,
    pub activity_level_today: ActivityLevel,
    pub is_sedentary_today: bool,
}

// ============================================================================
// Bolus Dosing
// ============================================================================

/// User-entered parameters for a bolus calculation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct BolusCalculationInput {
    pub carbs_grams: f64,
    pub insulin_to_carb_ratio: f64,
    pub current_glucose: Option<f64>,
    pub target_glucose: Option<f64>,
    pub correction_factor: Option<f64>,
}

impl BolusCalculationInput {
    /// Meal-only input with no correction component
    pub fn meal(carbs_grams: f64, insulin_to_carb_ratio: f64) -> Self {
        Self {
            carbs_grams,
            insulin_to_carb_ratio,
            ..Self::default()
        }
    }

    /// Attach a glucose correction to this input
    pub fn with_correction(
        mut self,
        current_glucose: f64,
        target_glucose: f64,
        correction_factor: f64,
    ) -> Self {
        self.current_glucose = Some(current_glucose);
        self.target_glucose = Some(target_glucose);
        self.correction_factor = Some(correction_factor);
        self
    }
}

/// Outcome of a bolus calculation. Never persisted by the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BolusResult {
    pub meal_insulin_units: f64,
    pub correction_insulin_units: f64,
    /// Sum of meal and correction, rounded to the nearest half unit
    pub total_units: f64,
    pub low_glucose_warning: bool,
}

// ============================================================================
// Basal Adherence
// ============================================================================

/// One logged dose of long-acting insulin. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BasalDoseEntry {
    pub id: Uuid,
    pub insulin_name: String,
    pub dose_units: f64,
    pub timestamp: DateTime<Utc>,
}

/// Feedback derived from the basal history after an append
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct AdherenceFeedback {
    pub timing_deviation_warning: Option<String>,
    pub weekly_consistency_message: Option<String>,
}

impl AdherenceFeedback {
    pub fn is_empty(&self) -> bool {
        self.timing_deviation_warning.is_none() && self.weekly_consistency_message.is_none()
    }
}

/// Whether anything was logged on a given day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "entries", rename_all = "snake_case")]
pub enum DayStatus {
    Logged(Vec<BasalDoseEntry>),
    NoEntry,
}

/// One calendar day of the basal audit report
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub status: DayStatus,
}

impl DayReport {
    /// Entries logged that day (empty for a gap)
    pub fn entries(&self) -> &[BasalDoseEntry] {
        match &self.status {
            DayStatus::Logged(entries) => entries,
            DayStatus::NoEntry => &[],
        }
    }
}

// ============================================================================
// Target Range
// ============================================================================

/// Personal target glucose range (mg/dL). Construct through `range::validate`;
/// deserializing runs the same checks.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "crate::range::StoredRange")]
pub struct TargetGlucoseRange {
    pub minimum: u16,
    pub maximum: u16,
}

impl Default for TargetGlucoseRange {
    fn default() -> Self {
        Self {
            minimum: 70,
            maximum: 140,
        }
    }
}

/// Where a glucose value falls relative to the target range
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseClass {
    Low,
    InRange,
    High,
}

// ============================================================================
// Dosing Profile
// ============================================================================

/// User's saved dosing parameters, persisted across sessions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct DosingProfile {
    #[serde(default, deserialize_with = "crate::range::deserialize_or_default")]
    pub target_range: TargetGlucoseRange,
    #[serde(default)]
    pub insulin_to_carb_ratio: Option<f64>,
    #[serde(default)]
    pub correction_factor: Option<f64>,
    #[serde(default)]
    pub target_glucose: Option<f64>,
    #[serde(default)]
    pub basal_insulin_name: Option<String>,
}
