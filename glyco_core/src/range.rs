//! Personal target glucose range validation.
//!
//! Candidate bounds are accepted or rejected as given; nothing is clamped.

use crate::{GlucoseClass, TargetGlucoseRange, ValidationError};
use serde::{Deserialize, Deserializer};

/// Lowest permitted bound (mg/dL)
pub const RANGE_FLOOR_MG_DL: i64 = 50;

/// Highest permitted bound (mg/dL)
pub const RANGE_CEILING_MG_DL: i64 = 250;

/// Validate candidate bounds and build the range.
///
/// Fails when either value is not a whole number, lies outside
/// [`RANGE_FLOOR_MG_DL`, `RANGE_CEILING_MG_DL`], or when `min >= max`.
pub fn validate(min: f64, max: f64) -> Result<TargetGlucoseRange, ValidationError> {
    let min = require_bound("minimum", min)?;
    let max = require_bound("maximum", max)?;

    if min >= max {
        return Err(ValidationError::RangeNotIncreasing { min, max });
    }

    // Both bounds are within [50, 250] here
    Ok(TargetGlucoseRange {
        minimum: min as u16,
        maximum: max as u16,
    })
}

/// Range bounds as read from disk or the remote, not yet validated
#[derive(Deserialize)]
pub struct StoredRange {
    minimum: f64,
    maximum: f64,
}

impl TryFrom<StoredRange> for TargetGlucoseRange {
    type Error = ValidationError;

    fn try_from(stored: StoredRange) -> Result<Self, Self::Error> {
        validate(stored.minimum, stored.maximum)
    }
}

/// Read a saved range, replacing one that no longer validates with the default
pub(crate) fn deserialize_or_default<'de, D>(
    deserializer: D,
) -> Result<TargetGlucoseRange, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = StoredRange::deserialize(deserializer)?;
    let (minimum, maximum) = (stored.minimum, stored.maximum);

    Ok(TargetGlucoseRange::try_from(stored).unwrap_or_else(|e| {
        tracing::warn!(
            "Ignoring saved target range {}-{}: {}. Using default.",
            minimum,
            maximum,
            e
        );
        TargetGlucoseRange::default()
    }))
}

/// Validate bounds typed by the user
pub fn validate_str(min: &str, max: &str) -> Result<TargetGlucoseRange, ValidationError> {
    validate(parse_candidate("minimum", min)?, parse_candidate("maximum", max)?)
}

fn parse_candidate(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NotAnInteger {
            field,
            value: raw.to_string(),
        })
}

fn require_bound(field: &'static str, value: f64) -> Result<i64, ValidationError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(ValidationError::NotAnInteger {
            field,
            value: value.to_string(),
        });
    }

    // Out-of-range magnitudes saturate here and are rejected just below
    let whole = value as i64;
    if !(RANGE_FLOOR_MG_DL..=RANGE_CEILING_MG_DL).contains(&whole) {
        return Err(ValidationError::OutOfRange {
            field,
            value: whole,
            min: RANGE_FLOOR_MG_DL,
            max: RANGE_CEILING_MG_DL,
        });
    }

    Ok(whole)
}

impl TargetGlucoseRange {
    /// Classify a glucose reading against this range (bounds are in range)
    pub fn classify(&self, glucose_mg_dl: f64) -> GlucoseClass {
        if glucose_mg_dl < f64::from(self.minimum) {
            GlucoseClass::Low
        } else if glucose_mg_dl > f64::from(self.maximum) {
            GlucoseClass::High
        } else {
            GlucoseClass::InRange
        }
    }
}
