//! Bolus dose calculation.
//!
//! Meal and correction insulin from user-entered parameters:
//! - Meal insulin: carbs / insulin-to-carb ratio
//! - Correction insulin: (current - target) / correction factor, only when all
//!   three correction inputs are present
//! - Total rounded to the nearest half unit (pen graduation)

use crate::{BolusCalculationInput, BolusResult, ValidationError};

/// Current glucose below this (mg/dL) flags the bolus as possibly inadvisable
pub const LOW_GLUCOSE_THRESHOLD_MG_DL: f64 = 70.0;

/// Compute meal and correction insulin for the given input.
///
/// Input is fully validated before any arithmetic. A negative correction
/// (glucose already below target) is kept as-is and reduces the total.
pub fn calculate(input: &BolusCalculationInput) -> Result<BolusResult, ValidationError> {
    let carbs = require_positive("carbs", input.carbs_grams)?;
    let ratio = require_positive("insulin-to-carb ratio", input.insulin_to_carb_ratio)?;
    let correction = correction_inputs(input)?;

    let meal_insulin_units = carbs / ratio;
    let correction_insulin_units = correction
        .map(|c| (c.current - c.target) / c.factor)
        .unwrap_or(0.0);
    let total_units = round_to_half_unit(meal_insulin_units + correction_insulin_units);

    let low_glucose_warning = input
        .current_glucose
        .is_some_and(|g| g < LOW_GLUCOSE_THRESHOLD_MG_DL);

    if low_glucose_warning {
        tracing::warn!(
            "Current glucose {:?} mg/dL is below {}; bolus may be inadvisable",
            input.current_glucose,
            LOW_GLUCOSE_THRESHOLD_MG_DL
        );
    }

    tracing::debug!(
        "Bolus: meal={:.2}u correction={:.2}u total={:.1}u",
        meal_insulin_units,
        correction_insulin_units,
        total_units
    );

    Ok(BolusResult {
        meal_insulin_units,
        correction_insulin_units,
        total_units,
        low_glucose_warning,
    })
}

/// Round to the nearest multiple of 0.5, ties away from zero.
///
/// 0.25 rounds to 0.5, 0.75 to 1.0 and -0.25 to -0.5.
pub fn round_to_half_unit(units: f64) -> f64 {
    (units * 2.0).round() / 2.0
}

struct Correction {
    current: f64,
    target: f64,
    factor: f64,
}

/// Correction fields are all-or-nothing
fn correction_inputs(input: &BolusCalculationInput) -> Result<Option<Correction>, ValidationError> {
    match (
        input.current_glucose,
        input.target_glucose,
        input.correction_factor,
    ) {
        (None, None, None) => Ok(None),
        (Some(current), Some(target), Some(factor)) => {
            if factor == 0.0 {
                return Err(ValidationError::ZeroCorrectionFactor);
            }
            Ok(Some(Correction {
                current: require_positive("current glucose", current)?,
                target: require_positive("target glucose", target)?,
                factor: require_positive("correction factor", factor)?,
            }))
        }
        _ => Err(ValidationError::IncompleteCorrection),
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}
