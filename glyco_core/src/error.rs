//! Error types for the glyco_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Rejected caller input.
///
/// Every variant carries enough context to tell the user what to fix.
/// Arithmetic preconditions (such as a zero divisor) live here too so they
/// are caught before any computation runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A quantity that must be a finite number greater than zero
    #[error("{field} must be a number greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    /// A required value was not supplied and has no saved default
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// Some but not all of current glucose, target glucose and correction factor
    #[error(
        "correction inputs must be complete or absent: supply current glucose, \
         target glucose and correction factor together"
    )]
    IncompleteCorrection,

    /// Correction factor of zero would divide by zero
    #[error("correction factor cannot be zero")]
    ZeroCorrectionFactor,

    /// Basal entry without an insulin name
    #[error("insulin name cannot be blank")]
    BlankInsulinName,

    /// A value that must be a whole number
    #[error("{field} must be a whole number (got {value})")]
    NotAnInteger { field: &'static str, value: String },

    /// A value outside its permitted bounds
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Target range whose minimum is not below its maximum
    #[error("minimum ({min}) must be lower than maximum ({max})")]
    RangeNotIncreasing { min: i64, max: i64 },
}

/// Core error type for glyco_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller input was rejected
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A dose could not be stored anywhere
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The validation failure behind this error, if it is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}
