#![forbid(unsafe_code)]

//! Core domain model and business logic for the Glyco dosing engine.
//!
//! This crate provides:
//! - Domain types (daily records, snapshots, doses, target range)
//! - Health snapshot aggregation
//! - Bolus dose calculation
//! - Basal adherence tracking
//! - Target range validation
//! - Persistence (WAL, write-through remote store, profile, CSV export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod snapshot;
pub mod bolus;
pub mod adherence;
pub mod range;
pub mod wal;
pub mod store;
pub mod history;
pub mod profile;
pub mod export;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use types::*;
pub use config::Config;
pub use snapshot::build_snapshot;
pub use adherence::BasalAdherenceTracker;
pub use wal::{DoseSink, JsonlSink};
pub use store::{
    DirectoryRemote, OfflineRemote, PersistOutcome, ReconcileReport, RemoteResponse, RemoteStore,
    WriteThroughStore,
};
pub use history::load_tracker;
pub use export::export_history;
pub use engine::{
    apply_target_range, bolus_input_from_profile, log_basal_dose, reconcile_pending, save_target_range,
    BolusRequest, LoggedDose, RangeUpdate,
};
