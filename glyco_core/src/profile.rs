//! Saved dosing parameters.
//!
//! The profile holds the defaults the CLI falls back to: target range,
//! insulin-to-carb ratio, correction factor, target glucose and the usual
//! basal insulin. It is read under a shared lock and replaced atomically.

use crate::wal::with_lock;
use crate::{DosingProfile, Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl DosingProfile {
    /// Load the saved profile.
    ///
    /// A missing file gives the default profile. An unreadable or unparsable
    /// file is logged and also gives the default; dosing must never be
    /// blocked by a damaged profile. Stored values that would fail input
    /// validation are dropped field by field: a bad target range reverts to
    /// the default range and a non-positive ratio, factor or target is
    /// forgotten so the user is asked for it again.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No profile at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = match read_shared(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Unable to read profile {:?}: {}. Using defaults.", path, e);
                return Ok(Self::default());
            }
        };

        let mut profile = match serde_json::from_str::<DosingProfile>(&contents) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Failed to parse profile {:?}: {}. Using defaults.", path, e);
                return Ok(Self::default());
            }
        };

        profile.insulin_to_carb_ratio =
            positive_or_none("insulin_to_carb_ratio", profile.insulin_to_carb_ratio);
        profile.correction_factor =
            positive_or_none("correction_factor", profile.correction_factor);
        profile.target_glucose = positive_or_none("target_glucose", profile.target_glucose);
        if profile
            .basal_insulin_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            profile.basal_insulin_name = None;
        }

        tracing::debug!("Loaded dosing profile from {:?}", path);
        Ok(profile)
    }

    /// Replace the saved profile atomically (temp file, fsync, rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, self)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved dosing profile to {:?}", path);
        Ok(())
    }

    /// Load, modify and save the profile as one step.
    ///
    /// Holds the profile's lock file throughout, so a concurrent `range set`
    /// and `profile set` cannot undo each other. Nothing is written when `f`
    /// fails.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut DosingProfile) -> Result<()>,
    {
        with_lock(&path.with_extension("lock"), || {
            let mut profile = Self::load(path)?;
            f(&mut profile)?;
            profile.save(path)?;
            Ok(profile)
        })
    }
}

/// Read a whole file under a shared lock
fn read_shared(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;
    Ok(contents)
}

fn positive_or_none(field: &str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => {
            tracing::warn!("Ignoring saved {} of {}: must be greater than zero", field, v);
            None
        }
        other => other,
    }
}
