//! Atomic document file operations.
//!
//! The whole planner state lives in one JSON document. Writes go through
//! a temp file that is fsynced and renamed over the target, so a crash
//! mid-write leaves the previous document intact.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::model::PlannerState;

/// Storage key of the planner document.
pub const STORAGE_KEY: &str = "operator_planner";

/// Path of the planner document inside a data directory.
#[must_use]
pub fn document_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!("{STORAGE_KEY}.json"))
}

/// Write content to a file atomically.
///
/// 1. Writes content to a sibling temp file (`<name>.tmp`)
/// 2. Calls `fsync` so the data is on disk
/// 3. Renames the temp file over the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    debug!(path = %path.display(), bytes = content.len(), "Wrote planner document");

    Ok(())
}

/// Load the planner document.
///
/// A missing file yields the default state. An unreadable or unparsable
/// file is logged and replaced by the default state; the bad data is not
/// recovered.
#[must_use]
pub fn load_state(path: &Path) -> PlannerState {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return PlannerState::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read planner document, using defaults");
            return PlannerState::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(state) => state,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed planner document, using defaults");
            PlannerState::default()
        }
    }
}

/// Serialize the planner state as the stored document text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_state(state: &PlannerState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}
