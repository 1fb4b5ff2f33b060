//! Configuration management.
//!
//! Everything the CLI keeps on disk lives under one home directory:
//!
//! - `config.json` - settings (backend URL, anon key, reminder times, ...)
//! - `session.json` - the signed-in session, if any
//! - `operator_planner.json` - the local planner document
//!
//! The home directory is `~/.operator/` unless overridden.

mod auth_cache;
mod settings;

pub use auth_cache::{clear_session, read_session, session_path, write_session, StoredSession};
pub use settings::{
    config_path, load_settings, save_settings, Overrides, RuntimeConfig, Settings,
    DEFAULT_EVENING_TIME, DEFAULT_MORNING_TIME, DEFAULT_WATCH_INTERVAL, ENV_ADMIN_EMAILS,
    ENV_ANON_KEY, ENV_BACKEND_URL, ENV_DEBOUNCE_MS,
};

use crate::error::{Error, Result};

use std::path::{Path, PathBuf};

pub const ENV_HOME: &str = "OPERATOR_HOME";

/// Get the global home directory location (`~/.operator/`).
#[must_use]
pub fn global_operator_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".operator"))
}

/// Resolve the home directory.
///
/// Priority:
/// 1. `explicit` (the `--home` flag)
/// 2. `OPERATOR_HOME` environment variable
/// 3. `~/.operator/`
///
/// # Errors
///
/// Returns `Error::Config` if no home directory can be determined.
pub fn resolve_home(explicit: Option<&Path>) -> Result<PathBuf> {
    pick_home(explicit, std::env::var(ENV_HOME).ok(), global_operator_dir())
}

fn pick_home(explicit: Option<&Path>, env: Option<String>, global: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(home) = env.filter(|h| !h.trim().is_empty()) {
        return Ok(PathBuf::from(home));
    }

    global.ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Path of the local planner document.
#[must_use]
pub fn planner_document_path(home: &Path) -> PathBuf {
    crate::storage::document_path(home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_home_priority() {
        let global = Some(PathBuf::from("/home/u/.operator"));

        let explicit = pick_home(Some(Path::new("/tmp/x")), Some("/env".into()), global.clone());
        assert_eq!(explicit.unwrap(), PathBuf::from("/tmp/x"));

        let env = pick_home(None, Some("/env".into()), global.clone());
        assert_eq!(env.unwrap(), PathBuf::from("/env"));

        let fallback = pick_home(None, Some("  ".into()), global);
        assert_eq!(fallback.unwrap(), PathBuf::from("/home/u/.operator"));
    }

    #[test]
    fn test_pick_home_without_any_location() {
        assert!(matches!(pick_home(None, None, None), Err(Error::Config(_))));
    }

    #[test]
    fn test_global_dir_name() {
        if let Some(dir) = global_operator_dir() {
            assert!(dir.ends_with(".operator"));
        }
    }

    #[test]
    fn test_document_lives_in_home() {
        let path = planner_document_path(Path::new("/h"));
        assert_eq!(path, PathBuf::from("/h/operator_planner.json"));
    }
}
