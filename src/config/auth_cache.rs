//! Persisted auth session.
//!
//! Signing in writes `<home>/session.json`; its presence is what makes
//! the planner remote. The file holds a bearer token, so it is written
//! with 0600 permissions using write-to-temp then rename, and a corrupt
//! file is treated as signed out.

use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::AuthSession;
use crate::error::Result;

/// A signed-in session and the backend it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub backend_url: String,
    pub session: AuthSession,
}

/// Get the session file path.
#[must_use]
pub fn session_path(home: &Path) -> PathBuf {
    home.join("session.json")
}

/// Read the stored session.
///
/// Returns `None` if the file doesn't exist or is corrupted.
#[must_use]
pub fn read_session(home: &Path) -> Option<StoredSession> {
    let path = session_path(home);
    if !path.exists() {
        return None;
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read session file");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(stored) => Some(stored),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
            None
        }
    }
}

/// Write the session atomically with owner-only permissions.
///
/// # Errors
///
/// Returns an error if the home directory or file cannot be written.
pub fn write_session(home: &Path, stored: &StoredSession) -> Result<()> {
    fs::create_dir_all(home)?;

    let file_path = session_path(home);
    let temp_path = home.join("session.json.tmp");
    let json = serde_json::to_string_pretty(stored)?;

    {
        let mut opts = fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o600);
        let mut file = opts.open(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&temp_path, &file_path)?;

    debug!(path = %file_path.display(), "Wrote session file");
    Ok(())
}

/// Remove the stored session. Returns whether one existed.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_session(home: &Path) -> Result<bool> {
    let path = session_path(home);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stored() -> StoredSession {
        StoredSession {
            backend_url: "sqlite::memory:".into(),
            session: AuthSession {
                user_id: "u1".into(),
                email: "a@example.com".into(),
                access_token: "tok".into(),
                refresh_token: None,
                expires_at: None,
            },
        }
    }

    #[test]
    fn test_write_read_clear() {
        let dir = TempDir::new().unwrap();
        assert!(read_session(dir.path()).is_none());

        write_session(dir.path(), &stored()).unwrap();
        assert_eq!(read_session(dir.path()), Some(stored()));

        assert!(clear_session(dir.path()).unwrap());
        assert!(read_session(dir.path()).is_none());
        assert!(!clear_session(dir.path()).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write_session(dir.path(), &stored()).unwrap();
        let mode = fs::metadata(session_path(dir.path())).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_session_reads_as_signed_out() {
        let dir = TempDir::new().unwrap();
        fs::write(session_path(dir.path()), "not json").unwrap();
        assert!(read_session(dir.path()).is_none());
    }
}
