//! Sync status shown while signed in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Error;

/// Connection and write state of the remote store.
///
/// `error` holds the message of the most recent failure and is cleared
/// by the next successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_syncing: bool,
    pub last_synced: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SyncStatus {
    /// Mark a call as in flight.
    pub fn begin(&mut self) {
        self.is_syncing = true;
    }

    /// Record a successful call.
    pub fn succeed(&mut self) {
        self.is_syncing = false;
        self.is_online = true;
        self.last_synced = Some(Utc::now());
        self.error = None;
    }

    /// Record a failed call. Transport failures also mark the store offline.
    pub fn fail(&mut self, error: &Error) {
        self.is_syncing = false;
        if error.is_network() {
            self.is_online = false;
        }
        self.error = Some(error.to_string());
    }

    /// Stamp an applied realtime event.
    pub fn touch(&mut self) {
        self.last_synced = Some(Utc::now());
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let state = match (self.is_syncing, self.is_online) {
            (true, _) => "syncing",
            (false, true) => "online",
            (false, false) => "offline",
        };
        let synced = self
            .last_synced
            .map_or_else(|| "never synced".to_string(), |t| format!("last synced {}", t.format("%Y-%m-%d %H:%M:%S UTC")));
        match &self.error {
            Some(e) => format!("{state}, {synced}, error: {e}"),
            None => format!("{state}, {synced}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_clears_error() {
        let mut status = SyncStatus::default();
        status.begin();
        status.fail(&Error::Backend("boom".into()));
        assert!(!status.is_syncing);
        assert_eq!(status.error.as_deref(), Some("Backend error: boom"));

        status.begin();
        assert!(status.is_syncing);
        status.succeed();
        assert!(status.error.is_none());
        assert!(status.is_online);
        assert!(status.last_synced.is_some());
    }

    #[test]
    fn test_network_failure_goes_offline() {
        let mut status = SyncStatus::default();
        status.succeed();
        status.fail(&Error::Network("timeout".into()));
        assert!(!status.is_online);
        assert!(status.summary().starts_with("offline"));
    }
}
