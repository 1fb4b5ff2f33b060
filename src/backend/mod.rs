//! Hosted backend abstraction.
//!
//! The planner depends on a small slice of a backend-as-a-service:
//! password auth, user-scoped row CRUD with upsert-by-unique-key, a
//! change feed keyed by table and filter, and named functions taking a
//! JSON body. [`Backend`] captures exactly that slice.
//!
//! # Implementations
//!
//! - [`SqliteBackend`] - embedded, in-process (tests, self-hosting)
//! - [`RestBackend`] - HTTP client for the hosted service

pub mod hash;
pub mod migrations;
pub mod poll;
pub mod rest;
pub mod rows;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub use rest::RestBackend;
pub use sqlite::{FunctionContext, SqliteBackend};

/// A row keyed by remote column name.
pub type Row = serde_json::Map<String, Value>;

/// Remote table names.
pub mod tables {
    pub const OPERATING_CODE: &str = "operating_code";
    pub const DAILY_PLANS: &str = "daily_plans";
    pub const GOALS: &str = "goals";
    pub const USER_PROFILES: &str = "user_profiles";
}

/// Remote function names.
pub mod functions {
    pub const MANAGE_SUBSCRIPTION: &str = "manage-subscription";
    pub const CREATE_SUBSCRIPTION: &str = "create-subscription";
}

// ── Auth ──────────────────────────────────────────────────────

/// An authenticated session as returned by sign-in or sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

// ── Queries ───────────────────────────────────────────────────

/// Row predicate on a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
}

impl Filter {
    /// `column = value`
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::Eq(column.to_string(), value.into())
    }

    /// `column >= value`
    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Self::Gte(column.to_string(), value.into())
    }

    /// Column the predicate applies to.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::Gte(c, _) => c,
        }
    }

    /// Value the predicate compares against.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Eq(_, v) | Self::Gte(_, v) => v,
        }
    }

    /// Evaluate the predicate against a row held in memory.
    ///
    /// `Gte` compares numbers numerically and everything else by its
    /// string form, which is correct for ISO dates and timestamps.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(self.column()) else {
            return false;
        };
        match self {
            Self::Eq(_, expected) => actual == expected,
            Self::Gte(_, bound) => match (actual.as_f64(), bound.as_f64()) {
                (Some(a), Some(b)) => a >= b,
                _ => value_text(actual) >= value_text(bound),
            },
        }
    }
}

/// Text form of a scalar value, without JSON quoting for strings.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A select against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    /// Column and descending flag
    pub order: Option<(String, bool)>,
}

impl Query {
    /// Select every visible row of `table`.
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    /// Add a predicate.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order ascending by a column.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), false));
        self
    }

    /// Order descending by a column.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), true));
        self
    }
}

// ── Change feed ───────────────────────────────────────────────

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change pushed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    /// Row after the change (insert/update)
    pub new: Option<Row>,
    /// Row before the change (delete)
    pub old: Option<Row>,
}

impl ChangeEvent {
    /// The row this event is about: `new` if present, else `old`.
    #[must_use]
    pub fn row(&self) -> Option<&Row> {
        self.new.as_ref().or(self.old.as_ref())
    }
}

/// An open change-feed subscription.
///
/// Events queue up until drained; dropping the subscription closes the
/// feed.
pub struct Subscription {
    table: String,
    rx: Receiver<ChangeEvent>,
}

impl Subscription {
    /// Wrap a receiving end for `table`.
    #[must_use]
    pub fn new(table: &str, rx: Receiver<ChangeEvent>) -> Self {
        Self {
            table: table.to_string(),
            rx,
        }
    }

    /// Table this subscription watches.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Take every event delivered so far without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("table", &self.table).finish_non_exhaustive()
    }
}

// ── Backend trait ─────────────────────────────────────────────

/// The backend operations the planner relies on.
///
/// Every data call is scoped by the session's user; rows belonging to
/// other users are neither visible nor writable.
pub trait Backend: Send + Sync {
    /// Short name for logs and status output.
    fn name(&self) -> &'static str;

    /// Password sign-in.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` with the backend's message on bad credentials.
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the account cannot be created.
    fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Invalidate a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the call.
    fn sign_out(&self, session: &AuthSession) -> Result<()>;

    /// Select rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the session is invalid.
    fn select(&self, session: &AuthSession, query: &Query) -> Result<Vec<Row>>;

    /// Insert a row and return it as stored (with generated columns).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert(&self, session: &AuthSession, table: &str, row: Row) -> Result<Row>;

    /// Insert or merge a row on the given unique columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn upsert(&self, session: &AuthSession, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row>;

    /// Update matching rows with the columns in `patch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn update(&self, session: &AuthSession, table: &str, filters: &[Filter], patch: Row) -> Result<()>;

    /// Delete matching rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, session: &AuthSession, table: &str, filters: &[Filter]) -> Result<()>;

    /// Open a change feed for rows of `table` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be opened.
    fn subscribe(&self, session: &AuthSession, table: &str, filter: Filter) -> Result<Subscription>;

    /// Call a named function with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the function is unknown.
    fn invoke(&self, session: Option<&AuthSession>, function: &str, body: Value) -> Result<Value>;
}

/// Shared handle to a backend, long-lived for the process.
pub type SharedBackend = Arc<dyn Backend>;

/// Open the backend named by a URL.
///
/// - `sqlite:<path>` (or `sqlite::memory:`) opens the embedded backend
/// - `http://…` / `https://…` uses the hosted REST dialect and needs an
///   anon key
///
/// # Errors
///
/// Returns `Error::Config` for unknown schemes or a missing anon key.
pub fn open(url: &str, anon_key: Option<&str>) -> Result<SharedBackend> {
    if let Some(path) = url.strip_prefix("sqlite:") {
        let backend = if path == ":memory:" {
            SqliteBackend::open_memory()?
        } else {
            SqliteBackend::open(Path::new(path))?
        };
        return Ok(Arc::new(backend));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        let key = anon_key.filter(|k| !k.is_empty()).ok_or_else(|| {
            Error::Config("hosted backend requires an anon key (OPERATOR_ANON_KEY)".into())
        })?;
        return Ok(Arc::new(RestBackend::new(url, key)?));
    }

    Err(Error::Config(format!(
        "Unsupported backend URL '{url}': expected https://… or sqlite:<path>"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_filter_eq() {
        let r = row(json!({"user_id": "u1", "date": "2024-05-01"}));
        assert!(Filter::eq("user_id", "u1").matches(&r));
        assert!(!Filter::eq("user_id", "u2").matches(&r));
        assert!(!Filter::eq("missing", "u1").matches(&r));
    }

    #[test]
    fn test_filter_gte_on_dates_and_numbers() {
        let r = row(json!({"date": "2024-05-01", "progress": 40}));
        assert!(Filter::gte("date", "2024-04-01").matches(&r));
        assert!(Filter::gte("date", "2024-05-01").matches(&r));
        assert!(!Filter::gte("date", "2024-06-01").matches(&r));
        assert!(Filter::gte("progress", 9).matches(&r));
    }

    #[test]
    fn test_change_event_row_prefers_new() {
        let event = ChangeEvent {
            table: "goals".into(),
            kind: ChangeKind::Delete,
            new: None,
            old: Some(row(json!({"id": "g1"}))),
        };
        assert_eq!(event.row().unwrap()["id"], "g1");
    }

    #[test]
    fn test_open_rejects_unknown_scheme() {
        assert!(matches!(open("ftp://x", None), Err(Error::Config(_))));
        assert!(matches!(open("https://example.com", None), Err(Error::Config(_))));
    }

    #[test]
    fn test_open_memory_sqlite() {
        let backend = open("sqlite::memory:", None).unwrap();
        assert_eq!(backend.name(), "sqlite");
    }
}
