//! Embedded backend on SQLite.
//!
//! Implements the whole [`Backend`] contract in-process:
//! - Password accounts (`auth_users`) with Argon2id hashes and bearer
//!   sessions (`auth_sessions`)
//! - The four planner tables, every statement scoped to the caller's
//!   `user_id`
//! - A change feed fanned out to subscribers after each write
//! - Named functions registered by the embedding application
//!
//! Columns are described once in [`TABLES`]; JSON columns are stored as
//! TEXT and decoded on the way out.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use super::migrations::run_migrations;
use super::{
    value_text, AuthSession, Backend, ChangeEvent, ChangeKind, Filter, Query, Row, Subscription,
};
use crate::error::{Error, Result};

// ── Table descriptions ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Integer,
    Bool,
    Json,
}

struct TableSpec {
    name: &'static str,
    columns: &'static [(&'static str, Kind)],
}

const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "operating_code",
        columns: &[
            ("id", Kind::Text),
            ("user_id", Kind::Text),
            ("principles", Kind::Json),
            ("daily_sacrifice", Kind::Text),
            ("daily_commitment", Kind::Text),
            ("comfort_refused", Kind::Text),
            ("created_at", Kind::Text),
            ("updated_at", Kind::Text),
        ],
    },
    TableSpec {
        name: "daily_plans",
        columns: &[
            ("id", Kind::Text),
            ("user_id", Kind::Text),
            ("date", Kind::Text),
            ("intention", Kind::Text),
            ("sacrifice", Kind::Text),
            ("comfort_refused", Kind::Text),
            ("tasks", Kind::Json),
            ("time_blocks", Kind::Json),
            ("end_of_day_review", Kind::Text),
            ("completed", Kind::Bool),
            ("created_at", Kind::Text),
            ("updated_at", Kind::Text),
        ],
    },
    TableSpec {
        name: "goals",
        columns: &[
            ("id", Kind::Text),
            ("user_id", Kind::Text),
            ("name", Kind::Text),
            ("why_it_matters", Kind::Text),
            ("success_metric", Kind::Text),
            ("deadline", Kind::Text),
            ("progress", Kind::Integer),
            ("goal_type", Kind::Text),
            ("quarter", Kind::Integer),
            ("created_at", Kind::Text),
            ("updated_at", Kind::Text),
        ],
    },
    TableSpec {
        name: "user_profiles",
        columns: &[
            ("id", Kind::Text),
            ("user_id", Kind::Text),
            ("display_name", Kind::Text),
            ("timezone", Kind::Text),
            ("streak", Kind::Integer),
            ("created_at", Kind::Text),
            ("updated_at", Kind::Text),
        ],
    },
];

fn table_spec(table: &str) -> Result<&'static TableSpec> {
    TABLES
        .iter()
        .find(|t| t.name == table)
        .ok_or_else(|| Error::Backend(format!("relation \"{table}\" does not exist")))
}

impl TableSpec {
    fn kind(&self, column: &str) -> Result<Kind> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                Error::Backend(format!(
                    "column \"{column}\" of relation \"{}\" does not exist",
                    self.name
                ))
            })
    }

    fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn to_sql(kind: Kind, value: &Value) -> SqlValue {
    match (kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (Kind::Json, v) => SqlValue::Text(v.to_string()),
        (Kind::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (Kind::Bool | Kind::Integer, Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .map_or(SqlValue::Null, SqlValue::Integer),
        (Kind::Integer, Value::String(s)) => s.parse().map_or(SqlValue::Null, SqlValue::Integer),
        (_, v) => SqlValue::Text(value_text(v)),
    }
}

fn from_sql(kind: Kind, value: SqlValue) -> Value {
    match (kind, value) {
        (_, SqlValue::Null) => Value::Null,
        (Kind::Bool, SqlValue::Integer(i)) => Value::Bool(i != 0),
        (_, SqlValue::Integer(i)) => Value::from(i),
        (_, SqlValue::Real(f)) => Value::from(f),
        (Kind::Json, SqlValue::Text(s)) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        (_, SqlValue::Text(s)) => Value::String(s),
        (_, SqlValue::Blob(b)) => Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn rls_violation(table: &str) -> Error {
    Error::Auth(format!("new row violates row-level security policy for table \"{table}\""))
}

// ── Backend ───────────────────────────────────────────────────

/// Caller identity handed to function handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionContext {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

type FunctionHandler = Box<dyn Fn(&FunctionContext, Value) -> Result<Value> + Send + Sync>;

struct Subscriber {
    table: String,
    user_id: String,
    filter: Filter,
    tx: Sender<ChangeEvent>,
}

/// In-process backend on a SQLite database.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    subscribers: Mutex<Vec<Subscriber>>,
    functions: RwLock<HashMap<String, FunctionHandler>>,
}

impl SqliteBackend {
    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        info!(path = %path.display(), "Opened embedded backend");
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(Vec::new()),
            functions: RwLock::new(HashMap::new()),
        })
    }

    /// Register a named function callable through [`Backend::invoke`].
    pub fn register_function<F>(&self, name: &str, handler: F)
    where
        F: Fn(&FunctionContext, Value) -> Result<Value> + Send + Sync + 'static,
    {
        if let Ok(mut functions) = self.functions.write() {
            functions.insert(name.to_string(), Box::new(handler));
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("embedded backend lock poisoned".into()))
    }

    /// Resolve the user behind a session token.
    fn user_for(conn: &Connection, session: &AuthSession) -> Result<String> {
        let user_id: Option<String> = conn
            .query_row(
                "SELECT user_id FROM auth_sessions WHERE access_token = ?1",
                [&session.access_token],
                |row| row.get(0),
            )
            .optional()?;

        match user_id {
            Some(id) if id == session.user_id => Ok(id),
            _ => Err(Error::NotAuthenticated),
        }
    }

    fn create_session(conn: &Connection, user_id: &str, email: &str) -> Result<AuthSession> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        conn.execute(
            "INSERT INTO auth_sessions (access_token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, now_ts()],
        )?;
        Ok(AuthSession {
            user_id: user_id.to_string(),
            email: email.to_string(),
            access_token: token,
            refresh_token: None,
            expires_at: None,
        })
    }

    fn read_rows(
        conn: &Connection,
        spec: &TableSpec,
        clause: &str,
        params: &[SqlValue],
        order: Option<&(String, bool)>,
    ) -> Result<Vec<Row>> {
        let order_sql = match order {
            Some((column, desc)) => {
                spec.kind(column)?;
                let dir = if *desc { "DESC" } else { "ASC" };
                format!(" ORDER BY {column} {dir}, rowid {dir}")
            }
            None => " ORDER BY rowid".to_string(),
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE {clause}{order_sql}",
            spec.select_list(),
            spec.name
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |r| {
                let mut map = Row::new();
                for (i, (name, kind)) in spec.columns.iter().enumerate() {
                    let value: SqlValue = r.get(i)?;
                    map.insert((*name).to_string(), from_sql(*kind, value));
                }
                Ok(map)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// `user_id = ? AND <filters>` with bound parameters.
    fn scoped_clause(spec: &TableSpec, user_id: &str, filters: &[Filter]) -> Result<(String, Vec<SqlValue>)> {
        let mut clause = String::from("user_id = ?");
        let mut params = vec![SqlValue::Text(user_id.to_string())];

        for filter in filters {
            let kind = spec.kind(filter.column())?;
            let op = match filter {
                Filter::Eq(..) => "=",
                Filter::Gte(..) => ">=",
            };
            clause.push_str(&format!(" AND {} {op} ?", filter.column()));
            params.push(to_sql(kind, filter.value()));
        }

        Ok((clause, params))
    }

    /// Prepare a row for writing: check columns, pin `user_id`, fill
    /// generated columns.
    fn prepare_row(spec: &TableSpec, user_id: &str, mut row: Row) -> Result<Row> {
        for column in row.keys() {
            spec.kind(column)?;
        }

        match row.get("user_id") {
            Some(Value::String(owner)) if owner != user_id => return Err(rls_violation(spec.name)),
            _ => {}
        }
        row.insert("user_id".into(), Value::from(user_id));

        if !matches!(row.get("id"), Some(Value::String(_))) {
            row.insert("id".into(), Value::from(uuid::Uuid::new_v4().to_string()));
        }
        let now = now_ts();
        row.entry("created_at").or_insert_with(|| Value::from(now.clone()));
        row.insert("updated_at".into(), Value::from(now));

        Ok(row)
    }

    fn bind_row(spec: &TableSpec, row: &Row) -> Result<(Vec<String>, Vec<SqlValue>)> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (column, value) in row {
            values.push(to_sql(spec.kind(column)?, value));
            columns.push(column.clone());
        }
        Ok((columns, values))
    }

    fn by_id(conn: &Connection, spec: &TableSpec, user_id: &str, id: &Value) -> Result<Option<Row>> {
        let rows = Self::read_rows(
            conn,
            spec,
            "user_id = ? AND id = ?",
            &[SqlValue::Text(user_id.to_string()), SqlValue::Text(value_text(id))],
            None,
        )?;
        Ok(rows.into_iter().next())
    }

    /// Deliver events to matching subscribers, dropping closed feeds.
    fn emit(&self, user_id: &str, events: Vec<ChangeEvent>) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };

        for event in events {
            let Some(row) = event.row() else { continue };
            subscribers.retain(|s| {
                if s.table != event.table || s.user_id != user_id || !s.filter.matches(row) {
                    return true;
                }
                s.tx.send(event.clone()).is_ok()
            });
        }
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let conn = self.conn()?;
        let user: Option<(String, String, String)> = conn
            .query_row(
                "SELECT id, email, password_hash FROM auth_users WHERE email = ?1",
                [email.trim()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((id, stored_email, hash)) = user else {
            return Err(Error::Auth("Invalid login credentials".into()));
        };
        if !verify_password(password, &hash) {
            return Err(Error::Auth("Invalid login credentials".into()));
        }

        info!(user_id = %id, "Signed in");
        Self::create_session(&conn, &id, &stored_email)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(Error::Auth("Unable to validate email address: invalid format".into()));
        }
        if password.len() < 6 {
            return Err(Error::Auth("Password should be at least 6 characters".into()));
        }

        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM auth_users WHERE email = ?1)",
            [email],
            |row| row.get(0),
        )?;
        if exists {
            return Err(Error::Auth("User already registered".into()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO auth_users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, email, hash_password(password)?, now_ts()],
        )?;

        info!(user_id = %id, "Account created");
        Self::create_session(&conn, &id, email)
    }

    fn sign_out(&self, session: &AuthSession) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM auth_sessions WHERE access_token = ?1",
            [&session.access_token],
        )?;
        drop(conn);

        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|s| s.user_id != session.user_id);
        }
        Ok(())
    }

    fn select(&self, session: &AuthSession, query: &Query) -> Result<Vec<Row>> {
        let spec = table_spec(&query.table)?;
        let conn = self.conn()?;
        let user_id = Self::user_for(&conn, session)?;
        let (clause, params) = Self::scoped_clause(spec, &user_id, &query.filters)?;
        Self::read_rows(&conn, spec, &clause, &params, query.order.as_ref())
    }

    fn insert(&self, session: &AuthSession, table: &str, row: Row) -> Result<Row> {
        let spec = table_spec(table)?;
        let conn = self.conn()?;
        let user_id = Self::user_for(&conn, session)?;
        let row = Self::prepare_row(spec, &user_id, row)?;

        let (columns, values) = Self::bind_row(spec, &row)?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        conn.execute(
            &format!("INSERT INTO {table} ({}) VALUES ({placeholders})", columns.join(", ")),
            params_from_iter(values.iter()),
        )?;

        let stored = Self::by_id(&conn, spec, &user_id, &row["id"])?
            .ok_or_else(|| Error::Backend(format!("inserted row missing from {table}")))?;
        drop(conn);

        debug!(table, "Inserted row");
        self.emit(
            &user_id,
            vec![ChangeEvent {
                table: table.to_string(),
                kind: ChangeKind::Insert,
                new: Some(stored.clone()),
                old: None,
            }],
        );
        Ok(stored)
    }

    fn upsert(&self, session: &AuthSession, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row> {
        let spec = table_spec(table)?;
        if on_conflict.is_empty() {
            return Err(Error::InvalidArgument("upsert needs at least one conflict column".into()));
        }

        let conn = self.conn()?;
        let user_id = Self::user_for(&conn, session)?;
        let row = Self::prepare_row(spec, &user_id, row)?;

        // Locate the conflicting row across all users so a key owned by
        // someone else is rejected instead of overwritten.
        let mut key_clause = Vec::with_capacity(on_conflict.len());
        let mut key_params = Vec::with_capacity(on_conflict.len());
        for column in on_conflict {
            let kind = spec.kind(column)?;
            let value = row.get(*column).cloned().unwrap_or(Value::Null);
            key_clause.push(format!("{column} = ?"));
            key_params.push(to_sql(kind, &value));
        }
        let key_clause = key_clause.join(" AND ");

        let existing: Option<(String, String)> = conn
            .query_row(
                &format!("SELECT id, user_id FROM {table} WHERE {key_clause}"),
                params_from_iter(key_params.iter()),
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        if let Some((_, owner)) = &existing {
            if *owner != user_id {
                return Err(rls_violation(table));
            }
        }
        // The insert half needs every NOT NULL column even when it conflicts;
        // the stored row keeps its id and created_at via the update set.
        let target_id = existing
            .as_ref()
            .map_or_else(|| row["id"].clone(), |(id, _)| Value::from(id.as_str()));

        let (columns, values) = Self::bind_row(spec, &row)?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !on_conflict.contains(&c.as_str()) && *c != "id" && *c != "created_at")
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();

        conn.execute(
            &format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders}) ON CONFLICT({}) DO UPDATE SET {}",
                columns.join(", "),
                on_conflict.join(", "),
                updates.join(", ")
            ),
            params_from_iter(values.iter()),
        )?;

        let stored = Self::by_id(&conn, spec, &user_id, &target_id)?
            .ok_or_else(|| Error::Backend(format!("upserted row missing from {table}")))?;
        drop(conn);

        let kind = if existing.is_some() {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        debug!(table, ?kind, "Upserted row");
        self.emit(
            &user_id,
            vec![ChangeEvent {
                table: table.to_string(),
                kind,
                new: Some(stored.clone()),
                old: None,
            }],
        );
        Ok(stored)
    }

    fn update(&self, session: &AuthSession, table: &str, filters: &[Filter], mut patch: Row) -> Result<()> {
        let spec = table_spec(table)?;
        let conn = self.conn()?;
        let user_id = Self::user_for(&conn, session)?;

        patch.remove("id");
        patch.remove("created_at");
        match patch.remove("user_id") {
            Some(Value::String(owner)) if owner != user_id => return Err(rls_violation(table)),
            _ => {}
        }
        patch.insert("updated_at".into(), Value::from(now_ts()));

        let (clause, where_params) = Self::scoped_clause(spec, &user_id, filters)?;
        let targets = Self::read_rows(&conn, spec, &clause, &where_params, None)?;
        if targets.is_empty() {
            return Ok(());
        }

        let (columns, mut values) = Self::bind_row(spec, &patch)?;
        let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
        values.extend(where_params);
        conn.execute(
            &format!("UPDATE {table} SET {} WHERE {clause}", assignments.join(", ")),
            params_from_iter(values.iter()),
        )?;

        let mut events = Vec::with_capacity(targets.len());
        for old in targets {
            if let Some(new) = Self::by_id(&conn, spec, &user_id, &old["id"])? {
                events.push(ChangeEvent {
                    table: table.to_string(),
                    kind: ChangeKind::Update,
                    new: Some(new),
                    old: Some(old),
                });
            }
        }
        drop(conn);

        debug!(table, rows = events.len(), "Updated rows");
        self.emit(&user_id, events);
        Ok(())
    }

    fn delete(&self, session: &AuthSession, table: &str, filters: &[Filter]) -> Result<()> {
        let spec = table_spec(table)?;
        let conn = self.conn()?;
        let user_id = Self::user_for(&conn, session)?;

        let (clause, params) = Self::scoped_clause(spec, &user_id, filters)?;
        let targets = Self::read_rows(&conn, spec, &clause, &params, None)?;
        conn.execute(
            &format!("DELETE FROM {table} WHERE {clause}"),
            params_from_iter(params.iter()),
        )?;
        drop(conn);

        debug!(table, rows = targets.len(), "Deleted rows");
        let events = targets
            .into_iter()
            .map(|old| ChangeEvent {
                table: table.to_string(),
                kind: ChangeKind::Delete,
                new: None,
                old: Some(old),
            })
            .collect();
        self.emit(&user_id, events);
        Ok(())
    }

    fn subscribe(&self, session: &AuthSession, table: &str, filter: Filter) -> Result<Subscription> {
        let spec = table_spec(table)?;
        spec.kind(filter.column())?;
        let user_id = {
            let conn = self.conn()?;
            Self::user_for(&conn, session)?
        };

        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .map_err(|_| Error::Other("embedded backend lock poisoned".into()))?
            .push(Subscriber {
                table: table.to_string(),
                user_id,
                filter,
                tx,
            });

        Ok(Subscription::new(table, rx))
    }

    fn invoke(&self, session: Option<&AuthSession>, function: &str, body: Value) -> Result<Value> {
        let context = match session {
            Some(session) => {
                let conn = self.conn()?;
                let user_id = Self::user_for(&conn, session)?;
                let email: Option<String> = conn
                    .query_row("SELECT email FROM auth_users WHERE id = ?1", [&user_id], |r| r.get(0))
                    .optional()?;
                FunctionContext {
                    user_id: Some(user_id),
                    email,
                }
            }
            None => FunctionContext::default(),
        };

        let functions = self
            .functions
            .read()
            .map_err(|_| Error::Other("embedded backend lock poisoned".into()))?;
        let handler = functions
            .get(function)
            .ok_or_else(|| Error::Backend(format!("Function not found: {function}")))?;

        debug!(function, "Invoking function");
        handler(&context, body)
    }
}

/// Argon2id hash in PHC format; the salt travels inside the string.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Backend(format!("Failed to hash password: {e}")))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .is_ok_and(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
