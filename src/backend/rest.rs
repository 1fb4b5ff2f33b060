//! HTTP backend for the hosted service.
//!
//! Speaks the hosted service's REST dialect:
//! - `POST /auth/v1/token?grant_type=password`, `/auth/v1/signup`, `/auth/v1/logout`
//! - `/rest/v1/<table>` with `col=eq.v` / `col=gte.v` filters, `order=`,
//!   `on_conflict=` and `Prefer` headers
//! - `POST /functions/v1/<name>`
//!
//! Calls are async (reqwest) and driven to completion on a runtime owned
//! by the backend, so the trait surface stays synchronous. The change
//! feed is a polling diff (see [`super::poll`]).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{
    poll, value_text, AuthSession, Backend, Filter, Query, Row, Subscription,
};
use crate::error::{Error, Result};

/// Change-feed polling interval.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Client for the hosted backend.
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    runtime: Arc<tokio::runtime::Runtime>,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// Pull the human message out of an error body.
fn error_message(body: &Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn filter_param(filter: &Filter) -> (String, String) {
    let op = match filter {
        Filter::Eq(..) => "eq",
        Filter::Gte(..) => "gte",
    };
    (filter.column().to_string(), format!("{op}.{}", value_text(filter.value())))
}

impl RestBackend {
    /// Create a client for `base_url` authenticating with the anon key.
    ///
    /// # Errors
    ///
    /// Returns an error if the async runtime cannot be started.
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            runtime: Arc::new(runtime),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key);
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .timeout(Duration::from_secs(30))
    }

    /// Send a request and decode the JSON body (empty body → `null`).
    fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Value)> {
        self.runtime.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            let body = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            };
            Ok::<_, Error>((status, body))
        })
    }

    /// Send a data request; non-success statuses become errors.
    fn send_data(&self, request: RequestBuilder) -> Result<Value> {
        let (status, body) = self.send(request)?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::NotAuthenticated);
        }
        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| status.to_string());
            return Err(Error::Backend(message));
        }
        Ok(body)
    }

    fn auth_request(&self, path: &str, email: &str, password: &str) -> Result<AuthSession> {
        let request = self
            .request(Method::POST, path, None)
            .json(&serde_json::json!({ "email": email, "password": password }));
        let (status, body) = self.send(request)?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| status.to_string());
            return Err(Error::Auth(message));
        }

        let token: TokenResponse = serde_json::from_value(body)?;
        let access_token = token.access_token.ok_or_else(|| {
            Error::Auth("Check your email to confirm your account, then sign in".into())
        })?;
        let user = token
            .user
            .ok_or_else(|| Error::Auth("Auth response did not include a user".into()))?;

        Ok(AuthSession {
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
            access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }

    fn table_path(table: &str) -> String {
        format!("/rest/v1/{table}")
    }

    fn first_row(body: Value, table: &str) -> Result<Row> {
        match body {
            Value::Array(rows) => match rows.into_iter().next() {
                Some(Value::Object(row)) => Ok(row),
                _ => Err(Error::Backend(format!("{table}: write returned no row"))),
            },
            Value::Object(row) => Ok(row),
            other => Err(Error::Backend(format!("{table}: unexpected response {other}"))),
        }
    }
}

impl Backend for RestBackend {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self.auth_request("/auth/v1/token?grant_type=password", email, password)?;
        info!(user_id = %session.user_id, "Signed in");
        Ok(session)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self.auth_request("/auth/v1/signup", email, password)?;
        info!(user_id = %session.user_id, "Account created");
        Ok(session)
    }

    fn sign_out(&self, session: &AuthSession) -> Result<()> {
        let request = self.request(Method::POST, "/auth/v1/logout", Some(&session.access_token));
        let (status, body) = self.send(request)?;
        // An already-expired token is as good as signed out
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(Error::Auth(error_message(&body).unwrap_or_else(|| status.to_string())))
        }
    }

    fn select(&self, session: &AuthSession, query: &Query) -> Result<Vec<Row>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.filters.iter().map(filter_param));
        if let Some((column, desc)) = &query.order {
            let dir = if *desc { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{column}.{dir}")));
        }

        let request = self
            .request(Method::GET, &Self::table_path(&query.table), Some(&session.access_token))
            .query(&params);
        let body = self.send_data(request)?;
        debug!(table = %query.table, "Selected rows");

        match body {
            Value::Array(rows) => Ok(rows
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::Backend(format!("{}: unexpected response {other}", query.table))),
        }
    }

    fn insert(&self, session: &AuthSession, table: &str, row: Row) -> Result<Row> {
        let request = self
            .request(Method::POST, &Self::table_path(table), Some(&session.access_token))
            .header("Prefer", "return=representation")
            .json(&row);
        Self::first_row(self.send_data(request)?, table)
    }

    fn upsert(&self, session: &AuthSession, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row> {
        let request = self
            .request(Method::POST, &Self::table_path(table), Some(&session.access_token))
            .query(&[("on_conflict", on_conflict.join(","))])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row);
        Self::first_row(self.send_data(request)?, table)
    }

    fn update(&self, session: &AuthSession, table: &str, filters: &[Filter], patch: Row) -> Result<()> {
        let params: Vec<_> = filters.iter().map(filter_param).collect();
        let request = self
            .request(Method::PATCH, &Self::table_path(table), Some(&session.access_token))
            .query(&params)
            .header("Prefer", "return=minimal")
            .json(&patch);
        self.send_data(request).map(|_| ())
    }

    fn delete(&self, session: &AuthSession, table: &str, filters: &[Filter]) -> Result<()> {
        let params: Vec<_> = filters.iter().map(filter_param).collect();
        let request = self
            .request(Method::DELETE, &Self::table_path(table), Some(&session.access_token))
            .query(&params);
        self.send_data(request).map(|_| ())
    }

    fn subscribe(&self, session: &AuthSession, table: &str, filter: Filter) -> Result<Subscription> {
        let query = Query::table(table).filter(filter);
        let initial = poll::snapshot(self.select(session, &query)?);

        let backend = self.clone();
        let session = session.clone();
        Ok(poll::spawn(table, POLL_INTERVAL, initial, move || {
            backend.select(&session, &query)
        }))
    }

    fn invoke(&self, session: Option<&AuthSession>, function: &str, body: Value) -> Result<Value> {
        let token = session.map(|s| s.access_token.as_str());
        let request = self
            .request(Method::POST, &format!("/functions/v1/{function}"), token)
            .json(&body);
        let (status, body) = self.send(request)?;
        debug!(function, status = status.as_u16(), "Invoked function");

        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::Backend(error_message(&body).unwrap_or_else(|| status.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_keys() {
        assert_eq!(
            error_message(&json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(error_message(&json!({"msg": "nope"})), Some("nope".to_string()));
        assert_eq!(error_message(&json!({"code": 1})), None);
    }

    #[test]
    fn test_filter_params() {
        assert_eq!(
            filter_param(&Filter::eq("user_id", "u1")),
            ("user_id".to_string(), "eq.u1".to_string())
        );
        assert_eq!(
            filter_param(&Filter::gte("date", "2024-05-01")),
            ("date".to_string(), "gte.2024-05-01".to_string())
        );
    }

    #[test]
    fn test_first_row_shapes() {
        let row = RestBackend::first_row(json!([{"id": "g1"}]), "goals").unwrap();
        assert_eq!(row["id"], "g1");
        assert!(RestBackend::first_row(json!([]), "goals").is_err());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let backend = RestBackend::new("https://example.supabase.co/", "anon").unwrap();
        assert_eq!(backend.base_url, "https://example.supabase.co");
        assert_eq!(backend.name(), "rest");
    }
}
