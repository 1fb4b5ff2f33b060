//! Subscription status and payment calls.
//!
//! Billing is handled by two backend functions:
//! - `manage-subscription` with `action` = `get-status` | `cancel`
//! - `create-subscription` with `action` = `create-setup-intent` |
//!   `activate-subscription`
//!
//! A response body carrying an `error` string is a failure. Nothing is
//! retried.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::backend::{functions, AuthSession, SharedBackend};
use crate::error::{Error, Result};

/// Subscription plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Business,
}

impl Plan {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Business => "business",
        }
    }

    /// Parse a plan name, `None` if unknown.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "business" => Some(Self::Business),
            _ => None,
        }
    }
}

/// Billing state of a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingState {
    Active,
    #[default]
    Inactive,
    Canceled,
    PastDue,
    Trialing,
}

impl BillingState {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "canceled" => Some(Self::Canceled),
            "past_due" => Some(Self::PastDue),
            "trialing" => Some(Self::Trialing),
            _ => None,
        }
    }
}

/// A user's subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub has_subscription: bool,
    pub plan: Plan,
    pub status: BillingState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn is_pro(&self) -> bool {
        self.plan == Plan::Pro && self.status == BillingState::Active
    }

    #[must_use]
    pub fn is_business(&self) -> bool {
        self.plan == Plan::Business && self.status == BillingState::Active
    }

    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.is_pro() || self.is_business()
    }

    #[must_use]
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end.and_then(DateTime::from_timestamp_millis)
    }

    /// Active pro access granted to allowlisted accounts.
    #[must_use]
    pub fn admin_bypass(now: DateTime<Utc>) -> Self {
        Self {
            has_subscription: true,
            plan: Plan::Pro,
            status: BillingState::Active,
            subscription_id: Some("admin-bypass".into()),
            customer_id: Some("admin".into()),
            current_period_end: Some((now + Duration::days(365)).timestamp_millis()),
            cancel_at_period_end: false,
        }
    }

    /// Read a `get-status` response; unknown or missing values take
    /// their defaults.
    #[must_use]
    pub fn from_response(data: &Value) -> Self {
        let text = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            has_subscription: data.get("hasSubscription").and_then(Value::as_bool).unwrap_or(false),
            plan: text("plan").and_then(|p| Plan::parse(&p)).unwrap_or_default(),
            status: text("status").and_then(|s| BillingState::parse(&s)).unwrap_or_default(),
            subscription_id: text("subscriptionId"),
            customer_id: text("customerId"),
            current_period_end: data.get("currentPeriodEnd").and_then(Value::as_i64),
            cancel_at_period_end: data
                .get("cancelAtPeriodEnd")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Status lookup result: a lookup failure still yields a usable
/// (free) status alongside the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub subscription: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Setup intent returned when starting a paid plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupIntent {
    pub client_secret: String,
    pub customer_id: String,
}

fn check_body(body: Value) -> Result<Value> {
    match body.get("error") {
        Some(Value::String(message)) => Err(Error::Payment(message.clone())),
        Some(Value::Object(obj)) => Err(Error::Payment(
            obj.get("message")
                .and_then(Value::as_str)
                .unwrap_or("Payment request failed")
                .to_string(),
        )),
        _ => Ok(body),
    }
}

/// Payment function client.
pub struct BillingClient {
    backend: SharedBackend,
    admin_emails: Vec<String>,
}

impl BillingClient {
    /// `admin_emails` are compared case-insensitively.
    #[must_use]
    pub fn new(backend: SharedBackend, admin_emails: &[String]) -> Self {
        Self {
            backend,
            admin_emails: admin_emails.iter().map(|e| e.trim().to_lowercase()).collect(),
        }
    }

    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }

    fn invoke(&self, session: Option<&AuthSession>, function: &str, body: Value) -> Result<Value> {
        debug!(function, "Calling payment function");
        let body = self.backend.invoke(session, function, body).map_err(|e| match e {
            Error::Backend(message) => Error::Payment(message),
            other => other,
        })?;
        check_body(body)
    }

    /// Current subscription for `email`.
    #[must_use]
    pub fn status(&self, session: Option<&AuthSession>, email: Option<&str>) -> StatusReport {
        let Some(email) = email.filter(|e| !e.trim().is_empty()) else {
            return StatusReport::default();
        };

        if self.is_admin(email) {
            return StatusReport {
                subscription: SubscriptionStatus::admin_bypass(Utc::now()),
                error: None,
            };
        }

        let body = json!({ "action": "get-status", "email": email });
        match self.invoke(session, functions::MANAGE_SUBSCRIPTION, body) {
            Ok(data) => StatusReport {
                subscription: SubscriptionStatus::from_response(&data),
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "Subscription lookup failed");
                StatusReport {
                    subscription: SubscriptionStatus::default(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Cancel at period end.
    ///
    /// # Errors
    ///
    /// Returns `Payment` if there is no subscription or the call fails.
    pub fn cancel(&self, session: Option<&AuthSession>, current: &SubscriptionStatus) -> Result<SubscriptionStatus> {
        let id = current
            .subscription_id
            .as_deref()
            .ok_or_else(|| Error::Payment("No active subscription found".into()))?;

        let body = json!({ "action": "cancel", "subscriptionId": id });
        self.invoke(session, functions::MANAGE_SUBSCRIPTION, body)?;

        Ok(SubscriptionStatus {
            cancel_at_period_end: true,
            ..current.clone()
        })
    }

    /// Start a paid plan: returns the client secret for card collection.
    ///
    /// # Errors
    ///
    /// Returns `Payment` if the call fails or the response is incomplete.
    pub fn create_setup_intent(&self, session: Option<&AuthSession>, email: &str, plan: Plan) -> Result<SetupIntent> {
        let body = json!({ "action": "create-setup-intent", "email": email, "plan": plan.as_str() });
        let data = self.invoke(session, functions::CREATE_SUBSCRIPTION, body)?;
        serde_json::from_value(data)
            .map_err(|e| Error::Payment(format!("Failed to initialize payment: {e}")))
    }

    /// Activate a plan for a customer whose card was collected.
    ///
    /// # Errors
    ///
    /// Returns `Payment` if the call fails.
    pub fn activate(&self, session: Option<&AuthSession>, customer_id: &str, plan: Plan) -> Result<()> {
        let body = json!({
            "action": "activate-subscription",
            "customerId": customer_id,
            "plan": plan.as_str(),
        });
        self.invoke(session, functions::CREATE_SUBSCRIPTION, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, SqliteBackend};
    use std::sync::Arc;

    fn backend() -> Arc<SqliteBackend> {
        let backend = Arc::new(SqliteBackend::open_memory().unwrap());
        backend.register_function(functions::MANAGE_SUBSCRIPTION, |ctx, body| {
            match body["action"].as_str() {
                Some("get-status") if body["email"] == "paid@example.com" => Ok(json!({
                    "hasSubscription": true,
                    "plan": "business",
                    "status": "active",
                    "subscriptionId": "sub_1",
                    "customerId": "cus_1",
                    "currentPeriodEnd": 1_700_000_000_000_i64,
                })),
                Some("get-status") => Ok(json!({ "error": "Customer not found" })),
                Some("cancel") if ctx.user_id.is_some() => Ok(json!({ "success": true })),
                _ => Ok(json!({ "error": "Unauthorized" })),
            }
        });
        backend.register_function(functions::CREATE_SUBSCRIPTION, |_, body| {
            match body["action"].as_str() {
                Some("create-setup-intent") => Ok(json!({ "clientSecret": "seti_secret", "customerId": "cus_9" })),
                Some("activate-subscription") if body["customerId"] == "cus_9" => Ok(json!({ "success": true })),
                _ => Ok(json!({ "error": "Invalid customer" })),
            }
        });
        backend
    }

    fn client(backend: Arc<SqliteBackend>) -> BillingClient {
        BillingClient::new(backend, &["Boss@Example.com".to_string()])
    }

    #[test]
    fn test_admin_bypass_is_case_insensitive() {
        let billing = client(backend());
        let report = billing.status(None, Some("boss@example.COM"));
        assert!(report.subscription.is_pro());
        assert_eq!(report.subscription.subscription_id.as_deref(), Some("admin-bypass"));
        let end = report.subscription.period_end().unwrap();
        assert!(end > Utc::now() + Duration::days(364));
    }

    #[test]
    fn test_status_from_function() {
        let billing = client(backend());
        let report = billing.status(None, Some("paid@example.com"));
        assert!(report.error.is_none());
        assert!(report.subscription.is_business());
        assert!(report.subscription.is_paid());
        assert!(!report.subscription.is_pro());
    }

    #[test]
    fn test_status_error_degrades_to_free() {
        let billing = client(backend());
        let report = billing.status(None, Some("nobody@example.com"));
        assert_eq!(report.subscription, SubscriptionStatus::default());
        assert_eq!(report.error.as_deref(), Some("Payment error: Customer not found"));

        assert_eq!(billing.status(None, None), StatusReport::default());
    }

    #[test]
    fn test_cancel_requires_subscription() {
        let billing = client(backend());
        let result = billing.cancel(None, &SubscriptionStatus::default());
        assert!(matches!(result, Err(Error::Payment(m)) if m == "No active subscription found"));
    }

    #[test]
    fn test_cancel_marks_period_end() {
        let backend = backend();
        let session = backend.sign_up("paid@example.com", "secret1").unwrap();
        let billing = client(backend);

        let current = billing.status(Some(&session), Some("paid@example.com")).subscription;
        let canceled = billing.cancel(Some(&session), &current).unwrap();
        assert!(canceled.cancel_at_period_end);
        assert_eq!(canceled.plan, Plan::Business);

        let anonymous = billing.cancel(None, &current);
        assert!(matches!(anonymous, Err(Error::Payment(m)) if m == "Unauthorized"));
    }

    #[test]
    fn test_setup_and_activate() {
        let billing = client(backend());
        let intent = billing.create_setup_intent(None, "a@example.com", Plan::Pro).unwrap();
        assert_eq!(intent.customer_id, "cus_9");
        billing.activate(None, &intent.customer_id, Plan::Pro).unwrap();
        assert!(billing.activate(None, "cus_other", Plan::Pro).is_err());
    }

    #[test]
    fn test_unknown_values_take_defaults() {
        let status = SubscriptionStatus::from_response(&json!({ "plan": "enterprise", "status": "weird" }));
        assert_eq!(status.plan, Plan::Free);
        assert_eq!(status.status, BillingState::Inactive);
    }
}
