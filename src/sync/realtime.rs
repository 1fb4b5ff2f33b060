//! Realtime change application.
//!
//! Three feeds are opened per signed-in user. Events queue in their
//! subscriptions and are applied to the in-memory state when drained:
//! - operating code: insert/update replaces the whole code
//! - daily plans: insert/update upserts by date, delete removes by date
//! - goals: any event triggers a full reload (handled by the store)
//!
//! There is no versioning; whichever write is applied last wins.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::backend::rows::{from_row, DailyPlanRow, OperatingCodeRow};
use crate::backend::{tables, AuthSession, Backend, ChangeEvent, ChangeKind, Filter, Subscription};
use crate::error::Result;
use crate::model::PlannerState;

/// The three open feeds of a signed-in user.
#[derive(Debug)]
pub struct Subscriptions {
    pub operating_code: Subscription,
    pub daily_plans: Subscription,
    pub goals: Subscription,
}

impl Subscriptions {
    /// Open all three feeds filtered to the session's user.
    ///
    /// # Errors
    ///
    /// Returns the first feed that fails to open.
    pub fn open(backend: &dyn Backend, session: &AuthSession) -> Result<Self> {
        let by_user = || Filter::eq("user_id", session.user_id.as_str());
        Ok(Self {
            operating_code: backend.subscribe(session, tables::OPERATING_CODE, by_user())?,
            daily_plans: backend.subscribe(session, tables::DAILY_PLANS, by_user())?,
            goals: backend.subscribe(session, tables::GOALS, by_user())?,
        })
    }
}

/// Apply an operating-code event. Returns whether state changed.
pub fn apply_operating_code(state: &mut PlannerState, event: &ChangeEvent) -> bool {
    if event.kind == ChangeKind::Delete {
        return false;
    }
    let Some(row) = event.new.clone() else {
        return false;
    };

    match from_row::<OperatingCodeRow>(row) {
        Ok(row) => {
            state.operating_code = row.into_code();
            debug!("Applied operating code change");
            true
        }
        Err(e) => {
            warn!(error = %e, "Ignoring malformed operating code event");
            false
        }
    }
}

/// Apply a daily-plan event. Returns whether state changed.
pub fn apply_daily_plan(state: &mut PlannerState, event: &ChangeEvent) -> bool {
    match event.kind {
        ChangeKind::Insert | ChangeKind::Update => {
            let Some(row) = event.new.clone() else {
                return false;
            };
            match from_row::<DailyPlanRow>(row) {
                Ok(row) => {
                    let plan = row.into_plan();
                    debug!(date = %plan.date, "Applied daily plan change");
                    state.daily_plans.insert(plan.date, plan);
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed daily plan event");
                    false
                }
            }
        }
        ChangeKind::Delete => {
            let date = event
                .old
                .as_ref()
                .and_then(|row| row.get("date"))
                .and_then(serde_json::Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            match date {
                Some(date) => state.daily_plans.remove(&date).is_some(),
                None => {
                    warn!("Ignoring daily plan delete without a date");
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Row;
    use crate::model::DailyPlan;
    use serde_json::json;

    fn event(table: &str, kind: ChangeKind, new: Option<serde_json::Value>, old: Option<serde_json::Value>) -> ChangeEvent {
        let to_row = |v: serde_json::Value| -> Row { v.as_object().unwrap().clone() };
        ChangeEvent {
            table: table.into(),
            kind,
            new: new.map(to_row),
            old: old.map(to_row),
        }
    }

    #[test]
    fn test_operating_code_update_replaces() {
        let mut state = PlannerState::default();
        let e = event(
            "operating_code",
            ChangeKind::Update,
            Some(json!({"user_id": "u1", "principles": ["Only one"], "daily_commitment": "ship"})),
            None,
        );
        assert!(apply_operating_code(&mut state, &e));
        assert_eq!(state.operating_code.principles, vec!["Only one".to_string()]);
        assert_eq!(state.operating_code.daily_commitment, "ship");
    }

    #[test]
    fn test_daily_plan_upsert_and_delete_by_date() {
        let mut state = PlannerState::default();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        state.daily_plans.insert(date, DailyPlan::new(date));

        let update = event(
            "daily_plans",
            ChangeKind::Update,
            Some(json!({"user_id": "u1", "date": "2024-05-01", "intention": "remote"})),
            None,
        );
        assert!(apply_daily_plan(&mut state, &update));
        assert_eq!(state.daily_plans[&date].intention, "remote");

        let delete = event(
            "daily_plans",
            ChangeKind::Delete,
            None,
            Some(json!({"user_id": "u1", "date": "2024-05-01"})),
        );
        assert!(apply_daily_plan(&mut state, &delete));
        assert!(state.daily_plans.is_empty());
    }

    #[test]
    fn test_malformed_event_is_ignored() {
        let mut state = PlannerState::default();
        let e = event("daily_plans", ChangeKind::Insert, Some(json!({"date": "not a date"})), None);
        assert!(!apply_daily_plan(&mut state, &e));
        assert!(state.daily_plans.is_empty());
    }
}
