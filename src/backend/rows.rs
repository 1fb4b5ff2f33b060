//! Typed rows for the remote schema and their model conversions.
//!
//! Remote columns are snake_case and may come back as `null`; the
//! planner models are camelCase with defaults. Each row type owns the
//! mapping in both directions.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::Row;
use crate::error::{Error, Result};
use crate::model::{
    default_principles, default_time_blocks, DailyPlan, Goal, GoalPatch, GoalType, NewGoal,
    OperatingCode, Task, TimeBlock,
};

/// Treat an explicit `null` like a missing value.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Write an empty text column as null.
fn empty_as_null(value: &str) -> Value {
    if value.is_empty() {
        Value::Null
    } else {
        Value::from(value)
    }
}

fn serialize_empty_as_null<S: Serializer>(value: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    empty_as_null(value).serialize(serializer)
}

/// Serialize a typed row into a column map.
///
/// # Errors
///
/// Returns an error if the value does not serialize to a JSON object.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Other(format!("expected an object row, got {other}"))),
    }
}

/// Deserialize a column map into a typed row.
///
/// # Errors
///
/// Returns an error if required columns are missing or mistyped.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

// ── operating_code ────────────────────────────────────────────

/// `operating_code(user_id unique, principles, daily_sacrifice, daily_commitment, comfort_refused)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingCodeRow {
    pub user_id: String,
    #[serde(default)]
    pub principles: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub daily_sacrifice: String,
    #[serde(default, deserialize_with = "nullable")]
    pub daily_commitment: String,
    #[serde(default, deserialize_with = "nullable")]
    pub comfort_refused: String,
}

impl OperatingCodeRow {
    /// Row for a user's operating code.
    #[must_use]
    pub fn from_code(user_id: &str, code: &OperatingCode) -> Self {
        Self {
            user_id: user_id.to_string(),
            principles: Some(code.principles.clone()),
            daily_sacrifice: code.daily_sacrifice.clone(),
            daily_commitment: code.daily_commitment.clone(),
            comfort_refused: code.comfort_refused.clone(),
        }
    }

    /// The row every new account is provisioned with.
    #[must_use]
    pub fn provisioned(user_id: &str) -> Self {
        Self::from_code(user_id, &OperatingCode::default())
    }

    #[must_use]
    pub fn into_code(self) -> OperatingCode {
        OperatingCode {
            principles: self.principles.unwrap_or_else(default_principles),
            daily_sacrifice: self.daily_sacrifice,
            daily_commitment: self.daily_commitment,
            comfort_refused: self.comfort_refused,
        }
    }
}

// ── daily_plans ───────────────────────────────────────────────

/// `daily_plans(user_id, date, …, tasks jsonb, time_blocks jsonb, unique(user_id, date))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPlanRow {
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "nullable")]
    pub intention: String,
    #[serde(default, deserialize_with = "nullable")]
    pub sacrifice: String,
    #[serde(default, deserialize_with = "nullable")]
    pub comfort_refused: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub time_blocks: Option<Vec<TimeBlock>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_of_day_review: String,
    #[serde(default, deserialize_with = "nullable")]
    pub completed: bool,
}

impl DailyPlanRow {
    /// Unique key columns for upserts.
    pub const CONFLICT: [&'static str; 2] = ["user_id", "date"];

    #[must_use]
    pub fn from_plan(user_id: &str, plan: &DailyPlan) -> Self {
        Self {
            user_id: user_id.to_string(),
            date: plan.date,
            intention: plan.intention.clone(),
            sacrifice: plan.sacrifice.clone(),
            comfort_refused: plan.comfort_refused.clone(),
            tasks: plan.tasks.clone(),
            time_blocks: Some(plan.time_blocks.clone()),
            end_of_day_review: plan.end_of_day_review.clone(),
            completed: plan.completed,
        }
    }

    /// Convert to the model; a row without blocks gets the default schedule.
    #[must_use]
    pub fn into_plan(self) -> DailyPlan {
        DailyPlan {
            date: self.date,
            intention: self.intention,
            sacrifice: self.sacrifice,
            comfort_refused: self.comfort_refused,
            tasks: self.tasks,
            time_blocks: self.time_blocks.unwrap_or_else(default_time_blocks),
            end_of_day_review: self.end_of_day_review,
            completed: self.completed,
        }
    }
}

// ── goals ─────────────────────────────────────────────────────

/// `goals(id, user_id, name, why_it_matters, success_metric, deadline, progress, goal_type, quarter)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub why_it_matters: String,
    #[serde(default, deserialize_with = "nullable")]
    pub success_metric: String,
    #[serde(default, deserialize_with = "nullable", serialize_with = "serialize_empty_as_null")]
    pub deadline: String,
    #[serde(default, deserialize_with = "nullable")]
    pub progress: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub goal_type: String,
    #[serde(default)]
    pub quarter: Option<i64>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

impl GoalRow {
    /// Row for a goal about to be inserted; the backend assigns the id.
    #[must_use]
    pub fn from_new(user_id: &str, goal: &NewGoal) -> Self {
        let goal = goal.clone().into_goal(String::new());
        Self {
            id: None,
            user_id: user_id.to_string(),
            name: goal.name,
            why_it_matters: goal.why_it_matters,
            success_metric: goal.success_metric,
            deadline: goal.deadline,
            progress: i64::from(goal.progress),
            goal_type: goal.goal_type.as_str().to_string(),
            quarter: goal.quarter.map(i64::from),
            created_at: None,
        }
    }

    /// Convert to the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the row has no id.
    pub fn into_goal(self) -> Result<Goal> {
        let id = self
            .id
            .ok_or_else(|| Error::Backend("goal row without id".into()))?;
        Ok(Goal {
            id,
            name: self.name,
            why_it_matters: self.why_it_matters,
            success_metric: self.success_metric,
            deadline: self.deadline,
            progress: u8::try_from(self.progress.clamp(0, 100)).unwrap_or(0),
            goal_type: GoalType::from_str_or_default(&self.goal_type),
            quarter: self.quarter.and_then(|q| u8::try_from(q).ok()),
        })
    }
}

/// Column map for a partial goal update.
#[must_use]
pub fn goal_patch_row(patch: &GoalPatch) -> Row {
    let mut row = Row::new();
    if let Some(v) = &patch.name {
        row.insert("name".into(), Value::from(v.as_str()));
    }
    if let Some(v) = &patch.why_it_matters {
        row.insert("why_it_matters".into(), Value::from(v.as_str()));
    }
    if let Some(v) = &patch.success_metric {
        row.insert("success_metric".into(), Value::from(v.as_str()));
    }
    if let Some(v) = &patch.deadline {
        row.insert("deadline".into(), empty_as_null(v));
    }
    if let Some(v) = patch.progress {
        row.insert("progress".into(), Value::from(v.min(100)));
    }
    if let Some(v) = patch.goal_type {
        row.insert("goal_type".into(), Value::from(v.as_str()));
    }
    if let Some(v) = patch.quarter {
        row.insert("quarter".into(), v.map_or(Value::Null, Value::from));
    }
    row
}

// ── user_profiles ─────────────────────────────────────────────

/// `user_profiles(user_id unique, display_name, timezone, streak)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileRow {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub streak: i64,
}

impl UserProfileRow {
    /// The profile every new account is provisioned with.
    #[must_use]
    pub fn provisioned(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: None,
            timezone: None,
            streak: 0,
        }
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        u32::try_from(self.streak).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_operating_code_null_principles_get_defaults() {
        let r: OperatingCodeRow = from_row(row(json!({
            "user_id": "u1",
            "principles": null,
            "daily_sacrifice": null,
        })))
        .unwrap();
        let code = r.into_code();
        assert_eq!(code.principles.len(), 7);
        assert!(code.daily_sacrifice.is_empty());
    }

    #[test]
    fn test_daily_plan_row_columns() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut plan = DailyPlan::new(date);
        plan.comfort_refused = "snooze".into();

        let r = to_row(&DailyPlanRow::from_plan("u1", &plan)).unwrap();
        assert_eq!(r["user_id"], "u1");
        assert_eq!(r["date"], "2024-05-01");
        assert_eq!(r["comfort_refused"], "snooze");
        assert_eq!(r["time_blocks"].as_array().unwrap().len(), 7);
        assert_eq!(r["time_blocks"][0]["startTime"], "05:00");
    }

    #[test]
    fn test_daily_plan_row_without_blocks_gets_default_schedule() {
        let r: DailyPlanRow = from_row(row(json!({
            "id": "x",
            "user_id": "u1",
            "date": "2024-05-01",
            "tasks": null,
            "time_blocks": null,
            "completed": null,
        })))
        .unwrap();
        let plan = r.into_plan();
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.time_blocks.len(), 7);
        assert!(!plan.completed);
    }

    #[test]
    fn test_goal_row_conversion() {
        let new = NewGoal::new("Launch", GoalType::Quarterly).with_quarter(3);
        let mut r = GoalRow::from_new("u1", &new);
        let map = to_row(&r).unwrap();
        assert!(!map.contains_key("id"));
        assert!(!map.contains_key("created_at"));
        assert_eq!(map["goal_type"], "quarterly");

        r.id = Some("g1".into());
        r.progress = 140;
        let goal = r.into_goal().unwrap();
        assert_eq!(goal.progress, 100);
        assert_eq!(goal.quarter, Some(3));
    }

    #[test]
    fn test_goal_without_deadline_writes_null() {
        let r = GoalRow::from_new("u1", &NewGoal::new("x", GoalType::Annual));
        let map = to_row(&r).unwrap();
        assert!(map["deadline"].is_null());

        let dated = NewGoal {
            deadline: "2024-12-31".into(),
            ..NewGoal::new("y", GoalType::Annual)
        };
        let map = to_row(&GoalRow::from_new("u1", &dated)).unwrap();
        assert_eq!(map["deadline"], "2024-12-31");

        let cleared = goal_patch_row(&GoalPatch {
            deadline: Some(String::new()),
            ..GoalPatch::default()
        });
        assert!(cleared["deadline"].is_null());

        let read: GoalRow = from_row(row(json!({
            "id": "g1",
            "user_id": "u1",
            "name": "x",
            "deadline": null,
        })))
        .unwrap();
        assert_eq!(read.into_goal().unwrap().deadline, "");
    }

    #[test]
    fn test_goal_row_without_id_is_error() {
        let r = GoalRow::from_new("u1", &NewGoal::new("x", GoalType::Annual));
        assert!(r.into_goal().is_err());
    }

    #[test]
    fn test_goal_patch_row_clears_quarter() {
        let patch = GoalPatch {
            progress: Some(55),
            quarter: Some(None),
            ..GoalPatch::default()
        };
        let r = goal_patch_row(&patch);
        assert_eq!(r["progress"], 55);
        assert!(r["quarter"].is_null());
        assert!(!r.contains_key("name"));
    }
}
