//! Daily plan model.
//!
//! One plan per calendar day, keyed by ISO date. A plan is materialized
//! with defaults on first access and only stored on first mutation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{default_time_blocks, Task, TimeBlock};

/// The plan for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    pub date: NaiveDate,

    /// Daily commitment triad
    #[serde(default)]
    pub intention: String,
    #[serde(default)]
    pub sacrifice: String,
    #[serde(default)]
    pub comfort_refused: String,

    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default = "default_time_blocks")]
    pub time_blocks: Vec<TimeBlock>,

    #[serde(default)]
    pub end_of_day_review: String,

    #[serde(default)]
    pub completed: bool,
}

impl DailyPlan {
    /// A fresh plan: empty commitments, no tasks, default schedule.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            intention: String::new(),
            sacrifice: String::new(),
            comfort_refused: String::new(),
            tasks: Vec::new(),
            time_blocks: default_time_blocks(),
            end_of_day_review: String::new(),
            completed: false,
        }
    }

    /// Whether intention, sacrifice and comfort refused are all set.
    ///
    /// UI convention only; nothing in the data layer enforces it.
    #[must_use]
    pub fn has_commitments(&self) -> bool {
        !self.intention.trim().is_empty()
            && !self.sacrifice.trim().is_empty()
            && !self.comfort_refused.trim().is_empty()
    }
}

/// Partial update for a [`DailyPlan`]. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPlanPatch {
    pub intention: Option<String>,
    pub sacrifice: Option<String>,
    pub comfort_refused: Option<String>,
    pub tasks: Option<Vec<Task>>,
    pub time_blocks: Option<Vec<TimeBlock>>,
    pub end_of_day_review: Option<String>,
    pub completed: Option<bool>,
}

impl DailyPlanPatch {
    /// Patch that only replaces the task list.
    #[must_use]
    pub fn tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Some(tasks),
            ..Self::default()
        }
    }

    /// Patch that only replaces the time blocks.
    #[must_use]
    pub fn time_blocks(blocks: Vec<TimeBlock>) -> Self {
        Self {
            time_blocks: Some(blocks),
            ..Self::default()
        }
    }

    /// Whether the patch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this patch over `plan`.
    #[must_use]
    pub fn apply(self, mut plan: DailyPlan) -> DailyPlan {
        if let Some(v) = self.intention {
            plan.intention = v;
        }
        if let Some(v) = self.sacrifice {
            plan.sacrifice = v;
        }
        if let Some(v) = self.comfort_refused {
            plan.comfort_refused = v;
        }
        if let Some(v) = self.tasks {
            plan.tasks = v;
        }
        if let Some(v) = self.time_blocks {
            plan.time_blocks = v;
        }
        if let Some(v) = self.end_of_day_review {
            plan.end_of_day_review = v;
        }
        if let Some(v) = self.completed {
            plan.completed = v;
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTask, Priority};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_new_plan_defaults() {
        let plan = DailyPlan::new(date());
        assert!(plan.intention.is_empty());
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.time_blocks.len(), 7);
        assert!(!plan.completed);
        assert!(!plan.has_commitments());
    }

    #[test]
    fn test_patch_is_shallow_merge() {
        let mut plan = DailyPlan::new(date());
        plan.sacrifice = "sleep in".to_string();
        plan.tasks.push(NewTask::new("ship", Priority::P80).into_task());

        let patch = DailyPlanPatch {
            intention: Some("X".to_string()),
            ..DailyPlanPatch::default()
        };
        let merged = patch.apply(plan.clone());

        assert_eq!(merged.intention, "X");
        assert_eq!(merged.sacrifice, "sleep in");
        assert_eq!(merged.tasks, plan.tasks);
        assert_eq!(merged.time_blocks, plan.time_blocks);
    }

    #[test]
    fn test_missing_time_blocks_get_default_schedule() {
        let json = r#"{"date":"2024-05-01","intention":"focus"}"#;
        let plan: DailyPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.intention, "focus");
        assert_eq!(plan.time_blocks.len(), 7);
    }

    #[test]
    fn test_empty_patch() {
        assert!(DailyPlanPatch::default().is_empty());
        assert!(!DailyPlanPatch::tasks(Vec::new()).is_empty());
    }
}
