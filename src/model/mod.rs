//! Data models for The Operator.
//!
//! This module contains all domain models:
//! - DailyPlan (one per calendar day)
//! - Task and Priority tiers
//! - TimeBlock
//! - Goal
//! - OperatingCode
//! - PlannerState (the whole local document)

pub mod daily_plan;
pub mod goal;
pub mod operating_code;
pub mod task;
pub mod time_block;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use daily_plan::{DailyPlan, DailyPlanPatch};
pub use goal::{Goal, GoalPatch, GoalType, NewGoal};
pub use operating_code::{default_principles, OperatingCode, OperatingCodePatch};
pub use task::{NewTask, Priority, Task};
pub use time_block::{default_time_blocks, NewTimeBlock, TimeBlock};

/// Everything the planner knows about one user.
///
/// This is also the persisted shape of the local document:
/// `{ operatingCode, dailyPlans: {ISODate: DailyPlan}, goals, streak, lastActiveDate }`.
/// Missing keys fall back to their defaults when loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerState {
    pub operating_code: OperatingCode,
    pub daily_plans: BTreeMap<NaiveDate, DailyPlan>,
    pub goals: Vec<Goal>,
    pub streak: u32,
    pub last_active_date: String,
}
