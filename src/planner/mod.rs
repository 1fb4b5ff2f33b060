//! The planner facade.
//!
//! [`Planner`] presents one API over today's plan, goals and the
//! operating code. Behind it sits exactly one [`PlannerStore`], chosen
//! once when the planner is opened:
//!
//! - signed out: [`LocalPlannerStore`] (JSON document, debounced writes)
//! - signed in: [`crate::sync::RemotePlannerStore`] (backend rows,
//!   realtime feeds)
//!
//! The two are never merged. Signing in leaves the local document on
//! disk untouched and unread.

pub mod clock;
pub mod local;
pub mod progress;

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{self, AuthSession, SharedBackend};
use crate::config::{self, RuntimeConfig};
use crate::error::{Error, Result};
use crate::model::{
    DailyPlan, DailyPlanPatch, Goal, GoalPatch, GoalType, NewGoal, NewTask, NewTimeBlock,
    OperatingCode, OperatingCodePatch, PlannerState, Task, TimeBlock,
};
use crate::schedule;
use crate::sync::{RemotePlannerStore, SyncStatus};

pub use clock::{Clock, FixedClock, SystemClock};
pub use local::LocalPlannerStore;
pub use progress::{percent, DailyProgress};

/// Which store backs a planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Local,
    Remote,
}

impl StoreKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Persistence strategy behind the facade.
///
/// Implementations keep the full state in memory; `state()` never
/// touches storage. Writes update memory first.
pub trait PlannerStore: Send {
    fn kind(&self) -> StoreKind;

    fn state(&self) -> &PlannerState;

    /// Store a whole daily plan, replacing any plan for its date.
    ///
    /// # Errors
    ///
    /// Returns the persistence error; in-memory state is already updated.
    fn save_plan(&mut self, plan: DailyPlan) -> Result<()>;

    /// # Errors
    ///
    /// Returns the persistence error; in-memory state is already updated.
    fn save_operating_code(&mut self, code: OperatingCode) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the goal could not be stored.
    fn add_goal(&mut self, goal: NewGoal) -> Result<Goal>;

    /// # Errors
    ///
    /// Returns `GoalNotFound` for unknown ids, or the persistence error.
    fn update_goal(&mut self, id: &str, patch: &GoalPatch) -> Result<Goal>;

    /// # Errors
    ///
    /// Returns `GoalNotFound` for unknown ids, or the persistence error.
    fn delete_goal(&mut self, id: &str) -> Result<()>;

    /// Apply changes made outside this process. Returns how many were
    /// applied.
    fn refresh(&mut self) -> usize {
        0
    }

    fn sync_status(&self) -> Option<&SyncStatus> {
        None
    }

    fn session(&self) -> Option<&AuthSession> {
        None
    }

    /// Write out anything pending.
    fn flush(&mut self) {}
}

/// Source-agnostic planner API.
pub struct Planner {
    store: Box<dyn PlannerStore>,
    clock: Arc<dyn Clock>,
}

impl Planner {
    #[must_use]
    pub fn new(store: Box<dyn PlannerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Planner over the local document at `path`.
    #[must_use]
    pub fn local(path: &Path, debounce: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::new(Box::new(LocalPlannerStore::open(path, debounce)), clock)
    }

    /// Planner over a signed-in backend session.
    #[must_use]
    pub fn remote(backend: SharedBackend, session: AuthSession, clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        Self::new(
            Box::new(RemotePlannerStore::connect(backend, session, today)),
            clock,
        )
    }

    /// Open the planner for the current authentication state.
    ///
    /// A stored session selects the remote store on the backend it was
    /// created against; otherwise the local document in the home
    /// directory is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session's backend cannot be opened.
    pub fn open(config: &RuntimeConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        match config::read_session(&config.home) {
            Some(stored) => {
                let backend = backend::open(&stored.backend_url, config.anon_key.as_deref())?;
                info!(backend = backend.name(), user = %stored.session.email, "Opening remote planner");
                Ok(Self::remote(backend, stored.session, clock))
            }
            None => {
                let path = config::planner_document_path(&config.home);
                debug!(path = %path.display(), "Opening local planner");
                Ok(Self::local(&path, config.debounce, clock))
            }
        }
    }

    // ── Context ───────────────────────────────────────────────

    #[must_use]
    pub fn kind(&self) -> StoreKind {
        self.store.kind()
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.session().is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&AuthSession> {
        self.store.session()
    }

    #[must_use]
    pub fn sync_status(&self) -> Option<&SyncStatus> {
        self.store.sync_status()
    }

    #[must_use]
    pub fn state(&self) -> &PlannerState {
        self.store.state()
    }

    // ── Today's plan ──────────────────────────────────────────

    /// Today's plan, or a default one if nothing is stored yet.
    ///
    /// The default plan is not stored until the first mutation.
    #[must_use]
    pub fn today_plan(&self) -> DailyPlan {
        let today = self.today();
        self.state()
            .daily_plans
            .get(&today)
            .cloned()
            .unwrap_or_else(|| DailyPlan::new(today))
    }

    /// Shallow-merge `patch` into today's plan and write it through.
    ///
    /// # Errors
    ///
    /// Returns the store's write error.
    pub fn update_today_plan(&mut self, patch: DailyPlanPatch) -> Result<DailyPlan> {
        let plan = patch.apply(self.today_plan());
        self.store.save_plan(plan.clone())?;
        Ok(plan)
    }

    /// Append a task to today's plan.
    ///
    /// # Errors
    ///
    /// Returns the store's write error.
    pub fn add_task(&mut self, task: NewTask) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(Error::InvalidArgument("Task title cannot be empty".into()));
        }
        let task = task.into_task();
        let mut tasks = self.today_plan().tasks;
        tasks.push(task.clone());
        self.update_today_plan(DailyPlanPatch::tasks(tasks))?;
        Ok(task)
    }

    /// Flip a task's completed flag.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` (without writing) for unknown ids.
    pub fn toggle_task(&mut self, id: &str) -> Result<Task> {
        let mut tasks = self.today_plan().tasks;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::TaskNotFound { id: id.to_string() })?;
        task.completed = !task.completed;
        let toggled = task.clone();
        self.update_today_plan(DailyPlanPatch::tasks(tasks))?;
        Ok(toggled)
    }

    /// Remove a task from today's plan.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` (without writing) for unknown ids.
    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let mut tasks = self.today_plan().tasks;
        let index = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::TaskNotFound { id: id.to_string() })?;
        let removed = tasks.remove(index);
        self.update_today_plan(DailyPlanPatch::tasks(tasks))?;
        Ok(removed)
    }

    #[must_use]
    pub fn daily_progress(&self) -> DailyProgress {
        DailyProgress::from_tasks(&self.today_plan().tasks)
    }

    // ── Time blocks ───────────────────────────────────────────

    /// The first of today's blocks containing the current time.
    #[must_use]
    pub fn current_time_block(&self) -> Option<TimeBlock> {
        let plan = self.today_plan();
        schedule::active_block(&plan.time_blocks, &self.clock.hhmm()).cloned()
    }

    /// Replace today's block list.
    ///
    /// # Errors
    ///
    /// Returns the store's write error.
    pub fn update_time_blocks(&mut self, blocks: Vec<TimeBlock>) -> Result<DailyPlan> {
        self.update_today_plan(DailyPlanPatch::time_blocks(blocks))
    }

    /// Add a block, keeping the list ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the block does not end after it
    /// starts, or the store's write error.
    pub fn add_time_block(&mut self, block: NewTimeBlock) -> Result<TimeBlock> {
        if block.end_time <= block.start_time {
            return Err(Error::InvalidArgument(format!(
                "Block must end after it starts ({} - {})",
                block.start_time, block.end_time
            )));
        }
        let block = block.into_block();
        let mut blocks = self.today_plan().time_blocks;
        blocks.push(block.clone());
        blocks.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        self.update_time_blocks(blocks)?;
        Ok(block)
    }

    /// Remove one of today's blocks.
    ///
    /// # Errors
    ///
    /// Returns `BlockNotFound` (without writing) for unknown ids.
    pub fn remove_time_block(&mut self, id: &str) -> Result<TimeBlock> {
        let mut blocks = self.today_plan().time_blocks;
        let index = blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| Error::BlockNotFound { id: id.to_string() })?;
        let removed = blocks.remove(index);
        self.update_time_blocks(blocks)?;
        Ok(removed)
    }

    // ── Stored plans ──────────────────────────────────────────

    #[must_use]
    pub fn plan_for(&self, date: NaiveDate) -> Option<&DailyPlan> {
        self.state().daily_plans.get(&date)
    }

    /// Stored plans with `from <= date <= to`, oldest first.
    #[must_use]
    pub fn plans_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<&DailyPlan> {
        if from > to {
            return Vec::new();
        }
        self.state()
            .daily_plans
            .range((Bound::Included(from), Bound::Included(to)))
            .map(|(_, plan)| plan)
            .collect()
    }

    // ── Operating code ────────────────────────────────────────

    #[must_use]
    pub fn operating_code(&self) -> &OperatingCode {
        &self.state().operating_code
    }

    /// # Errors
    ///
    /// Returns the store's write error.
    pub fn update_operating_code(&mut self, patch: &OperatingCodePatch) -> Result<OperatingCode> {
        let mut code = self.operating_code().clone();
        patch.apply_to(&mut code);
        self.store.save_operating_code(code.clone())?;
        Ok(code)
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.state().streak
    }

    // ── Goals ─────────────────────────────────────────────────

    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.state().goals
    }

    /// Goals of one horizon, optionally narrowed to a quarter.
    #[must_use]
    pub fn goals_for(&self, goal_type: GoalType, quarter: Option<u8>) -> Vec<&Goal> {
        self.goals().iter().filter(|g| g.matches(goal_type, quarter)).collect()
    }

    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name or a quarter outside
    /// 1-4, or the store's write error.
    pub fn add_goal(&mut self, goal: NewGoal) -> Result<Goal> {
        if goal.name.trim().is_empty() {
            return Err(Error::InvalidArgument("Goal name cannot be empty".into()));
        }
        if goal.quarter.is_some_and(|q| !(1..=4).contains(&q)) {
            return Err(Error::InvalidArgument("Quarter must be 1-4".into()));
        }
        self.store.add_goal(goal)
    }

    /// # Errors
    ///
    /// Returns `GoalNotFound` for unknown ids, or the store's write error.
    pub fn update_goal(&mut self, id: &str, patch: &GoalPatch) -> Result<Goal> {
        self.store.update_goal(id, patch)
    }

    /// # Errors
    ///
    /// Returns `GoalNotFound` for unknown ids, or the store's write error.
    pub fn delete_goal(&mut self, id: &str) -> Result<()> {
        self.store.delete_goal(id)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Apply pending realtime changes, or reload a local document
    /// changed by another process.
    pub fn refresh(&mut self) -> usize {
        self.store.refresh()
    }

    /// Write out any pending local change.
    pub fn flush(&mut self) {
        self.store.flush();
    }
}

impl Drop for Planner {
    fn drop(&mut self) {
        self.store.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SqliteBackend;
    use crate::model::Priority;
    use crate::storage::{load_state, DEFAULT_DEBOUNCE};
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    fn clock(at: &str) -> Arc<dyn Clock> {
        Arc::new(FixedClock(NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M").unwrap()))
    }

    fn local(dir: &TempDir, at: &str) -> Planner {
        Planner::local(&dir.path().join("operator_planner.json"), DEFAULT_DEBOUNCE, clock(at))
    }

    #[test]
    fn test_today_plan_defaults_without_writing() {
        let dir = TempDir::new().unwrap();
        let planner = local(&dir, "2024-05-20T09:30");

        let plan = planner.today_plan();
        assert_eq!(plan.date.to_string(), "2024-05-20");
        assert!(plan.intention.is_empty());
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.time_blocks.len(), 7);
        assert!(planner.state().daily_plans.is_empty());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");

        planner
            .update_today_plan(DailyPlanPatch {
                sacrifice: Some("Social media".into()),
                ..DailyPlanPatch::default()
            })
            .unwrap();
        planner.add_task(NewTask::new("Write", Priority::P80)).unwrap();
        planner
            .update_today_plan(DailyPlanPatch {
                intention: Some("X".into()),
                ..DailyPlanPatch::default()
            })
            .unwrap();

        let plan = planner.today_plan();
        assert_eq!(plan.intention, "X");
        assert_eq!(plan.sacrifice, "Social media");
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.time_blocks.len(), 7);
    }

    #[test]
    fn test_progress_scenario_two_high_one_medium() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");
        assert_eq!(planner.daily_progress(), DailyProgress::default());

        let first = planner.add_task(NewTask::new("A", Priority::P80)).unwrap();
        planner.add_task(NewTask::new("B", Priority::P80)).unwrap();
        planner.add_task(NewTask::new("C", Priority::P60)).unwrap();
        planner.toggle_task(&first.id).unwrap();

        let progress = planner.daily_progress();
        assert_eq!((progress.total, progress.p80, progress.p60, progress.p20), (33, 50, 0, 0));
    }

    #[test]
    fn test_rapid_task_ids_are_unique() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");
        let ids: std::collections::HashSet<String> = (0..50)
            .map(|i| planner.add_task(NewTask::new(format!("t{i}"), Priority::P20)).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_toggle_and_delete_unknown_task() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");
        assert!(matches!(planner.toggle_task("nope"), Err(Error::TaskNotFound { .. })));
        assert!(matches!(planner.delete_task("nope"), Err(Error::TaskNotFound { .. })));
        assert!(planner.state().daily_plans.is_empty());
    }

    #[test]
    fn test_delete_task() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");
        let task = planner.add_task(NewTask::new("A", Priority::P80)).unwrap();
        let removed = planner.delete_task(&task.id).unwrap();
        assert_eq!(removed.title, "A");
        assert!(planner.today_plan().tasks.is_empty());
    }

    #[test]
    fn test_current_time_block_uses_clock() {
        let dir = TempDir::new().unwrap();
        let planner = local(&dir, "2024-05-20T09:30");
        assert_eq!(planner.current_time_block().unwrap().label, "80% - Revenue Generation");

        let late = local(&dir, "2024-05-20T23:00");
        assert!(late.current_time_block().is_none());
    }

    #[test]
    fn test_overlapping_blocks_first_wins() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T10:30");
        let mut blocks = planner.today_plan().time_blocks;
        let mut overlap = blocks[2].clone();
        overlap.id = "overlap".into();
        overlap.start_time = "10:00".into();
        blocks.insert(0, overlap);
        planner.update_time_blocks(blocks).unwrap();

        assert_eq!(planner.current_time_block().unwrap().id, "overlap");
    }

    #[test]
    fn test_add_and_remove_time_block() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T20:30");
        planner.update_time_blocks(Vec::new()).unwrap();

        let evening = planner
            .add_time_block(NewTimeBlock {
                start_time: "20:00".into(),
                end_time: "21:00".into(),
                label: "Reading".into(),
                priority: Priority::P20,
            })
            .unwrap();
        planner
            .add_time_block(NewTimeBlock {
                start_time: "06:00".into(),
                end_time: "07:00".into(),
                label: "Run".into(),
                priority: Priority::P60,
            })
            .unwrap();

        let starts: Vec<String> = planner.today_plan().time_blocks.iter().map(|b| b.start_time.clone()).collect();
        assert_eq!(starts, vec!["06:00", "20:00"]);
        assert_eq!(planner.current_time_block().unwrap().id, evening.id);

        planner.remove_time_block(&evening.id).unwrap();
        assert_eq!(planner.today_plan().time_blocks.len(), 1);
        assert!(matches!(planner.remove_time_block("nope"), Err(Error::BlockNotFound { .. })));
    }

    #[test]
    fn test_inverted_block_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:00");
        let result = planner.add_time_block(NewTimeBlock {
            start_time: "10:00".into(),
            end_time: "09:00".into(),
            label: "x".into(),
            priority: Priority::P20,
        });
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_quarterly_goal_filter() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");
        let q2 = planner
            .add_goal(NewGoal::new("Launch", GoalType::Quarterly).with_quarter(2))
            .unwrap();
        planner.add_goal(NewGoal::new("Fitness", GoalType::Annual)).unwrap();
        planner
            .add_goal(NewGoal::new("Hire", GoalType::Quarterly).with_quarter(3))
            .unwrap();

        let found = planner.goals_for(GoalType::Quarterly, Some(2));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, q2.id);
        assert_eq!(planner.goals_for(GoalType::Annual, None).len(), 1);
        assert_eq!(planner.goals_for(GoalType::Quarterly, None).len(), 2);
    }

    #[test]
    fn test_goal_validation() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");
        assert!(planner.add_goal(NewGoal::new("  ", GoalType::Annual)).is_err());
        assert!(planner
            .add_goal(NewGoal::new("x", GoalType::Quarterly).with_quarter(5))
            .is_err());
    }

    #[test]
    fn test_operating_code_patch() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:30");
        let code = planner
            .update_operating_code(&OperatingCodePatch {
                daily_commitment: Some("Ship daily".into()),
                ..OperatingCodePatch::default()
            })
            .unwrap();
        assert_eq!(code.daily_commitment, "Ship daily");
        assert_eq!(planner.operating_code().principles.len(), 7);
    }

    #[test]
    fn test_plans_between() {
        let dir = TempDir::new().unwrap();
        for day in ["2024-05-18", "2024-05-19", "2024-05-20"] {
            let mut planner = local(&dir, &format!("{day}T09:00"));
            planner.add_task(NewTask::new(day, Priority::P80)).unwrap();
        }

        let planner = local(&dir, "2024-05-20T09:00");
        let from = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(planner.plans_between(from, to).len(), 2);
        assert!(planner.plans_between(to, from).is_empty());
        assert!(planner.plan_for(NaiveDate::from_ymd_opt(2024, 5, 18).unwrap()).is_some());
    }

    #[test]
    fn test_drop_flushes_local_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("operator_planner.json");
        {
            let mut planner = Planner::local(&path, Duration::from_secs(60), clock("2024-05-20T09:00"));
            planner.add_task(NewTask::new("Persist me", Priority::P80)).unwrap();
        }
        let state = load_state(&path);
        let date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(state.daily_plans[&date].tasks[0].title, "Persist me");
    }

    #[test]
    fn test_local_planner_is_not_authenticated() {
        let dir = TempDir::new().unwrap();
        let mut planner = local(&dir, "2024-05-20T09:00");
        assert_eq!(planner.kind(), StoreKind::Local);
        assert!(!planner.is_authenticated());
        assert!(planner.sync_status().is_none());
        assert_eq!(planner.refresh(), 0);
        assert_eq!(planner.streak(), 0);
    }

    #[test]
    fn test_remote_planner_round_trip() {
        let backend: SharedBackend = Arc::new(SqliteBackend::open_memory().unwrap());
        let session = crate::sync::account::sign_up(&*backend, "me@example.com", "secret1").unwrap();

        let mut planner = Planner::remote(backend.clone(), session.clone(), clock("2024-05-20T09:30"));
        assert!(planner.is_authenticated());
        assert_eq!(planner.kind(), StoreKind::Remote);
        let task = planner.add_task(NewTask::new("Remote task", Priority::P60)).unwrap();
        planner.toggle_task(&task.id).unwrap();
        planner
            .add_goal(NewGoal::new("Q2 launch", GoalType::Quarterly).with_quarter(2))
            .unwrap();

        // A second device sees the same data on connect
        let other = Planner::remote(backend, session, clock("2024-05-20T10:00"));
        let plan = other.today_plan();
        assert!(plan.tasks[0].completed);
        assert_eq!(other.goals_for(GoalType::Quarterly, Some(2)).len(), 1);
        assert_eq!(other.daily_progress().p60, 100);
    }

    #[test]
    fn test_open_selects_store_from_session() {
        let dir = TempDir::new().unwrap();
        let config = RuntimeConfig::resolve(
            dir.path(),
            &config::Settings::default(),
            &config::Overrides::default(),
            |_| None,
        );

        let planner = Planner::open(&config, clock("2024-05-20T09:00")).unwrap();
        assert_eq!(planner.kind(), StoreKind::Local);
        drop(planner);

        let db = dir.path().join("backend.db");
        let url = format!("sqlite:{}", db.display());
        let backend = backend::open(&url, None).unwrap();
        let session = crate::sync::account::sign_up(&*backend, "me@example.com", "secret1").unwrap();
        config::write_session(
            dir.path(),
            &config::StoredSession {
                backend_url: url,
                session,
            },
        )
        .unwrap();

        let planner = Planner::open(&config, clock("2024-05-20T09:00")).unwrap();
        assert_eq!(planner.kind(), StoreKind::Remote);
        assert_eq!(planner.user().unwrap().email, "me@example.com");
    }
}
