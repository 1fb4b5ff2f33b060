//! Local planner store for signed-out use.
//!
//! The whole state lives in memory and is written back as one document
//! through a [`DebouncedWriter`]: many quick edits produce one write of
//! the final state. Another process may write the same document; a
//! refresh with nothing pending picks up its version.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use super::{PlannerStore, StoreKind};
use crate::error::{Error, Result};
use crate::model::{DailyPlan, Goal, GoalPatch, NewGoal, OperatingCode, PlannerState};
use crate::storage::{load_state, serialize_state, DebouncedWriter};

/// File-backed planner store.
pub struct LocalPlannerStore {
    state: PlannerState,
    writer: DebouncedWriter,
    /// Document text last loaded or scheduled by this store.
    known: String,
}

impl LocalPlannerStore {
    /// Load the document at `path` (defaults if missing or unreadable)
    /// and start its writer.
    #[must_use]
    pub fn open(path: &Path, delay: Duration) -> Self {
        let state = load_state(path);
        let known = fs::read_to_string(path).unwrap_or_default();
        debug!(
            path = %path.display(),
            plans = state.daily_plans.len(),
            goals = state.goals.len(),
            "Opened local planner"
        );
        Self {
            state,
            writer: DebouncedWriter::spawn(path.to_path_buf(), delay),
            known,
        }
    }

    /// Number of document writes performed so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writer.writes()
    }

    fn persist(&mut self) {
        match serialize_state(&self.state) {
            Ok(json) => {
                self.known.clone_from(&json);
                self.writer.schedule(json);
            }
            Err(e) => warn!(error = %e, "Failed to serialize planner state"),
        }
    }
}

impl PlannerStore for LocalPlannerStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    fn state(&self) -> &PlannerState {
        &self.state
    }

    fn save_plan(&mut self, plan: DailyPlan) -> Result<()> {
        self.state.last_active_date = plan.date.to_string();
        self.state.daily_plans.insert(plan.date, plan);
        self.persist();
        Ok(())
    }

    fn save_operating_code(&mut self, code: OperatingCode) -> Result<()> {
        self.state.operating_code = code;
        self.persist();
        Ok(())
    }

    fn add_goal(&mut self, goal: NewGoal) -> Result<Goal> {
        let goal = goal.into_goal(format!("goal_{}", uuid::Uuid::new_v4().simple()));
        self.state.goals.push(goal.clone());
        self.persist();
        Ok(goal)
    }

    fn update_goal(&mut self, id: &str, patch: &GoalPatch) -> Result<Goal> {
        let goal = self
            .state
            .goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::GoalNotFound { id: id.to_string() })?;
        patch.apply_to(goal);
        let updated = goal.clone();
        self.persist();
        Ok(updated)
    }

    fn delete_goal(&mut self, id: &str) -> Result<()> {
        let before = self.state.goals.len();
        self.state.goals.retain(|g| g.id != id);
        if self.state.goals.len() == before {
            return Err(Error::GoalNotFound { id: id.to_string() });
        }
        self.persist();
        Ok(())
    }

    fn refresh(&mut self) -> usize {
        if self.writer.is_pending() {
            return 0;
        }
        let path = self.writer.path();
        let Ok(on_disk) = fs::read_to_string(path) else {
            return 0;
        };
        if on_disk == self.known {
            return 0;
        }

        let applied = match serde_json::from_str::<PlannerState>(&on_disk) {
            Ok(state) => {
                self.state = state;
                debug!(path = %path.display(), "Reloaded planner document changed on disk");
                1
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed planner document");
                0
            }
        };
        self.known = on_disk;
        applied
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(path = %self.writer.path().display(), error = %e, "Failed to write planner state");
        }
    }
}
