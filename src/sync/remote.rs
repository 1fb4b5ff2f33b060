//! Remote planner store.
//!
//! Mirrors the planner entities against the backend for a signed-in
//! user. Reads are served from the in-memory state loaded at connect
//! time and kept current by realtime feeds. Writes update that state
//! first and then make exactly one backend call; a failed call leaves
//! the local change in place and records the error in [`SyncStatus`].

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use super::realtime::{apply_daily_plan, apply_operating_code, Subscriptions};
use super::status::SyncStatus;
use crate::backend::rows::{
    from_row, goal_patch_row, to_row, DailyPlanRow, GoalRow, OperatingCodeRow, UserProfileRow,
};
use crate::backend::{tables, AuthSession, Backend, Filter, Query, SharedBackend};
use crate::error::{Error, Result};
use crate::model::{DailyPlan, Goal, GoalPatch, NewGoal, OperatingCode, PlannerState};
use crate::planner::{PlannerStore, StoreKind};

/// How many days of plans are loaded on connect.
pub const PLAN_WINDOW_DAYS: i64 = 30;

/// Backend-backed planner store.
pub struct RemotePlannerStore {
    backend: SharedBackend,
    session: AuthSession,
    state: PlannerState,
    status: SyncStatus,
    subscriptions: Option<Subscriptions>,
}

// ── Loads ─────────────────────────────────────────────────────

fn by_user(session: &AuthSession) -> Filter {
    Filter::eq("user_id", session.user_id.as_str())
}

fn load_operating_code(backend: &dyn Backend, session: &AuthSession) -> Result<Option<OperatingCode>> {
    let rows = backend.select(session, &Query::table(tables::OPERATING_CODE).filter(by_user(session)))?;
    rows.into_iter()
        .next()
        .map(|row| from_row::<OperatingCodeRow>(row).map(OperatingCodeRow::into_code))
        .transpose()
}

fn load_daily_plans(backend: &dyn Backend, session: &AuthSession, since: NaiveDate) -> Result<Vec<DailyPlan>> {
    let query = Query::table(tables::DAILY_PLANS)
        .filter(by_user(session))
        .filter(Filter::gte("date", since.to_string()))
        .order_asc("date");
    backend
        .select(session, &query)?
        .into_iter()
        .map(|row| from_row::<DailyPlanRow>(row).map(DailyPlanRow::into_plan))
        .collect()
}

fn load_goals(backend: &dyn Backend, session: &AuthSession) -> Result<Vec<Goal>> {
    let query = Query::table(tables::GOALS)
        .filter(by_user(session))
        .order_desc("created_at");
    backend
        .select(session, &query)?
        .into_iter()
        .map(|row| from_row::<GoalRow>(row)?.into_goal())
        .collect()
}

fn load_streak(backend: &dyn Backend, session: &AuthSession) -> Result<Option<u32>> {
    let rows = backend.select(session, &Query::table(tables::USER_PROFILES).filter(by_user(session)))?;
    rows.into_iter()
        .next()
        .map(|row| from_row::<UserProfileRow>(row).map(|p| p.streak()))
        .transpose()
}

fn joined<T>(handle: std::thread::ScopedJoinHandle<'_, Result<T>>, what: &str) -> Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(Error::Other(format!("{what} load panicked"))))
}

impl RemotePlannerStore {
    /// Load the user's data and open the realtime feeds.
    ///
    /// The four loads run concurrently. Each failure is recorded in the
    /// sync status while the loads that succeeded are kept; connecting
    /// itself never fails.
    #[must_use]
    pub fn connect(backend: SharedBackend, session: AuthSession, today: NaiveDate) -> Self {
        let mut store = Self {
            backend,
            session,
            state: PlannerState::default(),
            status: SyncStatus::default(),
            subscriptions: None,
        };
        store.load_all(today);
        store.open_feeds();
        store
    }

    fn load_all(&mut self, today: NaiveDate) {
        self.status.begin();
        let since = today - Duration::days(PLAN_WINDOW_DAYS);
        let backend: &dyn Backend = &*self.backend;
        let session = &self.session;

        let (code, plans, goals, streak) = std::thread::scope(|s| {
            let code = s.spawn(|| load_operating_code(backend, session));
            let plans = s.spawn(|| load_daily_plans(backend, session, since));
            let goals = s.spawn(|| load_goals(backend, session));
            let streak = s.spawn(|| load_streak(backend, session));
            (
                joined(code, "operating code"),
                joined(plans, "daily plans"),
                joined(goals, "goals"),
                joined(streak, "profile"),
            )
        });

        let mut first_error: Option<Error> = None;
        let mut record = |what: &str, e: Error| {
            warn!(what, error = %e, "Remote load failed");
            first_error.get_or_insert(e);
        };

        match code {
            Ok(Some(code)) => self.state.operating_code = code,
            Ok(None) => debug!("No operating code row, using defaults"),
            Err(e) => record("operating code", e),
        }
        match plans {
            Ok(plans) => {
                self.state.daily_plans = plans.into_iter().map(|p| (p.date, p)).collect();
            }
            Err(e) => record("daily plans", e),
        }
        match goals {
            Ok(goals) => self.state.goals = goals,
            Err(e) => record("goals", e),
        }
        match streak {
            Ok(streak) => self.state.streak = streak.unwrap_or(0),
            Err(e) => record("profile", e),
        }

        match first_error {
            Some(e) => self.status.fail(&e),
            None => {
                self.status.succeed();
                info!(
                    plans = self.state.daily_plans.len(),
                    goals = self.state.goals.len(),
                    "Loaded remote planner"
                );
            }
        }
    }

    fn open_feeds(&mut self) {
        match Subscriptions::open(&*self.backend, &self.session) {
            Ok(subs) => self.subscriptions = Some(subs),
            Err(e) => {
                warn!(error = %e, "Realtime feeds unavailable");
                self.status.fail(&e);
            }
        }
    }

    /// Perform one backend call with status bookkeeping.
    fn call<T>(&mut self, what: &str, op: impl FnOnce(&dyn Backend, &AuthSession) -> Result<T>) -> Result<T> {
        self.status.begin();
        let result = op(&*self.backend, &self.session);
        match &result {
            Ok(_) => self.status.succeed(),
            Err(e) => {
                warn!(what, error = %e, "Remote write failed, local change kept");
                self.status.fail(e);
            }
        }
        result
    }

    fn reload_goals(&mut self) {
        match load_goals(&*self.backend, &self.session) {
            Ok(goals) => {
                self.state.goals = goals;
                self.status.touch();
            }
            Err(e) => {
                warn!(error = %e, "Goal reload failed");
                self.status.fail(&e);
            }
        }
    }
}

impl PlannerStore for RemotePlannerStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Remote
    }

    fn state(&self) -> &PlannerState {
        &self.state
    }

    fn save_plan(&mut self, plan: DailyPlan) -> Result<()> {
        let row = to_row(&DailyPlanRow::from_plan(&self.session.user_id, &plan))?;
        self.state.daily_plans.insert(plan.date, plan);
        self.call("daily plan", |backend, session| {
            backend
                .upsert(session, tables::DAILY_PLANS, row, &DailyPlanRow::CONFLICT)
                .map(|_| ())
        })
    }

    fn save_operating_code(&mut self, code: OperatingCode) -> Result<()> {
        let row = to_row(&OperatingCodeRow::from_code(&self.session.user_id, &code))?;
        self.state.operating_code = code;
        self.call("operating code", |backend, session| {
            backend
                .upsert(session, tables::OPERATING_CODE, row, &["user_id"])
                .map(|_| ())
        })
    }

    fn add_goal(&mut self, goal: NewGoal) -> Result<Goal> {
        let row = to_row(&GoalRow::from_new(&self.session.user_id, &goal))?;
        let stored = self.call("goal", |backend, session| {
            backend.insert(session, tables::GOALS, row)
        })?;
        let goal = from_row::<GoalRow>(stored)?.into_goal()?;
        // Newest first, matching the load order
        self.state.goals.insert(0, goal.clone());
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

        let row = goal_patch_row(patch);
        self.call("goal", |backend, session| {
            backend.update(session, tables::GOALS, &[Filter::eq("id", id), by_user(session)], row)
        })?;
        Ok(updated)
    }

    fn delete_goal(&mut self, id: &str) -> Result<()> {
        let index = self
            .state
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| Error::GoalNotFound { id: id.to_string() })?;
        self.state.goals.remove(index);

        self.call("goal", |backend, session| {
            backend.delete(session, tables::GOALS, &[Filter::eq("id", id), by_user(session)])
        })
    }

    fn refresh(&mut self) -> usize {
        let Some(subs) = &self.subscriptions else {
            return 0;
        };
        let code_events = subs.operating_code.drain();
        let plan_events = subs.daily_plans.drain();
        let goal_events = subs.goals.drain();

        let mut applied = 0;
        for event in &code_events {
            if apply_operating_code(&mut self.state, event) {
                applied += 1;
                self.status.touch();
            }
        }
        for event in &plan_events {
            if apply_daily_plan(&mut self.state, event) {
                applied += 1;
                self.status.touch();
            }
        }
        if !goal_events.is_empty() {
            self.reload_goals();
            applied += goal_events.len();
        }

        if applied > 0 {
            debug!(applied, "Applied realtime events");
        }
        applied
    }

    fn sync_status(&self) -> Option<&SyncStatus> {
        Some(&self.status)
    }

    fn session(&self) -> Option<&AuthSession> {
        Some(&self.session)
    }
}
