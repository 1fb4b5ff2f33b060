//! Goal model.
//!
//! Goals are a top-level collection owned by the user, never nested
//! inside a daily plan.

use serde::{Deserialize, Serialize};

/// Goal horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    #[default]
    Annual,
    Quarterly,
}

impl GoalType {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }

    /// Parse from the stored string, defaulting to annual.
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "quarterly" => Self::Quarterly,
            _ => Self::Annual,
        }
    }
}

/// A user goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub why_it_matters: String,
    #[serde(default)]
    pub success_metric: String,
    #[serde(default)]
    pub deadline: String,
    /// Percent complete, 0-100
    #[serde(default)]
    pub progress: u8,
    #[serde(rename = "type", default)]
    pub goal_type: GoalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<u8>,
}

impl Goal {
    /// Whether this goal matches a horizon and optional quarter.
    #[must_use]
    pub fn matches(&self, goal_type: GoalType, quarter: Option<u8>) -> bool {
        self.goal_type == goal_type && quarter.is_none_or(|q| self.quarter == Some(q))
    }
}

/// Input for adding a goal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewGoal {
    pub name: String,
    pub why_it_matters: String,
    pub success_metric: String,
    pub deadline: String,
    pub progress: u8,
    pub goal_type: GoalType,
    pub quarter: Option<u8>,
}

impl NewGoal {
    /// Create a goal input with a name and horizon.
    pub fn new(name: impl Into<String>, goal_type: GoalType) -> Self {
        Self {
            name: name.into(),
            goal_type,
            ..Self::default()
        }
    }

    /// Set the quarter (1-4).
    #[must_use]
    pub fn with_quarter(mut self, quarter: u8) -> Self {
        self.quarter = Some(quarter);
        self
    }

    /// Attach an id, clamping progress and dropping a quarter on annual goals.
    #[must_use]
    pub fn into_goal(self, id: String) -> Goal {
        let quarter = match self.goal_type {
            GoalType::Quarterly => self.quarter,
            GoalType::Annual => None,
        };
        Goal {
            id,
            name: self.name,
            why_it_matters: self.why_it_matters,
            success_metric: self.success_metric,
            deadline: self.deadline,
            progress: self.progress.min(100),
            goal_type: self.goal_type,
            quarter,
        }
    }
}

/// Partial update for a [`Goal`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub why_it_matters: Option<String>,
    pub success_metric: Option<String>,
    pub deadline: Option<String>,
    pub progress: Option<u8>,
    pub goal_type: Option<GoalType>,
    pub quarter: Option<Option<u8>>,
}

impl GoalPatch {
    /// Whether the patch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this patch over `goal`.
    pub fn apply_to(&self, goal: &mut Goal) {
        if let Some(v) = &self.name {
            goal.name.clone_from(v);
        }
        if let Some(v) = &self.why_it_matters {
            goal.why_it_matters.clone_from(v);
        }
        if let Some(v) = &self.success_metric {
            goal.success_metric.clone_from(v);
        }
        if let Some(v) = &self.deadline {
            goal.deadline.clone_from(v);
        }
        if let Some(v) = self.progress {
            goal.progress = v.min(100);
        }
        if let Some(v) = self.goal_type {
            goal.goal_type = v;
        }
        if let Some(v) = self.quarter {
            goal.quarter = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_type_field_is_named_type() {
        let goal = NewGoal::new("Run a marathon", GoalType::Quarterly)
            .with_quarter(2)
            .into_goal("g1".to_string());
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["type"], "quarterly");
        assert_eq!(json["quarter"], 2);
        assert_eq!(json["whyItMatters"], "");
    }

    #[test]
    fn test_matches_quarter_filter() {
        let q2 = NewGoal::new("q2", GoalType::Quarterly)
            .with_quarter(2)
            .into_goal("a".into());
        let annual = NewGoal::new("year", GoalType::Annual).into_goal("b".into());

        assert!(q2.matches(GoalType::Quarterly, Some(2)));
        assert!(!q2.matches(GoalType::Quarterly, Some(3)));
        assert!(q2.matches(GoalType::Quarterly, None));
        assert!(!annual.matches(GoalType::Quarterly, Some(2)));
        assert!(annual.matches(GoalType::Annual, None));
    }

    #[test]
    fn test_annual_goal_drops_quarter() {
        let goal = NewGoal::new("year", GoalType::Annual)
            .with_quarter(3)
            .into_goal("x".into());
        assert_eq!(goal.quarter, None);
    }

    #[test]
    fn test_patch_clamps_progress() {
        let mut goal = NewGoal::new("g", GoalType::Annual).into_goal("x".into());
        GoalPatch {
            progress: Some(250),
            ..GoalPatch::default()
        }
        .apply_to(&mut goal);
        assert_eq!(goal.progress, 100);
    }
}
