//! Task model and priority tiers.
//!
//! Tasks live inside a [`DailyPlan`](super::DailyPlan); they are never
//! stored as a separate collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority tier of a task or time block.
///
/// The three tiers are labels ("80", "60", "20"), not computed weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "80")]
    P80,
    #[serde(rename = "60")]
    P60,
    #[serde(rename = "20")]
    P20,
}

impl Priority {
    /// All tiers, highest first.
    pub const ALL: [Self; 3] = [Self::P80, Self::P60, Self::P20];

    /// Get the string representation used in stored documents.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::P80 => "80",
            Self::P60 => "60",
            Self::P20 => "20",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::validate::normalize_priority(s)
            .map_err(|(input, suggestion)| match suggestion {
                Some(s) => format!("Invalid priority '{input}'. Did you mean '{s}'?"),
                None => format!("Invalid priority '{input}'. Valid tiers: 80, 60, 20"),
            })
    }
}

/// A task in a daily plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub priority: Priority,

    /// Estimated effort in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for [`Planner::add_task`](crate::planner::Planner::add_task).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub time_estimate: Option<u32>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

impl NewTask {
    /// Create a task input with just a title and tier.
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            priority,
            time_estimate: None,
            due_date: None,
            notes: None,
        }
    }

    /// Set the time estimate in minutes.
    #[must_use]
    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.time_estimate = Some(minutes);
        self
    }

    /// Set the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Set the due date.
    #[must_use]
    pub fn with_due_date(mut self, due: &str) -> Self {
        self.due_date = Some(due.to_string());
        self
    }

    /// Materialize the task with a fresh collision-resistant id.
    #[must_use]
    pub fn into_task(self) -> Task {
        Task {
            id: format!("task_{}", uuid::Uuid::new_v4().simple()),
            title: self.title,
            completed: false,
            priority: self.priority,
            time_estimate: self.time_estimate,
            due_date: self.due_date,
            notes: self.notes,
            created_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_serializes_as_tier_string() {
        assert_eq!(serde_json::to_string(&Priority::P80).unwrap(), "\"80\"");
        let p: Priority = serde_json::from_str("\"20\"").unwrap();
        assert_eq!(p, Priority::P20);
    }

    #[test]
    fn test_priority_from_str_synonyms() {
        assert_eq!("80".parse::<Priority>().unwrap(), Priority::P80);
        assert_eq!("p60".parse::<Priority>().unwrap(), Priority::P60);
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::P20);
        assert!("99".parse::<Priority>().is_err());
    }

    #[test]
    fn test_new_task_ids_are_unique() {
        let a = NewTask::new("a", Priority::P80).into_task();
        let b = NewTask::new("b", Priority::P80).into_task();
        assert!(a.id.starts_with("task_"));
        assert_ne!(a.id, b.id);
        assert!(!a.completed);
    }

    #[test]
    fn test_task_deserializes_legacy_shape() {
        let json = r#"{"id":"1712","title":"Call bank","completed":true,"priority":"60","createdAt":"2024-04-01T10:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::P60);
        assert!(task.completed);
        assert!(task.notes.is_none());
    }
}
