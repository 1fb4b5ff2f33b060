//! Daily completion percentages.

use serde::Serialize;

use crate::model::{Priority, Task};

/// `round(100 * completed / total)` with halves rounded up; 0 when
/// there is nothing to complete.
#[must_use]
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    let value = (200 * completed + total) / (2 * total);
    u8::try_from(value).unwrap_or(100)
}

/// Completion of today's tasks, overall and per priority tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyProgress {
    pub total: u8,
    pub p80: u8,
    pub p60: u8,
    pub p20: u8,
    /// Completed task count
    pub completed: usize,
    /// Total task count
    pub tasks: usize,
}

impl DailyProgress {
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let tier = |priority: Priority| {
            let (done, all) = tasks
                .iter()
                .filter(|t| t.priority == priority)
                .fold((0, 0), |(done, all), t| (done + usize::from(t.completed), all + 1));
            percent(done, all)
        };
        let completed = tasks.iter().filter(|t| t.completed).count();

        Self {
            total: percent(completed, tasks.len()),
            p80: tier(Priority::P80),
            p60: tier(Priority::P60),
            p20: tier(Priority::P20),
            completed,
            tasks: tasks.len(),
        }
    }
}
