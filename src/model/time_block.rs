//! Time block model and the default daily schedule.

use serde::{Deserialize, Serialize};

use super::Priority;

/// A scheduled interval of the day.
///
/// Times are zero-padded 24-hour "HH:MM" strings, so lexicographic order
/// matches chronological order within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub label: String,
    pub priority: Priority,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

impl TimeBlock {
    /// Whether `now` ("HH:MM") falls in `[start_time, end_time)`.
    #[must_use]
    pub fn contains(&self, now: &str) -> bool {
        now >= self.start_time.as_str() && now < self.end_time.as_str()
    }
}

/// Input for adding a block to today's schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeBlock {
    pub start_time: String,
    pub end_time: String,
    pub label: String,
    pub priority: Priority,
}

impl NewTimeBlock {
    /// Materialize the block with a fresh id.
    #[must_use]
    pub fn into_block(self) -> TimeBlock {
        TimeBlock {
            id: format!("block_{}", uuid::Uuid::new_v4().simple()),
            start_time: self.start_time,
            end_time: self.end_time,
            label: self.label,
            priority: self.priority,
            task_ids: Vec::new(),
        }
    }
}

/// The fixed seven-block schedule every new day starts with.
#[must_use]
pub fn default_time_blocks() -> Vec<TimeBlock> {
    const SCHEDULE: [(&str, &str, &str, &str, Priority); 7] = [
        ("1", "05:00", "07:00", "80% - Deep Work Block 1", Priority::P80),
        ("2", "07:00", "08:00", "60% - Admin & Planning", Priority::P60),
        ("3", "08:00", "12:00", "80% - Revenue Generation", Priority::P80),
        ("4", "12:00", "13:00", "20% - Break & Recovery", Priority::P20),
        ("5", "13:00", "17:00", "80% - Deep Work Block 2", Priority::P80),
        ("6", "17:00", "18:00", "60% - Review & Prep", Priority::P60),
        ("7", "18:00", "20:00", "20% - Personal Development", Priority::P20),
    ];

    SCHEDULE
        .iter()
        .map(|(id, start, end, label, priority)| TimeBlock {
            id: (*id).to_string(),
            start_time: (*start).to_string(),
            end_time: (*end).to_string(),
            label: (*label).to_string(),
            priority: *priority,
            task_ids: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_sorted_and_contiguous() {
        let blocks = default_time_blocks();
        assert_eq!(blocks.len(), 7);
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        assert_eq!(blocks[0].start_time, "05:00");
        assert_eq!(blocks[6].end_time, "20:00");
    }

    #[test]
    fn test_contains_is_half_open() {
        let block = &default_time_blocks()[1];
        assert!(block.contains("07:00"));
        assert!(block.contains("07:59"));
        assert!(!block.contains("08:00"));
        assert!(!block.contains("06:59"));
    }

    #[test]
    fn test_legacy_is_active_flag_is_ignored() {
        let json = r#"{"id":"1","startTime":"05:00","endTime":"07:00","label":"x","priority":"80","taskIds":[],"isActive":false}"#;
        let block: TimeBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.id, "1");
    }
}
