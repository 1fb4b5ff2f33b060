//! Time block activity.
//!
//! Blocks are classified against the current "HH:MM" by plain string
//! comparison: past when `now >= end`, active when `start <= now < end`,
//! future otherwise.

use serde::Serialize;

use crate::model::TimeBlock;
use crate::validate::clock_minutes;

/// Where a block sits relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockPhase {
    Past,
    Active,
    Future,
}

impl BlockPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Active => "active",
            Self::Future => "future",
        }
    }
}

#[must_use]
pub fn phase(block: &TimeBlock, now: &str) -> BlockPhase {
    if now >= block.end_time.as_str() {
        BlockPhase::Past
    } else if block.contains(now) {
        BlockPhase::Active
    } else {
        BlockPhase::Future
    }
}

/// Elapsed share of a block in percent.
///
/// Past blocks report 100 and future blocks 0. For the active block the
/// elapsed fraction is rounded half-up; a block with unparsable times or
/// no positive duration reports 0.
#[must_use]
pub fn block_progress(block: &TimeBlock, now: &str) -> u8 {
    match phase(block, now) {
        BlockPhase::Past => 100,
        BlockPhase::Future => 0,
        BlockPhase::Active => {
            let (Some(start), Some(end), Some(at)) = (
                clock_minutes(&block.start_time),
                clock_minutes(&block.end_time),
                clock_minutes(now),
            ) else {
                return 0;
            };
            let duration = end - start;
            if duration <= 0 {
                return 0;
            }
            let elapsed = (at - start).clamp(0, duration);
            u8::try_from((200 * elapsed + duration) / (2 * duration)).unwrap_or(100)
        }
    }
}

/// "1h 20m remaining" / "45m remaining" for the active block, `None`
/// otherwise.
#[must_use]
pub fn time_remaining(block: &TimeBlock, now: &str) -> Option<String> {
    if phase(block, now) != BlockPhase::Active {
        return None;
    }
    let left = clock_minutes(&block.end_time)? - clock_minutes(now)?;
    let (hours, minutes) = (left / 60, left % 60);
    Some(if hours > 0 {
        format!("{hours}h {minutes}m remaining")
    } else {
        format!("{minutes}m remaining")
    })
}

/// First block in list order containing `now`.
#[must_use]
pub fn active_block<'a>(blocks: &'a [TimeBlock], now: &str) -> Option<&'a TimeBlock> {
    blocks.iter().find(|b| b.contains(now))
}

/// A block annotated for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    #[serde(flatten)]
    pub block: TimeBlock,
    pub phase: BlockPhase,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
}

/// Annotate every block against `now`.
#[must_use]
pub fn block_views(blocks: &[TimeBlock], now: &str) -> Vec<BlockView> {
    blocks
        .iter()
        .map(|block| BlockView {
            block: block.clone(),
            phase: phase(block, now),
            progress: block_progress(block, now),
            remaining: time_remaining(block, now),
        })
        .collect()
}

/// Reports each block once, when it first becomes current.
#[derive(Debug, Clone, Default)]
pub struct BlockMonitor {
    last_notified: Option<String>,
}

impl BlockMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current block; returns it if it differs from the last
    /// one reported. Gaps between blocks do not reset the monitor.
    pub fn observe<'a>(&mut self, current: Option<&'a TimeBlock>) -> Option<&'a TimeBlock> {
        let block = current?;
        if self.last_notified.as_deref() == Some(block.id.as_str()) {
            return None;
        }
        self.last_notified = Some(block.id.clone());
        Some(block)
    }

    #[must_use]
    pub fn last_notified(&self) -> Option<&str> {
        self.last_notified.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_time_blocks, Priority};

    fn block(id: &str, start: &str, end: &str) -> TimeBlock {
        TimeBlock {
            id: id.into(),
            start_time: start.into(),
            end_time: end.into(),
            label: format!("block {id}"),
            priority: Priority::P80,
            task_ids: Vec::new(),
        }
    }

    #[test]
    fn test_progress_through_an_hour() {
        let b = block("x", "09:00", "10:00");
        assert_eq!(block_progress(&b, "08:59"), 0);
        assert_eq!(block_progress(&b, "09:00"), 0);
        assert_eq!(block_progress(&b, "09:30"), 50);
        assert_eq!(phase(&b, "10:00"), BlockPhase::Past);
        assert!(block_progress(&b, "10:00") >= 100);
    }

    #[test]
    fn test_degenerate_block_reports_zero() {
        let b = block("x", "9am", "10:00");
        // Unparsable start still compares as a string
        assert_eq!(phase(&b, "09:30"), BlockPhase::Future);
        let inverted = block("y", "10:00", "09:00");
        assert_eq!(block_progress(&inverted, "09:30"), 100);
        let bad = block("z", "09:00", "1x:00");
        assert_eq!(phase(&bad, "09:30"), BlockPhase::Active);
        assert_eq!(block_progress(&bad, "09:30"), 0);
    }

    #[test]
    fn test_time_remaining_format() {
        let b = block("x", "08:00", "12:00");
        assert_eq!(time_remaining(&b, "10:40").as_deref(), Some("1h 20m remaining"));
        assert_eq!(time_remaining(&b, "11:15").as_deref(), Some("45m remaining"));
        assert_eq!(time_remaining(&b, "12:00"), None);
    }

    #[test]
    fn test_overlap_picks_first_in_list() {
        let blocks = vec![block("a", "09:00", "11:00"), block("b", "10:00", "12:00")];
        assert_eq!(active_block(&blocks, "10:30").unwrap().id, "a");
        assert_eq!(active_block(&blocks, "11:30").unwrap().id, "b");
        assert!(active_block(&blocks, "12:00").is_none());
    }

    #[test]
    fn test_default_schedule_at_lunch() {
        let blocks = default_time_blocks();
        assert_eq!(active_block(&blocks, "12:30").unwrap().id, "4");
        assert!(active_block(&blocks, "21:00").is_none());
    }

    #[test]
    fn test_monitor_reports_each_block_once() {
        let first = block("1", "09:00", "10:00");
        let second = block("2", "10:00", "11:00");
        let mut monitor = BlockMonitor::new();

        assert_eq!(monitor.observe(Some(&first)).map(|b| b.id.as_str()), Some("1"));
        assert!(monitor.observe(Some(&first)).is_none());
        assert!(monitor.observe(None).is_none());
        assert!(monitor.observe(Some(&first)).is_none());
        assert_eq!(monitor.observe(Some(&second)).map(|b| b.id.as_str()), Some("2"));
        assert_eq!(monitor.last_notified(), Some("2"));
    }

    #[test]
    fn test_block_views() {
        let views = block_views(&[block("a", "08:00", "09:00"), block("b", "09:00", "10:00")], "09:15");
        assert_eq!(views[0].phase, BlockPhase::Past);
        assert_eq!(views[1].phase, BlockPhase::Active);
        assert_eq!(views[1].progress, 25);
        assert_eq!(views[1].remaining.as_deref(), Some("45m remaining"));
    }
}
