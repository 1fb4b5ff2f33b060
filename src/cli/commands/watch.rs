//! Watch command implementation.
//!
//! Polls the planner on an interval: announces each time block as it
//! becomes current and sends the daily wake and review reminders.

use std::thread;
use std::time::Duration;

use colored::Colorize;
use tracing::{debug, info};

use crate::cli::{Context, WatchArgs};
use crate::error::Result;
use crate::notify::{DailyReminders, Notification, Notifier, TerminalNotifier};
use crate::planner::Planner;
use crate::schedule::BlockMonitor;

/// Per-run watch state.
struct Watcher {
    monitor: BlockMonitor,
    reminders: DailyReminders,
}

impl Watcher {
    fn new(morning: &str, evening: &str) -> Self {
        Self {
            monitor: BlockMonitor::new(),
            reminders: DailyReminders::new(morning, evening),
        }
    }

    /// Notifications due on this check.
    fn tick(&mut self, planner: &mut Planner) -> Vec<Notification> {
        let applied = planner.refresh();
        if applied > 0 {
            debug!(applied, "Applied planner changes");
        }

        let mut due = Vec::new();
        let current = planner.current_time_block();
        if let Some(block) = self.monitor.observe(current.as_ref()) {
            due.push(Notification::block_started(block));
        }

        let now = planner.clock().now();
        for reminder in self.reminders.due(now) {
            let follow_up = match reminder.tag.as_str() {
                "morning-wake" => {
                    let plan = planner.today_plan();
                    Some(Notification::morning_briefing(&plan.tasks, &plan.sacrifice))
                }
                "evening-review" => Some(Notification::end_of_day(planner.daily_progress().total)),
                _ => None,
            };
            due.push(reminder);
            due.extend(follow_up);
        }
        due
    }
}

/// Run the watch loop (or a single check with `--once`).
///
/// # Errors
///
/// Returns an error if the planner cannot be opened or output fails.
pub fn execute(args: &WatchArgs, ctx: &Context, json: bool) -> Result<()> {
    let mut planner = ctx.planner()?;
    let mut watcher = Watcher::new(&ctx.config.morning_time, &ctx.config.evening_time);
    let mut notifier = TerminalNotifier::stdout(!args.no_bell, json);
    let interval = args
        .interval
        .map_or(ctx.config.watch_interval, Duration::from_secs)
        .max(Duration::from_secs(1));

    if !json && !args.once {
        println!(
            "{} every {}s ({} planner). Ctrl-C to stop.",
            "Watching".cyan().bold(),
            interval.as_secs(),
            planner.kind().as_str()
        );
    }
    info!(interval_secs = interval.as_secs(), "Starting watch");

    loop {
        let due = watcher.tick(&mut planner);
        for notification in &due {
            notifier.notify(notification)?;
        }

        if args.once {
            if due.is_empty() && !json {
                println!("Nothing due at {}.", planner.clock().hhmm());
            }
            return Ok(());
        }
        thread::sleep(interval);
    }
}
