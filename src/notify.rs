//! Planner notifications.
//!
//! Messages are plain data; how they are shown is up to a [`Notifier`].
//! The CLI uses [`TerminalNotifier`].

use std::io::{self, Write};

use chrono::{NaiveDate, NaiveDateTime};
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Priority, Task, TimeBlock};

/// A notification ready to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Identifies the kind of message; repeated tags replace each other
    pub tag: String,
}

impl Notification {
    fn new(title: &str, body: String, tag: String) -> Self {
        Self {
            title: title.to_string(),
            body,
            tag,
        }
    }

    #[must_use]
    pub fn block_started(block: &TimeBlock) -> Self {
        Self::new(
            "THE OPERATOR - Time Block Started",
            format!("{}\n{} - {}", block.label, block.start_time, block.end_time),
            format!("block-{}", block.id),
        )
    }

    #[must_use]
    pub fn morning_briefing(tasks: &[Task], sacrifice: &str) -> Self {
        let high = tasks.iter().filter(|t| t.priority == Priority::P80).count();
        let sacrifice = if sacrifice.trim().is_empty() {
            "Set your daily sacrifice!".to_string()
        } else {
            format!("Today's sacrifice: {sacrifice}")
        };
        Self::new(
            "THE OPERATOR - Morning Briefing",
            format!("{} tasks today ({high} high priority)\n{sacrifice}", tasks.len()),
            "morning-briefing".into(),
        )
    }

    #[must_use]
    pub fn end_of_day(completion: u8) -> Self {
        let body = if completion >= 80 {
            format!("{completion}% complete. Outstanding execution today.")
        } else {
            format!("{completion}% complete. No excuses. Get it done.")
        };
        Self::new("THE OPERATOR - End of Day", body, "eod-reminder".into())
    }

    #[must_use]
    pub fn wake() -> Self {
        Self::new(
            "THE OPERATOR - Rise and Execute",
            "Your day awaits. Set your intention and dominate.".into(),
            "morning-wake".into(),
        )
    }

    #[must_use]
    pub fn review() -> Self {
        Self::new(
            "THE OPERATOR - Daily Review",
            "Time to review your day. Did you honor your commitments?".into(),
            "evening-review".into(),
        )
    }
}

/// Wake and review reminders at fixed wall-clock minutes.
///
/// Each reminder fires at most once per day, however often it is polled
/// during its minute.
#[derive(Debug, Clone)]
pub struct DailyReminders {
    morning: String,
    evening: String,
    fired: Vec<(NaiveDate, String)>,
}

impl DailyReminders {
    #[must_use]
    pub fn new(morning: &str, evening: &str) -> Self {
        Self {
            morning: morning.to_string(),
            evening: evening.to_string(),
            fired: Vec::new(),
        }
    }

    /// Reminders whose minute is `now` and that have not fired today.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<Notification> {
        let today = now.date();
        let hhmm = now.format("%H:%M").to_string();
        self.fired.retain(|(date, _)| *date == today);

        let mut due = Vec::new();
        for (time, build) in [
            (self.morning.clone(), Notification::wake as fn() -> Notification),
            (self.evening.clone(), Notification::review),
        ] {
            let key = (today, time.clone());
            if time == hhmm && !self.fired.contains(&key) {
                self.fired.push(key);
                due.push(build());
            }
        }
        due
    }
}

/// Something that can show a notification.
pub trait Notifier {
    /// # Errors
    ///
    /// Returns an error if the notification cannot be delivered.
    fn notify(&mut self, notification: &Notification) -> Result<()>;
}

/// Prints notifications to a terminal, optionally ringing the bell.
pub struct TerminalNotifier<W: Write> {
    out: W,
    bell: bool,
    json: bool,
}

impl TerminalNotifier<io::Stdout> {
    #[must_use]
    pub fn stdout(bell: bool, json: bool) -> Self {
        Self::new(io::stdout(), bell, json)
    }
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W, bell: bool, json: bool) -> Self {
        Self { out, bell, json }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string(notification)?)?;
        } else {
            if self.bell {
                write!(self.out, "\x07")?;
            }
            writeln!(self.out, "{}", notification.title.bold())?;
            for line in notification.body.lines() {
                writeln!(self.out, "  {line}")?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
