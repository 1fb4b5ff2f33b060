//! Command implementations.

pub mod auth;
pub mod block;
pub mod code;
pub mod completions;
pub mod goal;
pub mod progress;
pub mod status;
pub mod subscription;
pub mod task;
pub mod today;
pub mod version;
pub mod watch;
pub mod week;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::error::Result;
use crate::model::Priority;

/// Print `value` as one line of JSON.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Colored tier label: red for 80, yellow for 60, dimmed for 20.
fn tier(priority: Priority) -> ColoredString {
    let label = format!("[{priority}]");
    match priority {
        Priority::P80 => label.red().bold(),
        Priority::P60 => label.yellow(),
        Priority::P20 => label.dimmed(),
    }
}

fn check(done: bool) -> ColoredString {
    if done { "✓".green() } else { "○".normal() }
}

/// Show `text`, or a dimmed placeholder when it is blank.
fn or_unset(text: &str) -> ColoredString {
    if text.trim().is_empty() {
        "(not set)".dimmed()
    } else {
        text.normal()
    }
}
