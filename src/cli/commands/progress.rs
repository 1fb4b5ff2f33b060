//! Progress command implementation.

use colored::Colorize;
use serde::Serialize;

use super::print_json;
use crate::cli::Context;
use crate::error::Result;
use crate::planner::DailyProgress;

#[derive(Serialize)]
struct ProgressOutput {
    date: String,
    #[serde(flatten)]
    progress: DailyProgress,
}

fn bar(percent: u8) -> String {
    const WIDTH: usize = 20;
    let filled = usize::from(percent) * WIDTH / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled))
}

/// Show today's completion overall and by tier.
///
/// # Errors
///
/// Returns an error if the planner cannot be opened.
pub fn execute(ctx: &Context, json: bool) -> Result<()> {
    let planner = ctx.planner()?;
    let output = ProgressOutput {
        date: planner.today().to_string(),
        progress: planner.daily_progress(),
    };

    if json {
        return print_json(&output);
    }

    let p = &output.progress;
    println!("{} {}", "Progress".cyan().bold(), output.date);
    println!("  Total  {} {:>3}%  ({}/{})", bar(p.total), p.total, p.completed, p.tasks);
    println!("  80%    {} {:>3}%", bar(p.p80).red(), p.p80);
    println!("  60%    {} {:>3}%", bar(p.p60).yellow(), p.p60);
    println!("  20%    {} {:>3}%", bar(p.p20).dimmed(), p.p20);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width() {
        assert_eq!(bar(0).chars().count(), 20);
        assert_eq!(bar(100), "█".repeat(20));
        assert_eq!(bar(50).chars().filter(|c| *c == '█').count(), 10);
    }
}
