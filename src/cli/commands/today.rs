//! Today command implementation.

use colored::Colorize;
use serde::Serialize;

use super::{check, or_unset, print_json, tier};
use crate::cli::{Context, TodayArgs};
use crate::error::Result;
use crate::model::{DailyPlan, DailyPlanPatch, TimeBlock};
use crate::planner::DailyProgress;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TodayOutput {
    source: &'static str,
    updated: bool,
    plan: DailyPlan,
    progress: DailyProgress,
    current_block: Option<TimeBlock>,
    streak: u32,
}

fn patch_from(args: &TodayArgs) -> DailyPlanPatch {
    let completed = if args.complete {
        Some(true)
    } else if args.reopen {
        Some(false)
    } else {
        None
    };
    DailyPlanPatch {
        intention: args.intention.clone(),
        sacrifice: args.sacrifice.clone(),
        comfort_refused: args.comfort.clone(),
        end_of_day_review: args.review.clone(),
        completed,
        ..DailyPlanPatch::default()
    }
}

/// Show today's plan, applying any commitment flags first.
///
/// # Errors
///
/// Returns an error if the planner cannot be opened or the write fails.
pub fn execute(args: &TodayArgs, ctx: &Context, json: bool) -> Result<()> {
    let mut planner = ctx.planner()?;
    let patch = patch_from(args);
    let updated = !patch.is_empty();

    let plan = if updated {
        planner.update_today_plan(patch)?
    } else {
        planner.today_plan()
    };

    let output = TodayOutput {
        source: planner.kind().as_str(),
        updated,
        progress: DailyProgress::from_tasks(&plan.tasks),
        current_block: planner.current_time_block(),
        streak: planner.streak(),
        plan,
    };

    if json {
        return print_json(&output);
    }

    let plan = &output.plan;
    println!("{} {}", "Today".cyan().bold(), plan.date.format("%A, %B %-d, %Y"));
    if plan.completed {
        println!("{}", "Day complete".green().bold());
    }
    println!();
    println!("  Intention:        {}", or_unset(&plan.intention));
    println!("  Sacrifice:        {}", or_unset(&plan.sacrifice));
    println!("  Comfort refused:  {}", or_unset(&plan.comfort_refused));
    if !plan.has_commitments() {
        println!("  {}", "Set all three commitments before you start.".yellow());
    }
    println!();

    println!(
        "{} {}% ({}/{})",
        "Tasks".cyan().bold(),
        output.progress.total,
        output.progress.completed,
        output.progress.tasks
    );
    if plan.tasks.is_empty() {
        println!("  {}", "No tasks yet. Add one with `op task add`.".dimmed());
    }
    for task in &plan.tasks {
        println!("  {} {} {}", check(task.completed), tier(task.priority), task.title);
    }
    println!();

    match &output.current_block {
        Some(block) => println!(
            "{} {} ({} - {})",
            "Now:".cyan().bold(),
            block.label,
            block.start_time,
            block.end_time
        ),
        None => println!("{} {}", "Now:".cyan().bold(), "no active block".dimmed()),
    }
    println!("{} {} days", "Streak:".cyan().bold(), output.streak);

    if !plan.end_of_day_review.is_empty() {
        println!();
        println!("{}", "Review".cyan().bold());
        println!("  {}", plan.end_of_day_review);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_from_flags() {
        let args = TodayArgs {
            intention: Some("Ship it".into()),
            complete: true,
            ..TodayArgs::default()
        };
        let patch = patch_from(&args);
        assert_eq!(patch.intention.as_deref(), Some("Ship it"));
        assert_eq!(patch.completed, Some(true));
        assert!(patch.sacrifice.is_none());

        let reopen = TodayArgs {
            reopen: true,
            ..TodayArgs::default()
        };
        assert_eq!(patch_from(&reopen).completed, Some(false));
        assert!(patch_from(&TodayArgs::default()).is_empty());
    }
}
