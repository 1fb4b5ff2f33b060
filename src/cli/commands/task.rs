//! Task command implementations.

use colored::Colorize;
use serde::Serialize;

use super::{check, print_json, tier};
use crate::cli::{Context, TaskCommands};
use crate::error::Result;
use crate::model::{NewTask, Task};
use crate::planner::{DailyProgress, Planner};
use crate::validate::{parse_date, parse_priority};

#[derive(Serialize)]
struct TaskOutput<'a> {
    action: &'a str,
    task: Task,
    progress: DailyProgress,
}

#[derive(Serialize)]
struct TaskListOutput {
    date: String,
    tasks: Vec<Task>,
    progress: DailyProgress,
}

/// Execute task commands.
///
/// # Errors
///
/// Returns an error for invalid input, unknown ids or a failed write.
pub fn execute(command: &TaskCommands, ctx: &Context, json: bool) -> Result<()> {
    let mut planner = ctx.planner()?;

    match command {
        TaskCommands::Add {
            title,
            priority,
            estimate,
            due,
            notes,
        } => {
            let mut task = NewTask::new(title.trim(), parse_priority(priority)?);
            if let Some(minutes) = estimate {
                task = task.with_estimate(*minutes);
            }
            if let Some(due) = due {
                task = task.with_due_date(&parse_date(due)?.to_string());
            }
            if let Some(notes) = notes {
                task = task.with_notes(notes);
            }
            let task = planner.add_task(task)?;
            report(&planner, "added", task, json)
        }
        TaskCommands::Toggle { id } => {
            let task = planner.toggle_task(id)?;
            let action = if task.completed { "completed" } else { "reopened" };
            report(&planner, action, task, json)
        }
        TaskCommands::Delete { id } => {
            let task = planner.delete_task(id)?;
            report(&planner, "deleted", task, json)
        }
        TaskCommands::List => list(&planner, json),
    }
}

fn report(planner: &Planner, action: &str, task: Task, json: bool) -> Result<()> {
    let progress = planner.daily_progress();
    if json {
        return print_json(&TaskOutput { action, task, progress });
    }

    println!("{} {} {}", action.green(), tier(task.priority), task.title);
    println!("  {}", task.id.dimmed());
    println!("Today: {}% ({}/{})", progress.total, progress.completed, progress.tasks);
    Ok(())
}

fn list(planner: &Planner, json: bool) -> Result<()> {
    let plan = planner.today_plan();
    let progress = DailyProgress::from_tasks(&plan.tasks);

    if json {
        return print_json(&TaskListOutput {
            date: plan.date.to_string(),
            tasks: plan.tasks,
            progress,
        });
    }

    if plan.tasks.is_empty() {
        println!("No tasks for {}.", plan.date);
        return Ok(());
    }

    println!("{} {}", "Tasks".cyan().bold(), plan.date);
    for task in &plan.tasks {
        let estimate = task.time_estimate.map(|m| format!(" ({m}m)")).unwrap_or_default();
        println!("  {} {} {}{estimate}", check(task.completed), tier(task.priority), task.title);
        println!("      {}", task.id.dimmed());
        if let Some(notes) = &task.notes {
            println!("      {notes}");
        }
    }
    println!();
    println!(
        "{}% complete  (80: {}%  60: {}%  20: {}%)",
        progress.total, progress.p80, progress.p60, progress.p20
    );
    Ok(())
}
