//! Week command implementation.

use chrono::{Days, NaiveDate};
use colored::Colorize;
use serde::Serialize;

use super::{check, print_json};
use crate::cli::Context;
use crate::error::Result;
use crate::model::DailyPlan;
use crate::planner::DailyProgress;
use crate::validate::parse_date;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DaySummary {
    date: NaiveDate,
    stored: bool,
    completed: bool,
    intention: String,
    progress: DailyProgress,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeekOutput {
    from: NaiveDate,
    to: NaiveDate,
    days: Vec<DaySummary>,
    days_completed: usize,
    tasks_completed: usize,
    tasks_total: usize,
    /// Mean of daily totals over days that had tasks
    average_completion: u8,
}

impl DaySummary {
    fn new(date: NaiveDate, plan: Option<&DailyPlan>) -> Self {
        match plan {
            Some(plan) => Self {
                date,
                stored: true,
                completed: plan.completed,
                intention: plan.intention.clone(),
                progress: DailyProgress::from_tasks(&plan.tasks),
            },
            None => Self {
                date,
                stored: false,
                completed: false,
                intention: String::new(),
                progress: DailyProgress::default(),
            },
        }
    }
}

fn summarize(from: NaiveDate, to: NaiveDate, days: Vec<DaySummary>) -> WeekOutput {
    let active: Vec<u32> = days
        .iter()
        .filter(|d| d.progress.tasks > 0)
        .map(|d| u32::from(d.progress.total))
        .collect();
    let average = match u32::try_from(active.len()) {
        Ok(n) if n > 0 => active.iter().sum::<u32>() / n,
        _ => 0,
    };

    WeekOutput {
        from,
        to,
        days_completed: days.iter().filter(|d| d.completed).count(),
        tasks_completed: days.iter().map(|d| d.progress.completed).sum(),
        tasks_total: days.iter().map(|d| d.progress.tasks).sum(),
        average_completion: u8::try_from(average).unwrap_or(100),
        days,
    }
}

/// Summarize the seven days ending at `until` (default today).
///
/// # Errors
///
/// Returns an error for an invalid date or if the planner cannot be opened.
pub fn execute(until: Option<&str>, ctx: &Context, json: bool) -> Result<()> {
    let planner = ctx.planner()?;
    let to = match until {
        Some(date) => parse_date(date)?,
        None => planner.today(),
    };
    let from = to.checked_sub_days(Days::new(6)).unwrap_or(to);

    let days = from
        .iter_days()
        .take_while(|d| *d <= to)
        .map(|date| DaySummary::new(date, planner.plan_for(date)))
        .collect();
    let output = summarize(from, to, days);

    if json {
        return print_json(&output);
    }

    println!("{} {} to {}", "Week".cyan().bold(), output.from, output.to);
    for day in &output.days {
        let label = day.date.format("%a %m-%d").to_string();
        if day.stored {
            println!(
                "  {} {label}  {:>3}% ({}/{})  {}",
                check(day.completed),
                day.progress.total,
                day.progress.completed,
                day.progress.tasks,
                day.intention
            );
        } else {
            println!("  {}", format!("  {label}  no plan").dimmed());
        }
    }
    println!();
    println!(
        "Days completed: {}/7   Tasks: {}/{}   Average: {}%",
        output.days_completed, output.tasks_completed, output.tasks_total, output.average_completion
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTask, Priority};

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_summary_averages_days_with_tasks() {
        let mut monday = DailyPlan::new(date("2024-05-20"));
        let mut done = NewTask::new("a", Priority::P80).into_task();
        done.completed = true;
        monday.tasks = vec![done, NewTask::new("b", Priority::P60).into_task()];
        monday.completed = true;

        let mut tuesday = DailyPlan::new(date("2024-05-21"));
        let mut all = NewTask::new("c", Priority::P20).into_task();
        all.completed = true;
        tuesday.tasks = vec![all];

        let days = vec![
            DaySummary::new(monday.date, Some(&monday)),
            DaySummary::new(tuesday.date, Some(&tuesday)),
            DaySummary::new(date("2024-05-22"), None),
        ];
        let week = summarize(date("2024-05-20"), date("2024-05-22"), days);
        assert_eq!(week.days_completed, 1);
        assert_eq!(week.tasks_completed, 2);
        assert_eq!(week.tasks_total, 3);
        assert_eq!(week.average_completion, 75);
    }
}
