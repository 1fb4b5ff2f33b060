//! Status command implementation.

use colored::Colorize;
use serde::Serialize;

use super::print_json;
use crate::cli::Context;
use crate::config::planner_document_path;
use crate::error::Result;
use crate::planner::DailyProgress;
use crate::sync::SyncStatus;

/// Output for status command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput {
    source: &'static str,
    home: String,
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<SyncStatus>,
    today: String,
    progress: DailyProgress,
    streak: u32,
    goal_count: usize,
    stored_plans: usize,
}

/// Show where the planner lives and how it is doing.
///
/// # Errors
///
/// Returns an error if the planner cannot be opened.
pub fn execute(ctx: &Context, json: bool) -> Result<()> {
    let planner = ctx.planner()?;
    let authenticated = planner.is_authenticated();

    let output = StatusOutput {
        source: planner.kind().as_str(),
        home: ctx.config.home.display().to_string(),
        authenticated,
        email: planner.user().map(|u| u.email.clone()),
        document: (!authenticated)
            .then(|| planner_document_path(&ctx.config.home).display().to_string()),
        sync: planner.sync_status().cloned(),
        today: planner.today().to_string(),
        progress: planner.daily_progress(),
        streak: planner.streak(),
        goal_count: planner.goals().len(),
        stored_plans: planner.state().daily_plans.len(),
    };

    if json {
        return print_json(&output);
    }

    println!("{}", "The Operator".cyan().bold());
    println!();
    match &output.email {
        Some(email) => println!("Planner:  remote ({email})"),
        None => println!("Planner:  local"),
    }
    if let Some(document) = &output.document {
        println!("Document: {document}");
    }
    if let Some(sync) = &output.sync {
        let summary = sync.summary();
        if sync.error.is_some() {
            println!("Sync:     {}", summary.yellow());
        } else {
            println!("Sync:     {summary}");
        }
    }
    println!("Home:     {}", output.home);
    println!();
    println!(
        "Today {}: {}% ({}/{} tasks)",
        output.today, output.progress.total, output.progress.completed, output.progress.tasks
    );
    println!("Streak: {} days   Goals: {}   Plans stored: {}", output.streak, output.goal_count, output.stored_plans);
    Ok(())
}
