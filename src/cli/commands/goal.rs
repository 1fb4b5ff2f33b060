//! Goal command implementations.

use colored::Colorize;
use serde::Serialize;

use super::print_json;
use crate::cli::{Context, GoalAddArgs, GoalCommands, GoalUpdateArgs};
use crate::error::{Error, Result};
use crate::model::{Goal, GoalPatch, GoalType, NewGoal};
use crate::planner::Planner;
use crate::validate::{parse_goal_type, parse_quarter};

#[derive(Serialize)]
struct GoalOutput<'a> {
    action: &'a str,
    goal: Goal,
}

#[derive(Serialize)]
struct GoalListOutput<'a> {
    goals: Vec<&'a Goal>,
    count: usize,
}

#[derive(Serialize)]
struct GoalDeleteOutput<'a> {
    id: &'a str,
    deleted: bool,
}

/// Execute goal commands.
///
/// # Errors
///
/// Returns an error for invalid input, unknown ids or a failed write.
pub fn execute(command: &GoalCommands, ctx: &Context, json: bool) -> Result<()> {
    let mut planner = ctx.planner()?;

    match command {
        GoalCommands::Add(args) => {
            let goal = planner.add_goal(new_goal(args)?)?;
            show(&GoalOutput { action: "added", goal }, json)
        }
        GoalCommands::List { goal_type, quarter } => {
            list(&planner, goal_type.as_deref(), quarter.as_deref(), json)
        }
        GoalCommands::Update(args) => {
            let patch = patch_from(args)?;
            if patch.is_empty() {
                return Err(Error::InvalidArgument("Nothing to update".into()));
            }
            let goal = planner.update_goal(&args.id, &patch)?;
            show(&GoalOutput { action: "updated", goal }, json)
        }
        GoalCommands::Delete { id } => {
            planner.delete_goal(id)?;
            if json {
                return print_json(&GoalDeleteOutput { id, deleted: true });
            }
            println!("Deleted goal {id}");
            Ok(())
        }
    }
}

fn new_goal(args: &GoalAddArgs) -> Result<NewGoal> {
    let goal_type = parse_goal_type(&args.goal_type)?;
    let quarter = args.quarter.as_deref().map(parse_quarter).transpose()?;
    if quarter.is_some() && goal_type == GoalType::Annual {
        return Err(Error::InvalidArgument(
            "A quarter only applies to quarterly goals (use --type quarterly)".into(),
        ));
    }

    Ok(NewGoal {
        name: args.name.trim().to_string(),
        why_it_matters: args.why.clone().unwrap_or_default(),
        success_metric: args.metric.clone().unwrap_or_default(),
        deadline: args.deadline.clone().unwrap_or_default(),
        progress: args.progress.unwrap_or(0),
        goal_type,
        quarter,
    })
}

fn patch_from(args: &GoalUpdateArgs) -> Result<GoalPatch> {
    let quarter = if args.clear_quarter {
        Some(None)
    } else {
        args.quarter.as_deref().map(parse_quarter).transpose()?.map(Some)
    };

    Ok(GoalPatch {
        name: args.name.clone(),
        why_it_matters: args.why.clone(),
        success_metric: args.metric.clone(),
        deadline: args.deadline.clone(),
        progress: args.progress,
        goal_type: args.goal_type.as_deref().map(parse_goal_type).transpose()?,
        quarter,
    })
}

fn show(output: &GoalOutput<'_>, json: bool) -> Result<()> {
    if json {
        return print_json(output);
    }
    println!("{} goal {}", output.action.green(), output.goal.name.bold());
    print_goal(&output.goal);
    Ok(())
}

fn list(planner: &Planner, goal_type: Option<&str>, quarter: Option<&str>, json: bool) -> Result<()> {
    let quarter = quarter.map(parse_quarter).transpose()?;
    let goals: Vec<&Goal> = match goal_type.map(parse_goal_type).transpose()? {
        Some(goal_type) => planner.goals_for(goal_type, quarter),
        None if quarter.is_some() => planner.goals_for(GoalType::Quarterly, quarter),
        None => planner.goals().iter().collect(),
    };

    if json {
        let count = goals.len();
        return print_json(&GoalListOutput { goals, count });
    }

    if goals.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!("{} ({})", "Goals".cyan().bold(), goals.len());
    for goal in goals {
        println!();
        println!("  {}", goal.name.bold());
        print_goal(goal);
    }
    Ok(())
}

fn print_goal(goal: &Goal) {
    let horizon = match goal.quarter {
        Some(q) => format!("{} Q{q}", goal.goal_type.as_str()),
        None => goal.goal_type.as_str().to_string(),
    };
    println!("    {}  {horizon}  {}%", goal.id.dimmed(), goal.progress);
    if !goal.why_it_matters.is_empty() {
        println!("    Why:      {}", goal.why_it_matters);
    }
    if !goal.success_metric.is_empty() {
        println!("    Metric:   {}", goal.success_metric);
    }
    if !goal.deadline.is_empty() {
        println!("    Deadline: {}", goal.deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_args(goal_type: &str, quarter: Option<&str>) -> GoalAddArgs {
        GoalAddArgs {
            name: "  Launch  ".into(),
            goal_type: goal_type.into(),
            quarter: quarter.map(str::to_string),
            why: None,
            metric: Some("10 customers".into()),
            deadline: None,
            progress: None,
        }
    }

    #[test]
    fn test_new_goal_from_args() {
        let goal = new_goal(&add_args("quarterly", Some("Q3"))).unwrap();
        assert_eq!(goal.name, "Launch");
        assert_eq!(goal.goal_type, GoalType::Quarterly);
        assert_eq!(goal.quarter, Some(3));
        assert_eq!(goal.success_metric, "10 customers");
    }

    #[test]
    fn test_quarter_on_annual_goal_is_rejected() {
        let err = new_goal(&add_args("annual", Some("2"))).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_update_patch_quarter_handling() {
        let mut args = GoalUpdateArgs {
            id: "g".into(),
            name: None,
            why: None,
            metric: None,
            deadline: None,
            progress: Some(40),
            goal_type: None,
            quarter: Some("4".into()),
            clear_quarter: false,
        };
        let patch = patch_from(&args).unwrap();
        assert_eq!(patch.quarter, Some(Some(4)));
        assert_eq!(patch.progress, Some(40));

        args.quarter = None;
        args.clear_quarter = true;
        assert_eq!(patch_from(&args).unwrap().quarter, Some(None));
    }
}
