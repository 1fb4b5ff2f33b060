//! Time block command implementations.

use colored::Colorize;
use serde::Serialize;

use super::{print_json, tier};
use crate::cli::{BlockCommands, Context};
use crate::error::Result;
use crate::model::{default_time_blocks, NewTimeBlock, TimeBlock};
use crate::planner::Planner;
use crate::schedule::{self, BlockPhase, BlockView};
use crate::validate::{normalize_clock_time, parse_priority};

#[derive(Serialize)]
struct BlockListOutput {
    now: String,
    blocks: Vec<BlockView>,
}

#[derive(Serialize)]
struct BlockOutput<'a> {
    action: &'a str,
    block: TimeBlock,
}

#[derive(Serialize)]
struct NowOutput {
    now: String,
    block: Option<BlockView>,
}

/// Execute block commands.
///
/// # Errors
///
/// Returns an error for invalid times, unknown ids or a failed write.
pub fn execute(command: &BlockCommands, ctx: &Context, json: bool) -> Result<()> {
    let mut planner = ctx.planner()?;

    match command {
        BlockCommands::List => list(&planner, json),
        BlockCommands::Add {
            start,
            end,
            label,
            priority,
        } => {
            let block = planner.add_time_block(NewTimeBlock {
                start_time: normalize_clock_time(start)?,
                end_time: normalize_clock_time(end)?,
                label: label.trim().to_string(),
                priority: parse_priority(priority)?,
            })?;
            changed("added", block, json)
        }
        BlockCommands::Remove { id } => {
            let block = planner.remove_time_block(id)?;
            changed("removed", block, json)
        }
        BlockCommands::Now => now(&planner, json),
        BlockCommands::Reset => {
            let plan = planner.update_time_blocks(default_time_blocks())?;
            if json {
                return print_json(&BlockListOutput {
                    now: planner.clock().hhmm(),
                    blocks: schedule::block_views(&plan.time_blocks, &planner.clock().hhmm()),
                });
            }
            println!("Restored the default schedule ({} blocks).", plan.time_blocks.len());
            Ok(())
        }
    }
}

fn changed(action: &str, block: TimeBlock, json: bool) -> Result<()> {
    if json {
        return print_json(&BlockOutput { action, block });
    }
    println!(
        "{} {} - {} {}",
        action.green(),
        block.start_time,
        block.end_time,
        block.label
    );
    println!("  {}", block.id.dimmed());
    Ok(())
}

fn list(planner: &Planner, json: bool) -> Result<()> {
    let now = planner.clock().hhmm();
    let views = schedule::block_views(&planner.today_plan().time_blocks, &now);

    if json {
        return print_json(&BlockListOutput { now, blocks: views });
    }

    println!("{} (now {now})", "Time Blocks".cyan().bold());
    for view in &views {
        let block = &view.block;
        let span = format!("{} - {}", block.start_time, block.end_time);
        let line = format!("  {span}  {} {}", tier(block.priority), block.label);
        match view.phase {
            BlockPhase::Past => println!("{}", line.dimmed()),
            BlockPhase::Active => {
                let remaining = view.remaining.as_deref().unwrap_or_default();
                println!("{}  {}% {}", line.bold(), view.progress, remaining.cyan());
            }
            BlockPhase::Future => println!("{line}"),
        }
        println!("      {}", block.id.dimmed());
    }
    Ok(())
}

fn now(planner: &Planner, json: bool) -> Result<()> {
    let now = planner.clock().hhmm();
    let block = planner.current_time_block().map(|block| BlockView {
        phase: schedule::phase(&block, &now),
        progress: schedule::block_progress(&block, &now),
        remaining: schedule::time_remaining(&block, &now),
        block,
    });

    if json {
        return print_json(&NowOutput { now, block });
    }

    match block {
        Some(view) => {
            println!("{} {}", tier(view.block.priority), view.block.label.bold());
            println!("  {} - {}  {}% done", view.block.start_time, view.block.end_time, view.progress);
            if let Some(remaining) = view.remaining {
                println!("  {remaining}");
            }
        }
        None => println!("No active block at {now}."),
    }
    Ok(())
}
