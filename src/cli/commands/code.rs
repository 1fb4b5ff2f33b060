//! Operating code command implementations.

use colored::Colorize;
use serde::Serialize;

use super::{or_unset, print_json};
use crate::cli::{CodeCommands, Context};
use crate::error::{Error, Result};
use crate::model::{OperatingCode, OperatingCodePatch};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CodeOutput<'a> {
    operating_code: &'a OperatingCode,
    streak: u32,
}

/// Execute operating code commands.
///
/// # Errors
///
/// Returns an error for invalid input or a failed write.
pub fn execute(command: &CodeCommands, ctx: &Context, json: bool) -> Result<()> {
    let mut planner = ctx.planner()?;

    let patch = match command {
        CodeCommands::Show => None,
        CodeCommands::Set {
            sacrifice,
            commitment,
            comfort,
        } => Some(OperatingCodePatch {
            daily_sacrifice: sacrifice.clone(),
            daily_commitment: commitment.clone(),
            comfort_refused: comfort.clone(),
            ..OperatingCodePatch::default()
        }),
        CodeCommands::AddPrinciple { text } => {
            let text = text.trim();
            if text.is_empty() {
                return Err(Error::InvalidArgument("Principle cannot be empty".into()));
            }
            let mut principles = planner.operating_code().principles.clone();
            principles.push(text.to_string());
            Some(OperatingCodePatch {
                principles: Some(principles),
                ..OperatingCodePatch::default()
            })
        }
        CodeCommands::RemovePrinciple { index } => {
            let principles = remove_principle(&planner.operating_code().principles, *index)?;
            Some(OperatingCodePatch {
                principles: Some(principles),
                ..OperatingCodePatch::default()
            })
        }
    };

    if let Some(patch) = patch {
        if patch.is_empty() {
            return Err(Error::InvalidArgument("Nothing to update".into()));
        }
        planner.update_operating_code(&patch)?;
    }

    let code = planner.operating_code();
    if json {
        return print_json(&CodeOutput {
            operating_code: code,
            streak: planner.streak(),
        });
    }

    println!("{}", "Operating Code".cyan().bold());
    println!();
    for (i, principle) in code.principles.iter().enumerate() {
        println!("  {:>2}. {principle}", i + 1);
    }
    println!();
    println!("  Daily sacrifice:   {}", or_unset(&code.daily_sacrifice));
    println!("  Daily commitment:  {}", or_unset(&code.daily_commitment));
    println!("  Comfort refused:   {}", or_unset(&code.comfort_refused));
    println!();
    println!("Streak: {} days", planner.streak());
    Ok(())
}

/// Copy of `principles` without the 1-based `index`.
fn remove_principle(principles: &[String], index: usize) -> Result<Vec<String>> {
    if index == 0 || index > principles.len() {
        return Err(Error::InvalidArgument(format!(
            "No principle #{index} (there are {})",
            principles.len()
        )));
    }
    let mut principles = principles.to_vec();
    principles.remove(index - 1);
    Ok(principles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_principle_is_one_based() {
        let list = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(remove_principle(&list, 2).unwrap(), vec!["a", "c"]);
        assert!(remove_principle(&list, 0).is_err());
        assert!(remove_principle(&list, 4).is_err());
    }
}
