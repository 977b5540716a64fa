//! Profile commands.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use concierge_core::Config;
use concierge_core::memory::render_profile_frontmatter;
use concierge_core::storage::StateStore;
use concierge_core::types::{LoyaltyProgram, ProgramKind};

use super::{load_state, to_index};
use crate::cli::{ProfileAction, ProfileCommand, ProgramAction};

/// Execute profile command.
pub fn execute(cmd: ProfileCommand, config: &Config, user: &str) -> Result<()> {
    let store = config.state_store();
    let mut state = load_state(&store, user)?;

    match cmd.action {
        ProfileAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&state.profile)?);
            } else {
                println!("{}", render_profile_frontmatter(&state.profile)?);
            }
            return Ok(());
        }

        ProfileAction::Set { field, value } => {
            state.profile.set_field(&field, &value)?;
            store.save(user, &state).context("Failed to save state")?;
            println!("{} Set {}", "✓".green(), field.cyan());
        }

        ProfileAction::Program(program) => {
            let message = apply_program_action(&mut state.profile, program.action)?;
            store.save(user, &state).context("Failed to save state")?;
            println!("{} {}", "✓".green(), message);
        }
    }

    Ok(())
}

fn parse_kind(kind: &str) -> Result<ProgramKind> {
    kind.parse().map_err(|e: String| anyhow!(e))
}

fn apply_program_action(
    profile: &mut concierge_core::Profile,
    action: ProgramAction,
) -> Result<String> {
    match action {
        ProgramAction::Add {
            kind,
            program,
            member_id,
            status,
        } => {
            let kind = parse_kind(&kind)?;
            profile
                .programs_mut(kind)
                .push(LoyaltyProgram::new(&program, member_id, status));
            Ok(format!("Added {} program {}", kind.as_str(), program))
        }
        ProgramAction::Remove { kind, index } => {
            let kind = parse_kind(&kind)?;
            let removed = profile
                .remove_program(kind, to_index(index)?)
                .ok_or_else(|| anyhow!("No {} program at position {}", kind.as_str(), index))?;
            Ok(format!("Removed {}", removed.program))
        }
        ProgramAction::Toggle { kind, index } => {
            let kind = parse_kind(&kind)?;
            let i = to_index(index)?;
            let active = profile
                .toggle_program(kind, i)
                .ok_or_else(|| anyhow!("No {} program at position {}", kind.as_str(), index))?;
            let name = &profile.programs(kind)[i].program;
            Ok(format!("{} is now {}", name, if active { "active" } else { "inactive" }))
        }
    }
}
