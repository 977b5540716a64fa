//! Memory commands: list, add, remove, consolidate and clear session notes.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use concierge_core::Config;
use concierge_core::memory;
use concierge_core::storage::StateStore;
use concierge_core::types::MemoryScope;

use super::{confirm, load_state, to_index};
use crate::cli::{MemoryAction, MemoryCommand};
use crate::output::print_notes;

/// Execute memory command.
pub fn execute(cmd: MemoryCommand, config: &Config, user: &str) -> Result<()> {
    let store = config.state_store();
    let mut state = load_state(&store, user)?;

    match cmd.action {
        MemoryAction::List { scope } => {
            let scope = scope.map(|s| s.parse::<MemoryScope>()).transpose().map_err(|e| anyhow!(e))?;
            if scope != Some(MemoryScope::Global) {
                print_notes("Session memory", &state.session_memory.notes);
            }
            if scope.is_none() {
                println!();
            }
            if scope != Some(MemoryScope::Session) {
                print_notes("Global memory", &state.global_memory.notes);
            }
            return Ok(());
        }

        MemoryAction::Add { text, scope, keywords } => {
            let scope: MemoryScope = scope.parse().map_err(|e: String| anyhow!(e))?;
            let note = memory::add_note(&mut state, scope, &text, &keywords)?;
            store.save(user, &state).context("Failed to save state")?;
            println!("{} Added {} note: {}", "✓".green(), scope.as_str().cyan(), note.text);
        }

        MemoryAction::Remove { scope, index } => {
            let scope: MemoryScope = scope.parse().map_err(|e: String| anyhow!(e))?;
            match memory::remove_note(&mut state, scope, to_index(index)?) {
                Some(note) => {
                    store.save(user, &state).context("Failed to save state")?;
                    println!("{} Removed {} note: {}", "✓".green(), scope.as_str().cyan(), note.text);
                }
                None => println!("{} No {} note at position {}", "⚠".yellow(), scope, index),
            }
        }

        MemoryAction::Consolidate => {
            let report = memory::consolidate(&mut state);
            if report.is_noop() {
                println!("{} No session notes to consolidate", "⚠".yellow());
                return Ok(());
            }
            store.save(user, &state).context("Failed to save state")?;
            println!(
                "{} Promoted {} session notes to global memory ({} total)",
                "✓".green(),
                report.promoted,
                report.global_total
            );
        }

        MemoryAction::ClearSession { yes } => {
            let count = state.session_memory.notes.len();
            if count == 0 {
                println!("{} Session memory is already empty", "⚠".yellow());
                return Ok(());
            }
            if !yes && !confirm(&format!("Drop {} session notes without saving them?", count))? {
                return Ok(());
            }
            memory::clear_session(&mut state);
            store.save(user, &state).context("Failed to save state")?;
            println!("{} Cleared {} session notes", "✓".green(), count);
        }
    }

    Ok(())
}
