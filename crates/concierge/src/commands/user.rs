//! Local account management.

use anyhow::{Context, Result};
use colored::Colorize;
use concierge_core::Config;
use concierge_core::storage::StateStore;
use dialoguer::Password;

use super::confirm;
use crate::cli::{UserAction, UserCommand};

/// Execute user command.
pub fn execute(cmd: UserCommand, config: &Config) -> Result<()> {
    let directory = config.user_directory();

    match cmd.action {
        UserAction::Create { username, display_name } => {
            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?;
            let record = directory.create_user(&username, &password, display_name.as_deref())?;
            println!("{} Created user {} ({})", "✓".green(), record.username.cyan(), record.display_name);
        }

        UserAction::List => {
            let users = directory.list_users().context("Failed to read accounts")?;
            if users.is_empty() {
                println!("{} No accounts", "⚠".yellow());
                return Ok(());
            }
            println!("{} {} accounts:", "✓".green(), users.len());
            for username in users {
                println!("  {} {}", username.cyan(), directory.display_name(&username).dimmed());
            }
        }

        UserAction::Delete { username, yes } => {
            if !yes && !confirm(&format!("Delete user {} and their saved state?", username))? {
                return Ok(());
            }
            let removed = directory.delete_user(&username)?;
            let state_removed = config.state_store().delete(&username.to_lowercase())?;
            if removed || state_removed {
                println!("{} Deleted user {}", "✓".green(), username);
            } else {
                println!("{} User not found: {}", "⚠".yellow(), username);
            }
        }

        UserAction::Passwd { username } => {
            let current = Password::new().with_prompt("Current password").interact()?;
            let new = Password::new()
                .with_prompt("New password")
                .with_confirmation("Confirm new password", "Passwords do not match")
                .interact()?;
            directory.change_password(&username, &current, &new)?;
            println!("{} Password changed for {}", "✓".green(), username);
        }
    }

    Ok(())
}
