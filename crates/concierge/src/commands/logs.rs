//! Log file inspection.

use anyhow::Result;
use colored::Colorize;
use concierge_core::Config;

use super::confirm;
use crate::cli::{LogsAction, LogsCommand};

/// Execute logs command.
pub fn execute(cmd: LogsCommand, config: &Config) -> Result<()> {
    let log = config.log_file();

    match cmd.action {
        LogsAction::Show { lines } => {
            for line in log.tail(lines)? {
                println!("{}", line);
            }
        }

        LogsAction::Errors { lines } => {
            let errors = log.errors(lines)?;
            if errors.is_empty() {
                println!("{} No errors or warnings logged", "✓".green());
            }
            for line in errors {
                if line.contains("ERROR") {
                    println!("{}", line.red());
                } else {
                    println!("{}", line.yellow());
                }
            }
        }

        LogsAction::Clear { yes } => {
            if !yes && !confirm("Clear the log file?")? {
                return Ok(());
            }
            log.clear()?;
            println!("{} Cleared {}", "✓".green(), log.path().display());
        }

        LogsAction::Stats => {
            let stats = log.stats()?;
            println!("  {} {}", "Path:".cyan(), stats.path.display());
            if !stats.exists {
                println!("  {}", "(no log file yet)".dimmed());
                return Ok(());
            }
            println!("  {} {} KB", "Size:".cyan(), stats.size_bytes / 1024);
            println!("  {} {}", "Errors:".cyan(), stats.errors);
            println!("  {} {}", "Warnings:".cyan(), stats.warnings);
        }
    }

    Ok(())
}
