//! Configuration and user status.
//!
//! Supports JSON output for programmatic use.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use concierge_core::Config;
use serde::Serialize;

use super::load_state;

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub timestamp: String,
    pub version: String,
    pub config_path: String,
    pub data_dir: String,
    pub log_file: String,
    pub model: ModelStatus,
    pub pricing: PricingStatus,
    pub user: UserStatus,
    pub accounts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub name: String,
    pub base_url: String,
    pub api_key_set: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingStatus {
    pub configured: bool,
    pub hostname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStatus {
    pub id: String,
    pub session_notes: usize,
    pub global_notes: usize,
    pub trips: usize,
}

pub fn execute(json: bool, config: &Config, user: &str) -> Result<()> {
    let status = gather_status(config, user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}

fn gather_status(config: &Config, user: &str) -> Result<Status> {
    let state = load_state(&config.state_store(), user)?;

    Ok(Status {
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        config_path: Config::config_path().display().to_string(),
        data_dir: config.paths.data_dir.display().to_string(),
        log_file: config.log_file().path().display().to_string(),
        model: ModelStatus {
            name: config.openai.model.clone(),
            base_url: config.openai.base_url.clone(),
            api_key_set: config.openai.api_key().is_some(),
        },
        pricing: PricingStatus {
            configured: config.pricing.credentials().is_some(),
            hostname: config.pricing.hostname.clone(),
        },
        user: UserStatus {
            id: user.to_string(),
            session_notes: state.session_memory.notes.len(),
            global_notes: state.global_memory.notes.len(),
            trips: state.trip_history.trips.len(),
        },
        accounts: config.user_directory().list_users().map(|u| u.len()).unwrap_or(0),
    })
}

fn yes_no(flag: bool) -> colored::ColoredString {
    if flag { "yes".green() } else { "no".red() }
}

fn print_status(status: &Status) {
    println!();
    println!("  {} {}", "Travel Concierge".cyan().bold(), status.version.dimmed());
    println!();
    println!("  {} {}", "Config:".cyan(), status.config_path);
    println!("  {} {}", "Data:".cyan(), status.data_dir);
    println!("  {} {}", "Log:".cyan(), status.log_file);
    println!();
    println!(
        "  {} {} (API key: {})",
        "Model:".cyan(),
        status.model.name,
        yes_no(status.model.api_key_set)
    );
    if !status.model.api_key_set {
        println!("    Set OPENAI_API_KEY to enable chat");
    }
    println!(
        "  {} {} ({})",
        "Pricing:".cyan(),
        yes_no(status.pricing.configured),
        status.pricing.hostname
    );
    println!();
    println!("  {} {}", "User:".cyan().bold(), status.user.id);
    println!("    Session notes: {}", status.user.session_notes);
    println!("    Global notes:  {}", status.user.global_notes);
    println!("    Trips:         {}", status.user.trips);
    println!("    Accounts:      {}", status.accounts);
    println!();
}
