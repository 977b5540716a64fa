//! concierge - Travel Concierge CLI
//!
//! Chat with a travel agent that remembers preferences across sessions,
//! and manage the profile, memory notes and accounts behind it.

use anyhow::Result;
use clap::Parser;
use concierge_core::Config;

mod cli;
mod commands;
mod logging;
mod output;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;

    let _guard = logging::init(&config.paths.log_dir)?;
    tracing::debug!(user = %cli.user, "Starting concierge");

    let user = cli.user.as_str();

    // Execute command
    match cli.command {
        Commands::Chat => commands::chat::execute(&config, user).await,
        Commands::Ask { message } => commands::chat::ask(&message, &config, user).await,
        Commands::Memory(cmd) => commands::memory::execute(cmd, &config, user),
        Commands::Profile(cmd) => commands::profile::execute(cmd, &config, user),
        Commands::Prices(cmd) => commands::prices::execute(cmd, &config).await,
        Commands::Trips { limit } => commands::trips::execute(limit, &config, user),
        Commands::User(cmd) => commands::user::execute(cmd, &config),
        Commands::Logs(cmd) => commands::logs::execute(cmd, &config),
        Commands::Status { json } => commands::status::execute(json, &config, user),
        Commands::Version => {
            println!("concierge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
