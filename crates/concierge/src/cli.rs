//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};

/// Travel Concierge CLI
///
/// Chat with the concierge and manage profile, memory and accounts.
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// User whose state document is used
    #[arg(short, long, global = true, env = "CONCIERGE_USER", default_value = "admin")]
    pub user: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat session
    Chat,

    /// Ask a single question and exit
    Ask {
        /// Message to send
        message: String,
    },

    /// Session and global memory notes
    Memory(MemoryCommand),

    /// Traveller profile
    Profile(ProfileCommand),

    /// Flight and hotel price lookups
    Prices(PricesCommand),

    /// Recorded trip searches
    Trips {
        /// Number of recent trips to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Local accounts
    User(UserCommand),

    /// Application log
    Logs(LogsCommand),

    /// Show configuration and user status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct MemoryCommand {
    #[command(subcommand)]
    pub action: MemoryAction,
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// List notes
    List {
        /// Only this scope: session or global
        #[arg(short, long)]
        scope: Option<String>,
    },

    /// Add a note
    Add {
        /// Note text
        text: String,

        /// Scope: session or global
        #[arg(short, long, default_value = "session")]
        scope: String,

        /// Keywords (up to 3 are kept)
        #[arg(short = 'k', long = "keyword", action = clap::ArgAction::Append)]
        keywords: Vec<String>,
    },

    /// Remove a note by its 1-based position
    Remove {
        /// Scope: session or global
        scope: String,

        /// Position as shown by `memory list`
        index: usize,
    },

    /// Move all session notes into global memory
    Consolidate,

    /// Drop all session notes without promoting them
    ClearSession {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub action: ProfileAction,
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a profile field (e.g. `name`, `home_city`, `flight.seat_preference`)
    Set {
        /// Field name
        field: String,

        /// New value (empty clears the field)
        value: String,
    },

    /// Loyalty programs
    Program(ProgramCommand),
}

#[derive(Args, Debug)]
pub struct ProgramCommand {
    #[command(subcommand)]
    pub action: ProgramAction,
}

#[derive(Subcommand, Debug)]
pub enum ProgramAction {
    /// Add a loyalty program
    Add {
        /// Program kind: flyer or hotel
        kind: String,

        /// Program name (e.g. "United MileagePlus")
        program: String,

        /// Member number
        member_id: String,

        /// Status tier
        #[arg(short, long, default_value = "")]
        status: String,
    },

    /// Remove a program by its 1-based position
    Remove {
        /// Program kind: flyer or hotel
        kind: String,
        index: usize,
    },

    /// Toggle whether a program is active
    Toggle {
        /// Program kind: flyer or hotel
        kind: String,
        index: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Price Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct PricesCommand {
    #[command(subcommand)]
    pub action: PricesAction,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum PricesAction {
    /// Search flight offers
    Flights {
        /// Origin IATA code
        origin: String,

        /// Destination IATA code
        destination: String,

        /// Departure date (YYYY-MM-DD)
        date: String,

        /// Return date (YYYY-MM-DD)
        #[arg(short, long = "return")]
        return_date: Option<String>,

        #[arg(short, long, default_value = "1")]
        adults: u32,

        /// ECONOMY, PREMIUM_ECONOMY, BUSINESS or FIRST
        #[arg(short, long, default_value = "ECONOMY")]
        cabin: String,
    },

    /// Search hotel offers
    Hotels {
        /// City IATA code
        city: String,

        /// Check-in date (YYYY-MM-DD)
        check_in: String,

        /// Check-out date (YYYY-MM-DD)
        check_out: String,

        #[arg(short, long, default_value = "1")]
        adults: u32,

        #[arg(short, long, default_value = "1")]
        rooms: u32,
    },

    /// Look up airport codes for a city
    Airport {
        /// City name
        city: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// User Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct UserCommand {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Create an account
    Create {
        username: String,

        /// Display name
        #[arg(short, long)]
        display_name: Option<String>,
    },

    /// List accounts
    List,

    /// Delete an account and its state document
    Delete {
        username: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Change an account's password
    Passwd { username: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Log Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct LogsCommand {
    #[command(subcommand)]
    pub action: LogsAction,
}

#[derive(Subcommand, Debug)]
pub enum LogsAction {
    /// Show the last lines
    Show {
        #[arg(short = 'n', long, default_value = "100")]
        lines: usize,
    },

    /// Show recent errors and warnings
    Errors {
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },

    /// Truncate the log file
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Log file size and error counts
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_memory_add_parses_keywords() {
        let cli = Cli::try_parse_from([
            "concierge", "--user", "alice", "memory", "add", "Prefers aisle", "-k", "seat", "-k", "flight",
        ])
        .unwrap();

        assert_eq!(cli.user, "alice");
        match cli.command {
            Commands::Memory(MemoryCommand {
                action: MemoryAction::Add { text, scope, keywords },
            }) => {
                assert_eq!(text, "Prefers aisle");
                assert_eq!(scope, "session");
                assert_eq!(keywords, vec!["seat", "flight"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_prices_flights_return_flag() {
        let cli = Cli::try_parse_from([
            "concierge", "prices", "flights", "SFO", "JFK", "2025-03-14", "--return", "2025-03-20", "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Prices(PricesCommand {
                action: PricesAction::Flights { return_date, cabin, .. },
                json,
            }) => {
                assert_eq!(return_date.as_deref(), Some("2025-03-20"));
                assert_eq!(cabin, "ECONOMY");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
