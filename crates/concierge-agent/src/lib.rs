//! concierge-agent - The travel concierge agent
//!
//! Ties the model client to the user's state:
//!
//! - **llm** - Chat model trait, OpenAI provider and a scripted mock
//! - **tools** - Memory and price-lookup tools the model may call
//! - **instructions** - Per-turn system prompt with profile and memories
//! - **conversation** - Transcript bounded by user turns
//! - **runner** - The turn loop
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use concierge_agent::{Concierge, Conversation};
//! use concierge_core::{Config, StateStore};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Arc::new(config.state_store());
//!     let concierge = Concierge::from_config(&config, store.clone())?;
//!
//!     let mut state = store.load("admin");
//!     let mut conversation = Conversation::new(config.memory.max_turns);
//!     let outcome = concierge
//!         .run_turn("admin", &mut state, &mut conversation, "Find me a flight to Paris")
//!         .await?;
//!     println!("{}", outcome.reply);
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod instructions;
pub mod llm;
pub mod runner;
pub mod tools;

pub use conversation::Conversation;
pub use error::{AgentError, AgentResult};
pub use runner::{AgentSettings, Concierge, TurnOutcome};
pub use tools::ToolInvocation;
