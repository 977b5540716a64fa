//! Interactive chat and one-shot questions.
//!
//! Lines starting with `/` are handled locally:
//! `/consolidate`, `/memory`, `/save`, `/clear`, `/help`, `/quit`.

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use concierge_agent::{Concierge, Conversation};
use concierge_core::Config;
use concierge_core::memory;
use concierge_core::types::UserState;
use dialoguer::Input;

use super::load_state;
use crate::output::{print_notes, spinner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Consolidate,
    Memory,
    Save,
    Clear,
    Help,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// `None` when the line is a message for the model.
    pub fn parse(input: &str) -> Option<Self> {
        let command = input.trim().strip_prefix('/')?;
        let name = command.split_whitespace().next().unwrap_or("").to_lowercase();
        Some(match name.as_str() {
            "consolidate" => Self::Consolidate,
            "memory" | "mem" => Self::Memory,
            "save" => Self::Save,
            "clear" | "new" => Self::Clear,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Unknown(name),
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One user's chat: agent, state and the running conversation.
pub struct ChatSession {
    concierge: Concierge,
    user: String,
    state: UserState,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(concierge: Concierge, user: &str, state: UserState, max_turns: usize) -> Self {
        Self {
            concierge,
            user: user.to_string(),
            state,
            conversation: Conversation::new(max_turns),
        }
    }

    fn open(config: &Config, user: &str) -> Result<Self> {
        let store = Arc::new(config.state_store());
        let state = load_state(&store, user)?;
        let concierge = Concierge::from_config(config, store)
            .context("Chat needs a model: set OPENAI_API_KEY or openai.api_key in the config file")?;
        Ok(Self::new(concierge, user, state, config.memory.max_turns))
    }

    pub fn state(&self) -> &UserState {
        &self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    fn save(&self) -> Result<()> {
        self.save_state(&self.state)
    }

    fn save_state(&self, state: &UserState) -> Result<()> {
        self.concierge
            .store()
            .save(&self.user, state)
            .context("Failed to save state")
    }

    /// Send a message to the model and return the reply.
    pub async fn ask(&mut self, message: &str) -> Result<String> {
        let pb = spinner("Thinking...");
        let result = self
            .concierge
            .run_turn(&self.user, &mut self.state, &mut self.conversation, message)
            .await;
        pb.finish_and_clear();
        Ok(result?.reply)
    }

    /// Handle one line of input.
    pub async fn handle(&mut self, input: &str) -> Result<Flow> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Flow::Continue);
        }

        let Some(command) = SlashCommand::parse(input) else {
            match self.ask(input).await {
                Ok(reply) => println!("\n{}\n", reply),
                Err(e) => println!("{} {}", "✗".red(), e),
            }
            return Ok(Flow::Continue);
        };

        match command {
            SlashCommand::Consolidate => {
                // Session notes stay in place until the promoted state is saved
                let mut next = self.state.clone();
                let report = memory::consolidate(&mut next);
                if report.is_noop() {
                    println!("{} No session notes to consolidate", "⚠".yellow());
                } else {
                    match self.save_state(&next) {
                        Ok(()) => {
                            self.state = next;
                            println!(
                                "{} Promoted {} notes ({} global)",
                                "✓".green(),
                                report.promoted,
                                report.global_total
                            );
                        }
                        Err(e) => println!("{} {:#}", "✗".red(), e),
                    }
                }
            }
            SlashCommand::Memory => {
                print_notes("Session memory", &self.state.session_memory.notes);
                print_notes("Global memory", &self.state.global_memory.notes);
            }
            SlashCommand::Save => match self.save() {
                Ok(()) => println!("{} Saved", "✓".green()),
                Err(e) => println!("{} {:#}", "✗".red(), e),
            },
            SlashCommand::Clear => {
                self.conversation.clear();
                println!("{} Started a new conversation (memory kept)", "✓".green());
            }
            SlashCommand::Help => print_help(),
            SlashCommand::Quit => return Ok(Flow::Quit),
            SlashCommand::Unknown(name) => {
                println!("{} Unknown command /{} (try /help)", "⚠".yellow(), name);
            }
        }
        Ok(Flow::Continue)
    }
}

fn print_help() {
    println!("  {}  move session notes into global memory", "/consolidate".cyan());
    println!("  {}       show memory notes", "/memory".cyan());
    println!("  {}         save state now", "/save".cyan());
    println!("  {}        start a new conversation", "/clear".cyan());
    println!("  {}         exit", "/quit".cyan());
}

/// Interactive loop.
pub async fn execute(config: &Config, user: &str) -> Result<()> {
    let mut session = ChatSession::open(config, user)?;

    println!(
        "{} Travel Concierge ({}). Type /help for commands.",
        "✓".green(),
        config.openai.model.dimmed()
    );

    loop {
        let line: String = match Input::new()
            .with_prompt(user)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(_) => break,
        };

        if session.handle(&line).await? == Flow::Quit {
            break;
        }
    }

    session.save()?;
    Ok(())
}

/// Single question, reply on stdout.
pub async fn ask(message: &str, config: &Config, user: &str) -> Result<()> {
    let mut session = ChatSession::open(config, user)?;
    let reply = session.ask(message).await?;
    println!("{}", reply);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_agent::llm::{MockLlmClient, MockStep};
    use concierge_core::pricing::PricingService;
    use concierge_core::storage::{JsonStateStore, StateStore};
    use serde_json::json;
    use tempfile::tempdir;

    fn session(dir: &std::path::Path, steps: Vec<MockStep>) -> (Arc<JsonStateStore>, ChatSession) {
        let store = Arc::new(JsonStateStore::new(dir));
        let concierge = Concierge::new(
            Arc::new(MockLlmClient::from_steps("mock", steps)),
            store.clone(),
            Arc::new(PricingService::disabled()),
        );
        (store, ChatSession::new(concierge, "alice", UserState::default(), 20))
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(SlashCommand::parse("/consolidate"), Some(SlashCommand::Consolidate));
        assert_eq!(SlashCommand::parse("  /QUIT "), Some(SlashCommand::Quit));
        assert_eq!(SlashCommand::parse("/exit now"), Some(SlashCommand::Quit));
        assert_eq!(SlashCommand::parse("/book"), Some(SlashCommand::Unknown("book".into())));
        assert_eq!(SlashCommand::parse("find me a hotel"), None);
    }

    #[tokio::test]
    async fn test_note_then_consolidate() {
        let temp = tempdir().unwrap();
        let (store, mut chat) = session(
            temp.path(),
            vec![
                MockStep::tool_call(
                    "c1",
                    "save_memory_note",
                    json!({"text": "Vegetarian meals", "keywords": ["meal"]}),
                ),
                MockStep::text("Noted."),
            ],
        );

        assert_eq!(chat.handle("I'm vegetarian").await.unwrap(), Flow::Continue);
        assert_eq!(chat.state().session_memory.notes.len(), 1);

        chat.handle("/consolidate").await.unwrap();
        assert!(chat.state().session_memory.notes.is_empty());
        assert_eq!(chat.state().global_memory.notes[0].text, "Vegetarian meals");

        let saved = store.read("alice").unwrap().unwrap();
        assert_eq!(saved.global_memory.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_model_error_keeps_session_alive() {
        let temp = tempdir().unwrap();
        let (_store, mut chat) = session(temp.path(), vec![MockStep::error("down")]);

        assert_eq!(chat.handle("hello").await.unwrap(), Flow::Continue);
        assert!(chat.conversation().is_empty());
        assert_eq!(chat.handle("/quit").await.unwrap(), Flow::Quit);
    }

    #[tokio::test]
    async fn test_clear_keeps_memory() {
        let temp = tempdir().unwrap();
        let (_store, mut chat) = session(temp.path(), vec![MockStep::text("hi")]);
        chat.state.session_memory.notes.push(concierge_core::MemoryNote::new(
            "Aisle seat",
            "2025-01-01",
            vec![],
        ));

        chat.handle("hello").await.unwrap();
        assert!(!chat.conversation().is_empty());

        chat.handle("/clear").await.unwrap();
        assert!(chat.conversation().is_empty());
        assert_eq!(chat.state().session_memory.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_is_not_fatal() {
        let temp = tempdir().unwrap();
        let (store, mut chat) = session(temp.path(), vec![]);
        chat.state.session_memory.notes.push(concierge_core::MemoryNote::new(
            "Window seat this trip",
            "2025-01-01",
            vec![],
        ));

        let path = store.user_path("alice").unwrap();
        std::fs::create_dir_all(&path).unwrap();

        assert_eq!(chat.handle("/consolidate").await.unwrap(), Flow::Continue);
        assert_eq!(chat.state().session_memory.notes.len(), 1);
        assert!(chat.state().global_memory.notes.is_empty());
        assert_eq!(chat.handle("/save").await.unwrap(), Flow::Continue);

        std::fs::remove_dir(&path).unwrap();
        chat.handle("/consolidate").await.unwrap();
        assert!(chat.state().session_memory.notes.is_empty());

        let saved = store.read("alice").unwrap().unwrap();
        assert_eq!(saved.global_memory.notes[0].text, "Window seat this trip");
    }
}
