//! Agent error types.

use thiserror::Error;

/// Agent result type alias
pub type AgentResult<T> = Result<T, AgentError>;

/// Agent errors
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model provider returned an error or an unusable response
    #[error("model error: {0}")]
    Model(String),

    /// Transport failure talking to the model provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model asked for a tool that does not exist
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments did not match the tool's schema
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// The model kept calling tools without producing an answer
    #[error("no final answer after {rounds} tool rounds")]
    ToolRoundsExhausted { rounds: usize },

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error(transparent)]
    Core(#[from] concierge_core::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Create a model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_arguments(tool: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    /// Errors that are reported back to the model instead of aborting the turn
    pub fn is_tool_error(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::InvalidArguments { .. })
    }
}
