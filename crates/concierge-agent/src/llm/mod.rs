//! Chat model clients.

pub mod client;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod openai;

pub use client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, Role, TokenUsage,
    ToolCall, ToolSchema,
};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockLlmClient, MockStep, MockStepKind};
pub use openai::OpenAIClient;
