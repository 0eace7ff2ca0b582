//! Conversational assistant for the task board.
//!
//! Turns free-text user messages into a constrained action grammar via an LLM,
//! holds multi-operation proposals behind an explicit confirm/cancel gate, and
//! applies confirmed operations against the task store with per-operation
//! result reporting.

pub mod action;
pub mod brain;
pub mod chat;
pub mod executor;
pub mod extract;
pub mod gate;
pub mod prompt;
pub mod query;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use action::{
    normalize, ActionProposal, AssistantReply, ConfigChangeTarget, ConfigChangeType,
    ConfigurationChange, TaskDraft, TaskOperation,
};
pub use brain::{CompletionClient, CompletionError, LlmConfig, LlmProvider};
pub use chat::{ChatRequest, ChatResponse, ChatService, DEFAULT_USER};
pub use executor::{ExecutionSummary, OperationExecutor};
pub use extract::extract_json;
pub use gate::{
    GateOutcome, GateSignal, GateState, ProposalGate, CANCEL_PROPOSAL, CONFIRM_PROPOSAL,
};
pub use prompt::build_system_prompt;
pub use query::TaskFilter;
pub use resolver::{resolve, Resolution};

/// Failures inside the message pipeline. None of these escape to the HTTP
/// layer as errors; the chat service renders each one as a normal
/// conversational reply.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error(transparent)]
    Completion(#[from] brain::CompletionError),

    #[error("The model reply did not contain a parseable JSON object")]
    MalformedCompletion { raw: String },

    #[error("Unknown action tag: {0}")]
    UnknownAction(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
