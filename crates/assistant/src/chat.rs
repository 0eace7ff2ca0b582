//! The conversational service: one inbound message handled end-to-end.
//!
//! Every failure mode resolves to a normal displayable reply; nothing from
//! this module surfaces as an HTTP error.

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use services::BoardConfig;
use sqlx::SqlitePool;
use ts_rs::TS;

use crate::{
    action::{ActionProposal, AssistantReply},
    brain::CompletionClient,
    executor::OperationExecutor,
    extract::extract_json,
    gate::{GateOutcome, GateSignal, ProposalGate},
    normalize,
    query::{run_query, summarize},
    AssistantError,
};

/// Placeholder identity when the client does not say who is speaking.
pub const DEFAULT_USER: &str = "User";

const UPSTREAM_APOLOGY: &str =
    "Sorry, I'm having trouble reaching my language model right now. Please try again in a moment.";
const REPHRASE_REQUEST: &str =
    "I had a little trouble understanding that. Could you try rephrasing?";
const CANCEL_ACK: &str = "Okay, I've cancelled that. What would you like to do next?";
const NOTHING_PENDING: &str = "There's no pending proposal to confirm.";
const PENDING_REMINDER: &str = "Please confirm or cancel the pending proposal first.";
const NO_QUERY_RESULTS: &str = "I couldn't find any tasks matching your criteria.";

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub current_user: Option<String>,
    /// The proposal previously returned to the client, echoed back alongside
    /// the confirmation sentinel. The server holds no proposal state itself.
    #[serde(default)]
    pub proposal_to_confirm: Option<ActionProposal>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(untagged)]
pub enum ChatResponse {
    /// A proposal for the client to hold and echo back on confirm. Carries its
    /// own `action` tag and `responseText`.
    Proposal(ActionProposal),
    /// Result of executing a confirmed proposal.
    #[serde(rename_all = "camelCase")]
    Executed {
        response_text: String,
        operations_processed: bool,
        all_successful: bool,
    },
    /// Any other conversational reply, including every failure mode.
    #[serde(rename_all = "camelCase")]
    Plain { response_text: String },
}

impl ChatResponse {
    fn plain(text: impl Into<String>) -> Self {
        ChatResponse::Plain {
            response_text: text.into(),
        }
    }

    pub fn response_text(&self) -> &str {
        match self {
            ChatResponse::Proposal(proposal) => proposal.response_text(),
            ChatResponse::Executed { response_text, .. } => response_text,
            ChatResponse::Plain { response_text } => response_text,
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    pool: SqlitePool,
    client: Arc<CompletionClient>,
}

impl ChatService {
    pub fn new(pool: SqlitePool, client: Arc<CompletionClient>) -> Self {
        Self { pool, client }
    }

    pub async fn handle(&self, request: ChatRequest, config: &BoardConfig) -> ChatResponse {
        let speaking_user = request
            .current_user
            .filter(|user| !user.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        let mut gate = match request.proposal_to_confirm {
            Some(proposal) => ProposalGate::with_pending(proposal),
            None => ProposalGate::new(),
        };

        match gate.handle(GateSignal::from_message(&request.message)) {
            GateOutcome::Execute(proposal) => {
                let summary = OperationExecutor::new(&self.pool)
                    .execute(&proposal, config, &speaking_user)
                    .await;
                ChatResponse::Executed {
                    response_text: summary.text(),
                    operations_processed: true,
                    all_successful: summary.all_successful,
                }
            }
            GateOutcome::Cancelled => ChatResponse::plain(CANCEL_ACK),
            GateOutcome::NothingPending => ChatResponse::plain(NOTHING_PENDING),
            GateOutcome::RejectedPending => ChatResponse::plain(PENDING_REMINDER),
            GateOutcome::RunPipeline(message) => {
                self.run_pipeline(&message, &speaking_user, config).await
            }
        }
    }

    async fn run_pipeline(
        &self,
        message: &str,
        speaking_user: &str,
        config: &BoardConfig,
    ) -> ChatResponse {
        let today = Local::now().date_naive();
        let system_prompt = crate::prompt::build_system_prompt(speaking_user, config, today);

        let raw = match self.client.complete(&system_prompt, message).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("Completion call failed: {}", err);
                return ChatResponse::plain(UPSTREAM_APOLOGY);
            }
        };

        let value = match extract_json(&raw) {
            Ok(value) => value,
            Err(AssistantError::MalformedCompletion { raw }) => {
                tracing::debug!("Unparseable model output: {}", raw);
                return ChatResponse::plain(REPHRASE_REQUEST);
            }
            Err(err) => {
                tracing::warn!("Extraction failed: {}", err);
                return ChatResponse::plain(REPHRASE_REQUEST);
            }
        };

        match normalize(value, speaking_user) {
            Ok(AssistantReply::Proposal(proposal)) => ChatResponse::Proposal(proposal),
            Ok(AssistantReply::Query {
                filter,
                response_text: _,
            }) => match run_query(&self.pool, &filter, today).await {
                Ok(tasks) if tasks.is_empty() => ChatResponse::plain(NO_QUERY_RESULTS),
                Ok(tasks) => ChatResponse::plain(format!(
                    "Here are the tasks I found:\n{}",
                    summarize(&tasks)
                )),
                Err(err) => {
                    tracing::error!("Task query failed: {}", err);
                    ChatResponse::plain(format!("Sorry, I couldn't fetch the tasks: {err}"))
                }
            },
            Ok(AssistantReply::Chat { response_text }) => ChatResponse::plain(response_text),
            Err(err) => {
                tracing::warn!("Model output did not match the action grammar: {}", err);
                ChatResponse::plain(REPHRASE_REQUEST)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        action::{TaskDraft, TaskOperation},
        brain::LlmConfig,
        gate::{CANCEL_PROPOSAL, CONFIRM_PROPOSAL},
        test_utils::setup_test_pool,
    };
    use db::models::task::Task;

    fn service(pool: &SqlitePool) -> ChatService {
        // Client is never called by the gate paths exercised here.
        ChatService::new(
            pool.clone(),
            Arc::new(CompletionClient::new(LlmConfig::default())),
        )
    }

    fn create_proposal(title: &str) -> ActionProposal {
        ActionProposal::TaskOperations {
            operations: vec![TaskOperation::Create {
                details: TaskDraft {
                    title: title.to_string(),
                    description: None,
                    status: None,
                    priority: None,
                    assignees: vec![],
                    start_date: None,
                    due_date: None,
                    effort: None,
                    product_area: None,
                    reporter: None,
                    tags: vec![],
                },
            }],
            response_text: "Create it?".to_string(),
        }
    }

    #[tokio::test]
    async fn confirm_executes_the_echoed_proposal() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();

        let response = service(&pool)
            .handle(
                ChatRequest {
                    message: CONFIRM_PROPOSAL.to_string(),
                    current_user: Some("Alice".to_string()),
                    proposal_to_confirm: Some(create_proposal("confirmed task")),
                },
                &config,
            )
            .await;

        let ChatResponse::Executed {
            operations_processed,
            all_successful,
            ..
        } = response
        else {
            panic!("expected an executed response");
        };
        assert!(operations_processed);
        assert!(all_successful);
        assert_eq!(Task::find_all(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_discards_without_executing() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();

        let response = service(&pool)
            .handle(
                ChatRequest {
                    message: CANCEL_PROPOSAL.to_string(),
                    current_user: Some("Alice".to_string()),
                    proposal_to_confirm: Some(create_proposal("never created")),
                },
                &config,
            )
            .await;

        assert!(matches!(response, ChatResponse::Plain { .. }));
        assert!(Task::find_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn free_text_while_pending_is_rejected_without_a_model_call() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();

        let response = service(&pool)
            .handle(
                ChatRequest {
                    message: "actually, do something else".to_string(),
                    current_user: None,
                    proposal_to_confirm: Some(create_proposal("held")),
                },
                &config,
            )
            .await;

        assert_eq!(response.response_text(), PENDING_REMINDER);
        assert!(Task::find_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirm_without_a_proposal_has_nothing_to_run() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();

        let response = service(&pool)
            .handle(
                ChatRequest {
                    message: CONFIRM_PROPOSAL.to_string(),
                    current_user: None,
                    proposal_to_confirm: None,
                },
                &config,
            )
            .await;

        assert_eq!(response.response_text(), NOTHING_PENDING);
    }
}
