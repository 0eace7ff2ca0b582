//! The action grammar the model must emit, and the validator/normalizer that
//! turns raw model JSON into typed replies.

use db::models::task::UpdateTask;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::{query::TaskFilter, AssistantError, Result};

const DEFAULT_CHAT_REPLY: &str = "I'm not sure how to help with that yet.";
const DEFAULT_QUERY_REPLY: &str = "Let me check that for you.";
const DEFAULT_PROPOSAL_REPLY: &str =
    "Here is what I'm proposing. Confirm to apply it, or cancel.";

/// Creation details as the model supplies them. Status, priority and reporter
/// may be absent; defaults are filled in during normalization and execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub effort: Option<String>,
    pub product_area: Option<String>,
    pub reporter: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
pub enum TaskOperation {
    #[serde(rename = "CREATE")]
    Create { details: TaskDraft },
    #[serde(rename = "UPDATE")]
    Update {
        #[serde(rename = "taskIdentifier")]
        task_identifier: String,
        updates: UpdateTask,
    },
    #[serde(rename = "DELETE")]
    Delete {
        #[serde(rename = "taskIdentifier")]
        task_identifier: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigChangeType {
    Add,
    Remove,
}

impl std::fmt::Display for ConfigChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigChangeType::Add => write!(f, "add"),
            ConfigChangeType::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigChangeTarget {
    ProductArea,
    TeamMember,
}

impl std::fmt::Display for ConfigChangeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigChangeTarget::ProductArea => write!(f, "product area"),
            ConfigChangeTarget::TeamMember => write!(f, "team member"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationChange {
    pub change_type: ConfigChangeType,
    pub target: ConfigChangeTarget,
    pub item_name: String,
}

/// A batch of pending mutations awaiting explicit user confirmation. This is
/// the exact object returned to the client and echoed back on confirm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action")]
pub enum ActionProposal {
    #[serde(rename = "PROPOSE_TASK_OPERATIONS")]
    TaskOperations {
        operations: Vec<TaskOperation>,
        #[serde(rename = "responseText")]
        response_text: String,
    },
    #[serde(rename = "PROPOSE_CONFIGURATION_CHANGE")]
    ConfigurationChange {
        change: ConfigurationChange,
        #[serde(rename = "responseText")]
        response_text: String,
    },
}

impl ActionProposal {
    pub fn response_text(&self) -> &str {
        match self {
            ActionProposal::TaskOperations { response_text, .. } => response_text,
            ActionProposal::ConfigurationChange { response_text, .. } => response_text,
        }
    }
}

/// Outcome of normalizing one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    Proposal(ActionProposal),
    Query {
        filter: TaskFilter,
        response_text: String,
    },
    Chat {
        response_text: String,
    },
}

fn payload_error(err: serde_json::Error) -> AssistantError {
    let message = err.to_string();
    if message.contains("unknown variant") {
        AssistantError::UnknownAction(message)
    } else {
        AssistantError::MissingRequiredField(message)
    }
}

/// Parse extracted model JSON into a typed reply.
///
/// The `action` discriminator is matched exhaustively against the known tags;
/// anything else is a typed `UnknownAction`, never a silent default. CREATE
/// operations with no reporter get the speaking user injected here. Taxonomy
/// membership of status/priority values is not re-checked; the prompt contract
/// is trusted.
pub fn normalize(value: Value, speaking_user: &str) -> Result<AssistantReply> {
    let tag = value
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| AssistantError::UnknownAction("(missing)".to_string()))?
        .to_string();
    let response_text = value
        .get("responseText")
        .and_then(Value::as_str)
        .map(str::to_string);

    match tag.as_str() {
        "PROPOSE_TASK_OPERATIONS" => {
            let raw_ops = value
                .get("operations")
                .and_then(Value::as_array)
                .ok_or_else(|| AssistantError::MissingRequiredField("operations".to_string()))?;
            if raw_ops.is_empty() {
                return Err(AssistantError::MissingRequiredField("operations".to_string()));
            }
            let mut operations = Vec::with_capacity(raw_ops.len());
            for raw in raw_ops {
                let mut operation: TaskOperation =
                    serde_json::from_value(raw.clone()).map_err(payload_error)?;
                if let TaskOperation::Create { details } = &mut operation {
                    if details.reporter.is_none() {
                        details.reporter = Some(speaking_user.to_string());
                    }
                }
                operations.push(operation);
            }
            Ok(AssistantReply::Proposal(ActionProposal::TaskOperations {
                operations,
                response_text: response_text
                    .unwrap_or_else(|| DEFAULT_PROPOSAL_REPLY.to_string()),
            }))
        }
        "PROPOSE_CONFIGURATION_CHANGE" => {
            let change_value = value
                .get("change")
                .cloned()
                .ok_or_else(|| AssistantError::MissingRequiredField("change".to_string()))?;
            let change: ConfigurationChange =
                serde_json::from_value(change_value).map_err(payload_error)?;
            Ok(AssistantReply::Proposal(
                ActionProposal::ConfigurationChange {
                    change,
                    response_text: response_text
                        .unwrap_or_else(|| DEFAULT_PROPOSAL_REPLY.to_string()),
                },
            ))
        }
        "QUERY_TASKS" => {
            let filter = match value.get("params") {
                Some(params) => serde_json::from_value(params.clone()).map_err(payload_error)?,
                None => TaskFilter::default(),
            };
            Ok(AssistantReply::Query {
                filter,
                response_text: response_text.unwrap_or_else(|| DEFAULT_QUERY_REPLY.to_string()),
            })
        }
        "GENERAL_CHAT" => Ok(AssistantReply::Chat {
            response_text: response_text.unwrap_or_else(|| DEFAULT_CHAT_REPLY.to_string()),
        }),
        other => Err(AssistantError::UnknownAction(other.to_string())),
    }
}
