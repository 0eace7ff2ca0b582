//! Confirmed-proposal execution.
//!
//! Operations run in submission order, each independently; a failed operation
//! is recorded and the batch carries on. There is deliberately no rollback:
//! for a conversational "do these three things", partial completion beats
//! all-or-nothing.

use db::models::{
    config_change::{ConfigChangeRequest, CreateConfigChangeRequest},
    task::{CreateTask, Task, UpdateTask},
};
use services::BoardConfig;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    action::{
        ActionProposal, ConfigChangeTarget, ConfigChangeType, ConfigurationChange, TaskDraft,
        TaskOperation,
    },
    resolver::{resolve, Resolution},
};

/// Aggregate outcome of one executed proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub all_successful: bool,
    pub messages: Vec<String>,
}

impl ExecutionSummary {
    pub fn text(&self) -> String {
        self.messages.join("\n")
    }
}

pub struct OperationExecutor<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OperationExecutor<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn execute(
        &self,
        proposal: &ActionProposal,
        config: &BoardConfig,
        speaking_user: &str,
    ) -> ExecutionSummary {
        match proposal {
            ActionProposal::TaskOperations { operations, .. } => {
                self.execute_operations(operations, config, speaking_user).await
            }
            ActionProposal::ConfigurationChange { change, .. } => {
                self.record_config_change(change, speaking_user).await
            }
        }
    }

    async fn execute_operations(
        &self,
        operations: &[TaskOperation],
        config: &BoardConfig,
        speaking_user: &str,
    ) -> ExecutionSummary {
        let mut all_successful = true;
        let mut messages = Vec::with_capacity(operations.len());

        for operation in operations {
            let result = match operation {
                TaskOperation::Create { details } => {
                    self.run_create(details, config, speaking_user).await
                }
                TaskOperation::Update {
                    task_identifier,
                    updates,
                } => self.run_update(task_identifier, updates).await,
                TaskOperation::Delete { task_identifier } => {
                    self.run_delete(task_identifier).await
                }
            };
            match result {
                Ok(message) => messages.push(message),
                Err(message) => {
                    all_successful = false;
                    messages.push(message);
                }
            }
        }

        ExecutionSummary {
            all_successful,
            messages,
        }
    }

    async fn run_create(
        &self,
        draft: &TaskDraft,
        config: &BoardConfig,
        speaking_user: &str,
    ) -> Result<String, String> {
        let data = CreateTask {
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: draft
                .status
                .clone()
                .unwrap_or_else(|| config.default_status().to_string()),
            priority: draft
                .priority
                .clone()
                .unwrap_or_else(|| config.default_priority().to_string()),
            assignees: draft.assignees.clone(),
            start_date: draft.start_date,
            due_date: draft.due_date,
            effort: draft.effort.clone(),
            product_area: draft.product_area.clone(),
            depends_on: vec![],
            reporter: Some(
                draft
                    .reporter
                    .clone()
                    .unwrap_or_else(|| speaking_user.to_string()),
            ),
            parent_id: None,
            tags: draft.tags.clone(),
        };

        match Task::create(self.pool, &data, Uuid::new_v4()).await {
            Ok(task) => Ok(format!("Created task \"{}\".", task.title)),
            Err(err) => {
                tracing::warn!("Assistant create failed for '{}': {}", draft.title, err);
                Err(format!(
                    "Sorry, I couldn't create the task \"{}\": {}",
                    draft.title, err
                ))
            }
        }
    }

    async fn run_update(
        &self,
        identifier: &str,
        updates: &UpdateTask,
    ) -> Result<String, String> {
        let task = self.resolve_unique(identifier).await?;

        if let Some(new_deps) = &updates.depends_on {
            for dep in new_deps {
                if task.depends_on.0.contains(dep) {
                    continue;
                }
                match Task::would_create_cycle(self.pool, task.id, *dep).await {
                    Ok(true) => {
                        return Err(format!(
                            "Couldn't update \"{}\": that dependency would create a cycle.",
                            task.title
                        ));
                    }
                    Ok(false) => {}
                    Err(err) => {
                        return Err(format!(
                            "Sorry, I couldn't update \"{}\": {}",
                            task.title, err
                        ));
                    }
                }
            }
        }

        let merged = task.apply_patch(updates);
        if merged.parent_id == Some(task.id) {
            return Err(format!(
                "Couldn't update \"{}\": a task cannot be its own parent.",
                task.title
            ));
        }

        match Task::update(self.pool, &merged).await {
            Ok(updated) => Ok(format!("Updated task \"{}\".", updated.title)),
            Err(err) => Err(format!(
                "Sorry, I couldn't update \"{}\": {}",
                task.title, err
            )),
        }
    }

    async fn run_delete(&self, identifier: &str) -> Result<String, String> {
        let task = self.resolve_unique(identifier).await?;
        match Task::delete(self.pool, task.id).await {
            Ok(_) => Ok(format!("Deleted task \"{}\".", task.title)),
            Err(err) => Err(format!(
                "Sorry, I couldn't delete \"{}\": {}",
                task.title, err
            )),
        }
    }

    async fn resolve_unique(&self, identifier: &str) -> Result<Task, String> {
        match resolve(self.pool, identifier).await {
            Ok(Resolution::Single(task)) => Ok(*task),
            Ok(Resolution::NoMatch) => {
                Err(format!("I couldn't find a task matching \"{identifier}\"."))
            }
            Ok(Resolution::Ambiguous(_)) => Err(format!(
                "I found multiple tasks matching \"{identifier}\". \
                 Can you provide an ID or be more specific?"
            )),
            Err(err) => Err(format!(
                "Sorry, I couldn't look up \"{identifier}\": {err}"
            )),
        }
    }

    /// Configuration changes are never applied from the request path; they are
    /// recorded for an administrator and reported as noted.
    async fn record_config_change(
        &self,
        change: &ConfigurationChange,
        speaking_user: &str,
    ) -> ExecutionSummary {
        let change_type = match change.change_type {
            ConfigChangeType::Add => "ADD",
            ConfigChangeType::Remove => "REMOVE",
        };
        let target = match change.target {
            ConfigChangeTarget::ProductArea => "PRODUCT_AREA",
            ConfigChangeTarget::TeamMember => "TEAM_MEMBER",
        };
        let data = CreateConfigChangeRequest {
            change_type: change_type.to_string(),
            target: target.to_string(),
            item_name: change.item_name.clone(),
            requested_by: speaking_user.to_string(),
        };

        match ConfigChangeRequest::create(self.pool, &data).await {
            Ok(_) => {
                tracing::info!(
                    "Noted configuration change: {} {} \"{}\" (requested by {})",
                    change.change_type,
                    change.target,
                    change.item_name,
                    speaking_user
                );
                ExecutionSummary {
                    all_successful: true,
                    messages: vec![format!(
                        "I've noted the request to {} {} \"{}\". \
                         An administrator will apply it.",
                        change.change_type, change.target, change.item_name
                    )],
                }
            }
            Err(err) => ExecutionSummary {
                all_successful: false,
                messages: vec![format!(
                    "Sorry, I couldn't record that configuration request: {err}"
                )],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_task, setup_test_pool};

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
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
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_lane_order() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();
        for _ in 0..3 {
            seed_task(&pool, "existing", "New").await;
        }

        let proposal = ActionProposal::TaskOperations {
            operations: vec![TaskOperation::Create {
                details: draft("from chat"),
            }],
            response_text: String::new(),
        };
        let summary = OperationExecutor::new(&pool)
            .execute(&proposal, &config, "Alice")
            .await;
        assert!(summary.all_successful);

        let created = Task::find_by_title_contains(&pool, "from chat")
            .await
            .unwrap()
            .remove(0);
        assert_eq!(created.status, "New");
        assert_eq!(created.priority, "Medium");
        assert_eq!(created.reporter.as_deref(), Some("Alice"));
        assert_eq!(created.task_order, 3);
    }

    #[tokio::test]
    async fn batch_reports_per_operation_and_continues_past_failures() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();

        let proposal = ActionProposal::TaskOperations {
            operations: vec![
                TaskOperation::Create {
                    details: draft("first"),
                },
                TaskOperation::Update {
                    task_identifier: "does not exist".to_string(),
                    updates: UpdateTask {
                        status: Some("Done".to_string()),
                        ..Default::default()
                    },
                },
                TaskOperation::Create {
                    details: draft("third"),
                },
            ],
            response_text: String::new(),
        };

        let summary = OperationExecutor::new(&pool)
            .execute(&proposal, &config, "Alice")
            .await;
        assert!(!summary.all_successful);
        assert_eq!(summary.messages.len(), 3);
        assert!(summary.messages[0].contains("first"));
        assert!(summary.messages[1].contains("does not exist"));
        assert!(summary.messages[2].contains("third"));

        // Both creates landed despite the middle failure.
        assert_eq!(Task::find_all(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ambiguous_identifier_fails_that_operation_only() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();
        seed_task(&pool, "report draft", "To Do").await;
        seed_task(&pool, "report review", "To Do").await;

        let proposal = ActionProposal::TaskOperations {
            operations: vec![TaskOperation::Delete {
                task_identifier: "report".to_string(),
            }],
            response_text: String::new(),
        };
        let summary = OperationExecutor::new(&pool)
            .execute(&proposal, &config, "Alice")
            .await;
        assert!(!summary.all_successful);
        assert!(summary.messages[0].contains("multiple tasks"));
        assert_eq!(Task::find_all(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_resolves_by_unique_title_and_applies_patch() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();
        seed_task(&pool, "standup notes", "To Do").await;

        let proposal = ActionProposal::TaskOperations {
            operations: vec![TaskOperation::Update {
                task_identifier: "standup".to_string(),
                updates: UpdateTask {
                    status: Some("Done".to_string()),
                    ..Default::default()
                },
            }],
            response_text: String::new(),
        };
        let summary = OperationExecutor::new(&pool)
            .execute(&proposal, &config, "Alice")
            .await;
        assert!(summary.all_successful);

        let task = Task::find_by_title_contains(&pool, "standup")
            .await
            .unwrap()
            .remove(0);
        assert_eq!(task.status, "Done");
    }

    #[tokio::test]
    async fn configuration_change_is_recorded_not_applied() {
        let pool = setup_test_pool().await;
        let config = BoardConfig::default();

        let proposal = ActionProposal::ConfigurationChange {
            change: ConfigurationChange {
                change_type: crate::action::ConfigChangeType::Add,
                target: crate::action::ConfigChangeTarget::ProductArea,
                item_name: "Billing".to_string(),
            },
            response_text: String::new(),
        };
        let summary = OperationExecutor::new(&pool)
            .execute(&proposal, &config, "Alice")
            .await;
        assert!(summary.all_successful);
        assert!(summary.messages[0].contains("administrator"));

        let recorded = ConfigChangeRequest::list(&pool).await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].change_type, "ADD");
        assert_eq!(recorded[0].target, "PRODUCT_AREA");
        assert_eq!(recorded[0].requested_by, "Alice");
    }
}
