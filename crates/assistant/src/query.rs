//! Task query handling: a set of independent predicates composed over the
//! task collection, summarized into fixed-format text for the conversation.

use chrono::NaiveDate;
use db::models::task::Task;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use ts_rs::TS;

/// Statuses that count as finished for the overdue predicate.
const CLOSED_STATUSES: [&str; 2] = ["Done", "Completed"];

/// Filter parameters as the model emits them. Every predicate is optional and
/// independent; absent fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub assignees_include_any: Option<Vec<String>>,
    pub due_date_equals: Option<NaiveDate>,
    pub due_date_before: Option<NaiveDate>,
    pub due_date_after: Option<NaiveDate>,
    pub start_date_equals: Option<NaiveDate>,
    pub title_contains: Option<String>,
    pub description_contains: Option<String>,
    pub product_area: Option<String>,
    pub is_overdue: Option<bool>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(status) = &self.status {
            if &task.status != status {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if &task.priority != priority {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            if !task.assignees.0.iter().any(|a| a == assignee) {
                return false;
            }
        }
        if let Some(any_of) = &self.assignees_include_any {
            if !any_of.is_empty()
                && !task.assignees.0.iter().any(|a| any_of.contains(a))
            {
                return false;
            }
        }
        if let Some(due) = self.due_date_equals {
            if task.due_date != Some(due) {
                return false;
            }
        }
        if let Some(latest) = self.due_date_before {
            if !matches!(task.due_date, Some(due) if due <= latest) {
                return false;
            }
        }
        if let Some(earliest) = self.due_date_after {
            if !matches!(task.due_date, Some(due) if due >= earliest) {
                return false;
            }
        }
        if let Some(start) = self.start_date_equals {
            if task.start_date != Some(start) {
                return false;
            }
        }
        if let Some(needle) = &self.title_contains {
            if !task.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(needle) = &self.description_contains {
            let haystack = task.description.as_deref().unwrap_or("");
            if !haystack.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(area) = &self.product_area {
            if task.product_area.as_deref() != Some(area.as_str()) {
                return false;
            }
        }
        if self.is_overdue == Some(true) {
            let overdue = matches!(task.due_date, Some(due) if due < today)
                && !CLOSED_STATUSES.contains(&task.status.as_str());
            if !overdue {
                return false;
            }
        }
        true
    }
}

/// Due date ascending, tasks without a due date last.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// One fixed-format line per task: title, short id, status, priority, due
/// date, assignees.
pub fn summarize(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(|task| {
            let short_id: String = task.id.to_string().chars().take(6).collect();
            let mut line = format!("- \"{}\" (ID: {})", task.title, short_id);
            line.push_str(&format!(", Status: {}", task.status));
            line.push_str(&format!(", Priority: {}", task.priority));
            if let Some(due) = task.due_date {
                line.push_str(&format!(", Due: {}", due));
            }
            if !task.assignees.0.is_empty() {
                line.push_str(&format!(", Assignees: {}", task.assignees.0.join(", ")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetch, filter, and sort the tasks matching `filter`.
pub async fn run_query(
    pool: &SqlitePool,
    filter: &TaskFilter,
    today: NaiveDate,
) -> Result<Vec<Task>, sqlx::Error> {
    let mut tasks: Vec<Task> = Task::find_all(pool)
        .await?
        .into_iter()
        .filter(|task| filter.matches(task, today))
        .collect();
    sort_for_display(&mut tasks);
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::task::{Task, UpdateTask};
    use crate::test_utils::{seed_task, setup_test_pool};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn overdue_excludes_closed_statuses() {
        let pool = setup_test_pool().await;
        let today = date(2026, 8, 7);

        let open = seed_task(&pool, "open and late", "In Progress").await;
        let merged = open.apply_patch(&UpdateTask {
            due_date: Some(date(2026, 8, 1)),
            ..Default::default()
        });
        Task::update(&pool, &merged).await.unwrap();

        let closed = seed_task(&pool, "finished and late", "Completed").await;
        let merged = closed.apply_patch(&UpdateTask {
            due_date: Some(date(2026, 8, 1)),
            ..Default::default()
        });
        Task::update(&pool, &merged).await.unwrap();

        let filter = TaskFilter {
            is_overdue: Some(true),
            ..Default::default()
        };
        let results = run_query(&pool, &filter, today).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "open and late");
    }

    #[tokio::test]
    async fn due_today_is_not_overdue() {
        let pool = setup_test_pool().await;
        let today = date(2026, 8, 7);

        let task = seed_task(&pool, "due today", "To Do").await;
        let merged = task.apply_patch(&UpdateTask {
            due_date: Some(today),
            ..Default::default()
        });
        Task::update(&pool, &merged).await.unwrap();

        let filter = TaskFilter {
            is_overdue: Some(true),
            ..Default::default()
        };
        let results = run_query(&pool, &filter, today).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn results_sort_by_due_date_with_missing_dates_last() {
        let pool = setup_test_pool().await;
        let today = date(2026, 8, 7);

        let undated = seed_task(&pool, "undated", "To Do").await;
        let later = seed_task(&pool, "later", "To Do").await;
        let merged = later.apply_patch(&UpdateTask {
            due_date: Some(date(2026, 9, 1)),
            ..Default::default()
        });
        Task::update(&pool, &merged).await.unwrap();
        let sooner = seed_task(&pool, "sooner", "To Do").await;
        let merged = sooner.apply_patch(&UpdateTask {
            due_date: Some(date(2026, 8, 10)),
            ..Default::default()
        });
        Task::update(&pool, &merged).await.unwrap();

        let results = run_query(&pool, &TaskFilter::default(), today).await.unwrap();
        let titles: Vec<&str> = results.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["sooner", "later", "undated"]);
        let _ = undated;
    }

    #[tokio::test]
    async fn assignee_membership_and_title_contains_compose() {
        let pool = setup_test_pool().await;
        let today = date(2026, 8, 7);

        let task = seed_task(&pool, "Ship the login page", "To Do").await;
        let merged = task.apply_patch(&UpdateTask {
            assignees: Some(vec!["Alice".to_string(), "Bob".to_string()]),
            ..Default::default()
        });
        Task::update(&pool, &merged).await.unwrap();
        seed_task(&pool, "Ship the billing page", "To Do").await;

        let filter = TaskFilter {
            assignee: Some("Alice".to_string()),
            title_contains: Some("login".to_string()),
            ..Default::default()
        };
        let results = run_query(&pool, &filter, today).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Ship the login page");
    }

    #[tokio::test]
    async fn summary_lines_carry_the_fixed_fields() {
        let pool = setup_test_pool().await;
        let task = seed_task(&pool, "Ship it", "To Do").await;
        let merged = task.apply_patch(&UpdateTask {
            due_date: Some(date(2026, 8, 20)),
            assignees: Some(vec!["Alice".to_string()]),
            ..Default::default()
        });
        let task = Task::update(&pool, &merged).await.unwrap();

        let line = summarize(std::slice::from_ref(&task));
        assert!(line.starts_with(&format!(
            "- \"Ship it\" (ID: {})",
            &task.id.to_string()[..6]
        )));
        assert!(line.contains("Status: To Do"));
        assert!(line.contains("Priority: Medium"));
        assert!(line.contains("Due: 2026-08-20"));
        assert!(line.contains("Assignees: Alice"));
    }
}
