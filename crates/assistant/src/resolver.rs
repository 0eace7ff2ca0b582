//! Task reference resolution, shared by the operation executor and query
//! handling.

use db::models::task::Task;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Single(Box<Task>),
    NoMatch,
    Ambiguous(Vec<Task>),
}

/// Resolve a user-supplied identifier to a task.
///
/// An exact id match always wins and short-circuits the title search; only
/// when the identifier is not a known id does case-insensitive substring
/// matching against titles run. Multiple title matches are surfaced as
/// ambiguous rather than picking one.
pub async fn resolve(pool: &SqlitePool, identifier: &str) -> Result<Resolution, sqlx::Error> {
    if let Ok(id) = Uuid::parse_str(identifier.trim()) {
        if let Some(task) = Task::find_by_id(pool, id).await? {
            return Ok(Resolution::Single(Box::new(task)));
        }
    }

    let mut matches = Task::find_by_title_contains(pool, identifier).await?;
    match matches.len() {
        0 => Ok(Resolution::NoMatch),
        1 => Ok(Resolution::Single(Box::new(matches.remove(0)))),
        _ => Ok(Resolution::Ambiguous(matches)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_task, setup_test_pool};

    #[tokio::test]
    async fn id_match_wins_over_title_match() {
        let pool = setup_test_pool().await;
        let target = seed_task(&pool, "quarterly report", "To Do").await;
        // Another task whose title embeds the target's id as a substring.
        let decoy_title = format!("notes about {}", target.id);
        seed_task(&pool, &decoy_title, "To Do").await;

        let resolution = resolve(&pool, &target.id.to_string()).await.unwrap();
        let Resolution::Single(found) = resolution else {
            panic!("expected a single match");
        };
        assert_eq!(found.id, target.id);
    }

    #[tokio::test]
    async fn no_match_and_ambiguous_are_distinguished() {
        let pool = setup_test_pool().await;
        seed_task(&pool, "Deploy staging", "To Do").await;
        seed_task(&pool, "Deploy production", "To Do").await;

        let none = resolve(&pool, "nonexistent").await.unwrap();
        assert_eq!(none, Resolution::NoMatch);

        let ambiguous = resolve(&pool, "deploy").await.unwrap();
        let Resolution::Ambiguous(candidates) = ambiguous else {
            panic!("expected ambiguity");
        };
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn unique_title_substring_resolves() {
        let pool = setup_test_pool().await;
        let task = seed_task(&pool, "Refactor billing module", "To Do").await;
        seed_task(&pool, "Unrelated", "To Do").await;

        let resolution = resolve(&pool, "BILLING").await.unwrap();
        let Resolution::Single(found) = resolution else {
            panic!("expected a single match");
        };
        assert_eq!(found.id, task.id);
    }
}
