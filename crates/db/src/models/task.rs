use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Task not found")]
    NotFound,
    #[error("Dependency would create a cycle")]
    DependencyCycle,
    #[error("A task cannot be its own parent")]
    SelfParent,
    #[error("Task title must not be empty")]
    EmptyTitle,
    #[error("Due date must not be earlier than start date")]
    InvalidDateRange,
}

/// A task row. `status` and `priority` are free strings constrained by the
/// board taxonomy at the prompt/config boundary, not by the schema.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[ts(type = "string[]")]
    pub assignees: Json<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub effort: Option<String>,
    pub product_area: Option<String>,
    #[serde(rename = "order")]
    pub task_order: i64,
    #[ts(type = "string[]")]
    pub depends_on: Json<Vec<Uuid>>,
    pub reporter: Option<String>,
    pub parent_id: Option<Uuid>,
    #[ts(type = "string[]")]
    pub tags: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub effort: Option<String>,
    pub product_area: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<Uuid>,
    pub reporter: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial patch. `None` leaves the field untouched; there is no way to clear
/// an already-set optional field through a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignees: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub effort: Option<String>,
    pub product_area: Option<String>,
    #[serde(rename = "order")]
    pub task_order: Option<i64>,
    pub depends_on: Option<Vec<Uuid>>,
    pub reporter: Option<String>,
    pub parent_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, assignees, \
     start_date, due_date, effort, product_area, task_order, depends_on, \
     reporter, parent_id, tags, created_at, updated_at";

/// Walk the dependency graph from `new_dep`; adding `task_id -> new_dep`
/// closes a cycle iff `task_id` is reachable (self-edges included).
pub fn creates_cycle(edges: &HashMap<Uuid, Vec<Uuid>>, task_id: Uuid, new_dep: Uuid) -> bool {
    if task_id == new_dep {
        return true;
    }
    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut stack = vec![new_dep];
    while let Some(current) = stack.pop() {
        if current == task_id {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(deps) = edges.get(&current) {
            stack.extend(deps.iter().copied());
        }
    }
    false
}

impl Task {
    /// Merge a patch into this task, leaving unspecified fields untouched.
    pub fn apply_patch(&self, patch: &UpdateTask) -> Task {
        let mut merged = self.clone();
        if let Some(title) = &patch.title {
            merged.title = title.clone();
        }
        if let Some(description) = &patch.description {
            merged.description = Some(description.clone());
        }
        if let Some(status) = &patch.status {
            merged.status = status.clone();
        }
        if let Some(priority) = &patch.priority {
            merged.priority = priority.clone();
        }
        if let Some(assignees) = &patch.assignees {
            merged.assignees = Json(assignees.clone());
        }
        if let Some(start_date) = patch.start_date {
            merged.start_date = Some(start_date);
        }
        if let Some(due_date) = patch.due_date {
            merged.due_date = Some(due_date);
        }
        if let Some(effort) = &patch.effort {
            merged.effort = Some(effort.clone());
        }
        if let Some(product_area) = &patch.product_area {
            merged.product_area = Some(product_area.clone());
        }
        if let Some(task_order) = patch.task_order {
            merged.task_order = task_order;
        }
        if let Some(depends_on) = &patch.depends_on {
            merged.depends_on = Json(depends_on.clone());
        }
        if let Some(reporter) = &patch.reporter {
            merged.reporter = Some(reporter.clone());
        }
        if let Some(parent_id) = patch.parent_id {
            merged.parent_id = Some(parent_id);
        }
        if let Some(tags) = &patch.tags {
            merged.tags = Json(tags.clone());
        }
        merged
    }

    /// Editing-boundary checks. Callers on the HTTP surface run this before
    /// writing; the conversational executor deliberately does not.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if let (Some(start), Some(due)) = (self.start_date, self.due_date) {
            if due < start {
                return Err(TaskError::InvalidDateRange);
            }
        }
        if self.parent_id == Some(self.id) {
            return Err(TaskError::SelfParent);
        }
        Ok(())
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY task_order, created_at");
        sqlx::query_as::<_, Task>(&sql).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive substring match on titles, used for fuzzy reference
    /// resolution when an identifier is not a known id.
    pub async fn find_by_title_contains(
        pool: &SqlitePool,
        needle: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE LOWER(title) LIKE '%' || LOWER($1) || '%' \
             ORDER BY created_at"
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(needle)
            .fetch_all(pool)
            .await
    }

    /// Next free position within a status lane: `max(order) + 1`, or 0 for an
    /// empty lane.
    pub async fn next_order_in_status(
        pool: &SqlitePool,
        status: &str,
    ) -> Result<i64, sqlx::Error> {
        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(task_order) FROM tasks WHERE status = $1")
                .bind(status)
                .fetch_one(pool)
                .await?;
        Ok(max.map(|m| m + 1).unwrap_or(0))
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, TaskError> {
        let task_order = Self::next_order_in_status(pool, &data.status).await?;

        tracing::debug!(
            "Creating task '{}' in status '{}' at order {}",
            data.title,
            data.status,
            task_order
        );

        let sql = format!(
            "INSERT INTO tasks (id, title, description, status, priority, assignees, \
              start_date, due_date, effort, product_area, task_order, depends_on, \
              reporter, parent_id, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.status)
            .bind(&data.priority)
            .bind(Json(data.assignees.clone()))
            .bind(data.start_date)
            .bind(data.due_date)
            .bind(&data.effort)
            .bind(&data.product_area)
            .bind(task_order)
            .bind(Json(data.depends_on.clone()))
            .bind(&data.reporter)
            .bind(data.parent_id)
            .bind(Json(data.tags.clone()))
            .fetch_one(pool)
            .await?;
        Ok(task)
    }

    /// Write every mutable column from `task` back to its row.
    pub async fn update(pool: &SqlitePool, task: &Task) -> Result<Self, TaskError> {
        let sql = format!(
            "UPDATE tasks \
             SET title = $2, description = $3, status = $4, priority = $5, \
                 assignees = $6, start_date = $7, due_date = $8, effort = $9, \
                 product_area = $10, task_order = $11, depends_on = $12, \
                 reporter = $13, parent_id = $14, tags = $15, \
                 updated_at = datetime('now', 'subsec') \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(&task.status)
            .bind(&task.priority)
            .bind(&task.assignees)
            .bind(task.start_date)
            .bind(task.due_date)
            .bind(&task.effort)
            .bind(&task.product_area)
            .bind(task.task_order)
            .bind(&task.depends_on)
            .bind(&task.reporter)
            .bind(task.parent_id)
            .bind(&task.tags)
            .fetch_optional(pool)
            .await?;
        updated.ok_or(TaskError::NotFound)
    }

    /// Delete a task and prune references to it: the id is removed from every
    /// other task's `depends_on`, and children have their `parent_id` cleared.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, TaskError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TaskError::NotFound);
        }

        let id_text = id.to_string();
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE depends_on LIKE '%' || $1 || '%'"
        );
        let dependents = sqlx::query_as::<_, Task>(&sql)
            .bind(&id_text)
            .fetch_all(pool)
            .await?;
        for dependent in dependents {
            let remaining: Vec<Uuid> = dependent
                .depends_on
                .0
                .iter()
                .copied()
                .filter(|dep| *dep != id)
                .collect();
            sqlx::query(
                "UPDATE tasks SET depends_on = $2, updated_at = datetime('now', 'subsec') \
                 WHERE id = $1",
            )
            .bind(dependent.id)
            .bind(Json(remaining))
            .execute(pool)
            .await?;
        }

        sqlx::query(
            "UPDATE tasks SET parent_id = NULL, updated_at = datetime('now', 'subsec') \
             WHERE parent_id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        tracing::debug!("Deleted task {} and pruned dangling references", id);
        Ok(result.rows_affected())
    }

    /// Check whether adding `task_id -> new_dep` would close a dependency
    /// cycle, walking the graph as currently stored.
    pub async fn would_create_cycle(
        pool: &SqlitePool,
        task_id: Uuid,
        new_dep: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let rows: Vec<(Uuid, Json<Vec<Uuid>>)> =
            sqlx::query_as("SELECT id, depends_on FROM tasks")
                .fetch_all(pool)
                .await?;
        let edges: HashMap<Uuid, Vec<Uuid>> =
            rows.into_iter().map(|(id, deps)| (id, deps.0)).collect();
        Ok(creates_cycle(&edges, task_id, new_dep))
    }

    pub async fn add_dependency(
        pool: &SqlitePool,
        task_id: Uuid,
        dependency_id: Uuid,
    ) -> Result<Self, TaskError> {
        let task = Self::find_by_id(pool, task_id)
            .await?
            .ok_or(TaskError::NotFound)?;
        Self::find_by_id(pool, dependency_id)
            .await?
            .ok_or(TaskError::NotFound)?;

        if Self::would_create_cycle(pool, task_id, dependency_id).await? {
            return Err(TaskError::DependencyCycle);
        }

        let mut deps = task.depends_on.0.clone();
        if !deps.contains(&dependency_id) {
            deps.push(dependency_id);
        }
        let mut updated = task;
        updated.depends_on = Json(deps);
        Self::update(pool, &updated).await
    }

    pub async fn remove_dependency(
        pool: &SqlitePool,
        task_id: Uuid,
        dependency_id: Uuid,
    ) -> Result<Self, TaskError> {
        let task = Self::find_by_id(pool, task_id)
            .await?
            .ok_or(TaskError::NotFound)?;
        let deps: Vec<Uuid> = task
            .depends_on
            .0
            .iter()
            .copied()
            .filter(|dep| *dep != dependency_id)
            .collect();
        let mut updated = task;
        updated.depends_on = Json(deps);
        Self::update(pool, &updated).await
    }
}
