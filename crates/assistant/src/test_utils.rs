use std::str::FromStr;

use db::models::task::{CreateTask, Task};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use uuid::Uuid;

pub(crate) async fn setup_test_pool() -> SqlitePool {
    // One connection per test pool; each :memory: connection is its own db,
    // so parallel tests cannot see each other's rows.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("invalid sqlite config")
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("failed to open sqlite memory db");

    sqlx::migrate!("../db/migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

pub(crate) async fn seed_task(pool: &SqlitePool, title: &str, status: &str) -> Task {
    let data = CreateTask {
        title: title.to_string(),
        description: None,
        status: status.to_string(),
        priority: "Medium".to_string(),
        assignees: vec![],
        start_date: None,
        due_date: None,
        effort: None,
        product_area: None,
        depends_on: vec![],
        reporter: Some("Alice".to_string()),
        parent_id: None,
        tags: vec![],
    };
    Task::create(pool, &data, Uuid::new_v4())
        .await
        .expect("failed to seed task")
}
