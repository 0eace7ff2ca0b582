use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A taxonomy change proposed through the assistant, recorded for an
/// administrator instead of applied directly from the request path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConfigChangeRequest {
    pub id: Uuid,
    pub change_type: String,
    pub target: String,
    pub item_name: String,
    pub requested_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfigChangeRequest {
    pub change_type: String,
    pub target: String,
    pub item_name: String,
    pub requested_by: String,
}

impl ConfigChangeRequest {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateConfigChangeRequest,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, ConfigChangeRequest>(
            "INSERT INTO config_change_requests (id, change_type, target, item_name, requested_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, change_type, target, item_name, requested_by, created_at",
        )
        .bind(id)
        .bind(&data.change_type)
        .bind(&data.target)
        .bind(&data.item_name)
        .bind(&data.requested_by)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ConfigChangeRequest>(
            "SELECT id, change_type, target, item_name, requested_by, created_at \
             FROM config_change_requests ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_utils::setup_test_pool;

    #[tokio::test]
    async fn create_and_list_round_trip() {
        let pool = setup_test_pool().await;
        let created = ConfigChangeRequest::create(
            &pool,
            &CreateConfigChangeRequest {
                change_type: "ADD".to_string(),
                target: "PRODUCT_AREA".to_string(),
                item_name: "Billing".to_string(),
                requested_by: "Alice".to_string(),
            },
        )
        .await
        .unwrap();

        let listed = ConfigChangeRequest::list(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].item_name, "Billing");
    }
}
