use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{assign_id, Collection, RecordStore};
use crate::db::DbPool;
use crate::error::StoreError;

/// Record store over Postgres: one `(id, data jsonb)` table per collection.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert(&self, collection: Collection, mut payload: Value) -> Result<Value, StoreError> {
        let id = assign_id(&mut payload)?;
        let sql = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2) RETURNING data",
            collection.table_name()
        );

        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .bind(&payload)
            .fetch_one(&self.pool)
            .await?;

        debug!(collection = %collection, id = %id, "Inserted record");
        Ok(row)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Value, StoreError> {
        let sql = format!("SELECT data FROM {} WHERE id = $1", collection.table_name());

        sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { collection, id })
    }

    async fn create(&self, collection: Collection, payload: Value) -> Result<Value, StoreError> {
        self.insert(collection, payload).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        mut patch: Value,
    ) -> Result<Value, StoreError> {
        let fields = patch
            .as_object_mut()
            .ok_or_else(|| StoreError::rejected("record patch must be a JSON object"))?;
        fields.remove("id");

        let sql = format!(
            "UPDATE {} SET data = data || $2, updated_at = now() WHERE id = $1 RETURNING data",
            collection.table_name()
        );

        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .bind(&patch)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { collection, id })?;

        debug!(collection = %collection, id = %id, "Updated record");
        Ok(row)
    }

    async fn insert_event(&self, collection: Collection, event: Value) -> Result<(), StoreError> {
        self.insert(collection, event).await.map(|_| ())
    }

    async fn find_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let sql = format!(
            "SELECT data FROM {} WHERE data -> $1 = $2 ORDER BY seq ASC",
            collection.table_name()
        );

        let rows = sqlx::query_scalar::<_, Value>(&sql)
            .bind(field)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
