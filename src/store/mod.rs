//! Record store seam.
//!
//! Durable storage belongs to an external backend. The core only needs the
//! handful of operations on [`RecordStore`]; records travel as JSON objects
//! keyed by an `id` field.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Matches,
    MatchEvents,
    Tournaments,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Matches => "matches",
            Collection::MatchEvents => "match_events",
            Collection::Tournaments => "tournaments",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record; `StoreError::NotFound` when absent.
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Value, StoreError>;

    /// Insert a record, assigning an `id` when the payload has none.
    async fn create(&self, collection: Collection, payload: Value) -> Result<Value, StoreError>;

    /// Merge the top-level keys of `patch` into a record and return the result.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Value,
    ) -> Result<Value, StoreError>;

    /// Append an event row.
    async fn insert_event(&self, collection: Collection, event: Value) -> Result<(), StoreError>;

    /// Records whose top-level `field` equals `value`, in insertion order.
    async fn find_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;
}

/// Reads the `id` field of a record, if it holds a UUID.
pub fn record_id(record: &Value) -> Option<Uuid> {
    record
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// Ensures `payload` is an object carrying an id; returns that id.
pub(crate) fn assign_id(payload: &mut Value) -> Result<Uuid, StoreError> {
    let object = payload
        .as_object_mut()
        .ok_or_else(|| StoreError::rejected("record payload must be a JSON object"))?;

    match object.get("id").and_then(Value::as_str) {
        Some(raw) => Uuid::parse_str(raw)
            .map_err(|e| StoreError::rejected(format!("invalid record id {raw}: {e}"))),
        None => {
            let id = Uuid::new_v4();
            object.insert("id".to_string(), Value::String(id.to_string()));
            Ok(id)
        }
    }
}
