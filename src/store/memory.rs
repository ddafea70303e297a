use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{assign_id, record_id, Collection, RecordStore};
use crate::error::StoreError;

/// In-process record store.
///
/// Records keep insertion order per collection. Writes can be made to fail on
/// demand with [`MemoryStore::fail_writes`], reads are never affected.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Collection, Vec<Value>>>,
    write_failure: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent create/update/insert fails with `message` until [`heal`](Self::heal).
    pub fn fail_writes(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.write_failure.write() {
            *failure = Some(message.into());
        }
    }

    pub fn heal(&self) {
        if let Ok(mut failure) = self.write_failure.write() {
            *failure = None;
        }
    }

    /// Number of records held in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.records
            .read()
            .map(|records| records.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        let failure = self
            .write_failure
            .read()
            .map_err(|_| StoreError::rejected("Failed to read store state"))?;
        match failure.as_ref() {
            Some(message) => Err(StoreError::rejected(message.clone())),
            None => Ok(()),
        }
    }

    fn insert(&self, collection: Collection, mut payload: Value) -> Result<Value, StoreError> {
        self.check_writable()?;
        let id = assign_id(&mut payload)?;

        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::rejected("Failed to write record"))?;
        let rows = records.entry(collection).or_default();
        if rows.iter().any(|row| record_id(row) == Some(id)) {
            return Err(StoreError::rejected(format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                collection
            )));
        }
        rows.push(payload.clone());

        debug!(collection = %collection, id = %id, "Inserted record");
        Ok(payload)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Value, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::rejected("Failed to read records"))?;
        records
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| record_id(row) == Some(id)))
            .cloned()
            .ok_or(StoreError::NotFound { collection, id })
    }

    async fn create(&self, collection: Collection, payload: Value) -> Result<Value, StoreError> {
        self.insert(collection, payload)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Value,
    ) -> Result<Value, StoreError> {
        self.check_writable()?;
        let Value::Object(fields) = patch else {
            return Err(StoreError::rejected("record patch must be a JSON object"));
        };

        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::rejected("Failed to write record"))?;
        let row = records
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|row| record_id(row) == Some(id)))
            .ok_or(StoreError::NotFound { collection, id })?;

        if let Some(target) = row.as_object_mut() {
            for (key, value) in fields {
                // The id column is immutable.
                if key != "id" {
                    target.insert(key, value);
                }
            }
        }

        debug!(collection = %collection, id = %id, "Updated record");
        Ok(row.clone())
    }

    async fn insert_event(&self, collection: Collection, event: Value) -> Result<(), StoreError> {
        self.insert(collection, event).map(|_| ())
    }

    async fn find_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::rejected("Failed to read records"))?;
        Ok(records
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
