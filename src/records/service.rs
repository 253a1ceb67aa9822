//! Generic record service
//!
//! A typed facade over a `BackendClient` for one named collection. Every
//! module view that shows live data goes through one of these; the service
//! adds typing and the log-then-rethrow error policy, nothing else — no
//! caching, no retries, no cross-collection transactions.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::error::Result;
use crate::records::backend::BackendClient;
use crate::records::options::{Filter, QueryOptions};

/// Typed CRUD/count surface over one backend collection
pub struct RecordService<T> {
    backend: Arc<dyn BackendClient>,
    collection: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordService<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> RecordService<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(backend: Arc<dyn BackendClient>, collection: impl Into<String>) -> Self {
        Self {
            backend,
            collection: collection.into(),
            _marker: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// List records matching the options. Empty options return all rows,
    /// bounded by backend defaults.
    pub async fn get_all(&self, options: QueryOptions) -> Result<Vec<T>> {
        let rows = self
            .backend
            .select(&self.collection, &options)
            .await
            .map_err(|e| self.log(e, "get_all"))?;
        rows.into_iter()
            .map(|row| Ok(serde_json::from_value(row)?))
            .collect()
    }

    /// Single-record lookup by primary key; absence is `Ok(None)`.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        let row = self
            .backend
            .select_by_id(&self.collection, id, None)
            .await
            .map_err(|e| self.log(e, "get_by_id"))?;
        row.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    /// Insert one record, returning the persisted row including
    /// server-assigned fields.
    pub async fn create(&self, data: &impl Serialize) -> Result<T> {
        let row = self
            .backend
            .insert(&self.collection, serde_json::to_value(data)?)
            .await
            .map_err(|e| self.log(e, "create"))?;
        Ok(serde_json::from_value(row)?)
    }

    /// Partial update by primary key; a missing row is a backend error.
    pub async fn update(&self, id: &str, changes: &impl Serialize) -> Result<T> {
        let row = self
            .backend
            .update(&self.collection, id, serde_json::to_value(changes)?)
            .await
            .map_err(|e| self.log(e, "update"))?;
        Ok(serde_json::from_value(row)?)
    }

    /// Delete by primary key. Succeeds whether or not the row existed.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.backend
            .delete(&self.collection, id)
            .await
            .map_err(|e| self.log(e, "delete"))
    }

    /// Count rows matching an equality-only filter set.
    pub async fn count(&self, filter: Filter) -> Result<u64> {
        self.backend
            .count(&self.collection, &filter)
            .await
            .map_err(|e| self.log(e, "count"))
    }

    fn log(&self, err: crate::error::OpsdeskError, operation: &str) -> crate::error::OpsdeskError {
        error!(collection = %self.collection, operation, "record operation failed: {}", err);
        err
    }
}

/// Untyped alias for callers that work with raw rows (the CLI does)
pub type RawRecordService = RecordService<Value>;
