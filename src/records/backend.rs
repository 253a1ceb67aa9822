//! Backend client trait for record access
//!
//! Every record operation passes through this trait, so the application
//! logic is independent of the wire transport. Two implementations exist:
//! the PostgREST-style HTTP adapter (`RestBackend`) and the in-memory
//! backend used by tests and demos (`MemoryBackend`).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::realtime::{ChangeFilter, Subscription};
use crate::records::options::{Filter, QueryOptions};

/// Uniform access to named row collections in the backend.
///
/// All operations are attempt-once: a failure surfaces immediately as a
/// `Backend` error carrying the backend's message, with no retry or
/// backoff anywhere in the crate. Methods take `&self`; implementations
/// handle their own interior mutability.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// List rows matching the options. Empty options return all rows,
    /// bounded only by backend defaults.
    async fn select(&self, collection: &str, options: &QueryOptions) -> Result<Vec<Value>>;

    /// Exact single-row lookup by primary key. Absence is `Ok(None)`,
    /// not an error.
    async fn select_by_id(
        &self,
        collection: &str,
        id: &str,
        select: Option<&str>,
    ) -> Result<Option<Value>>;

    /// Insert one row and return the persisted row including
    /// server-assigned fields (id, timestamps).
    async fn insert(&self, collection: &str, row: Value) -> Result<Value>;

    /// Partial update by primary key. Fails when no row matches.
    async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<Value>;

    /// Delete by primary key. Does not distinguish "not found" from
    /// "deleted"; both succeed.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Count rows matching an equality-only filter set.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;
}

/// Optional row-change subscription capability.
///
/// Not every transport can deliver change events (the REST adapter cannot),
/// so this is a separate trait implemented only by backends that can.
pub trait RealtimeBackend: BackendClient {
    /// Subscribe to change events for a collection, optionally filtered
    /// by a column predicate.
    fn subscribe(&self, filter: ChangeFilter) -> Subscription;
}
