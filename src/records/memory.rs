//! In-memory backend
//!
//! Used by tests and the demo path. Keeps collections as JSON rows behind
//! a lock, evaluates filters locally, and publishes a change event for
//! every mutation so realtime consumers can be exercised without a hosted
//! backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{OpsdeskError, Result};
use crate::realtime::{ChangeEvent, ChangeFilter, ChangeHub, ChangeKind, Subscription};
use crate::records::backend::{BackendClient, RealtimeBackend};
use crate::records::options::{Filter, QueryOptions};

/// In-process collection store
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    hub: ChangeHub,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with rows, replacing any existing content.
    /// Rows without an `id` get one assigned.
    pub fn seed(&self, collection: &str, rows: Vec<Value>) {
        let rows = rows.into_iter().map(ensure_server_fields).collect();
        self.collections.write().insert(collection.to_string(), rows);
    }

    fn rows_matching(&self, collection: &str, options: &QueryOptions) -> Vec<Value> {
        let collections = self.collections.read();
        let Some(rows) = collections.get(collection) else {
            return Vec::new();
        };

        let mut matched: Vec<Value> = rows
            .iter()
            .filter(|row| options.filter.as_ref().map_or(true, |f| f.matches(row)))
            .cloned()
            .collect();

        if let Some(order) = &options.order_by {
            matched.sort_by(|a, b| {
                let cmp = compare_values(
                    a.get(&order.field).unwrap_or(&Value::Null),
                    b.get(&order.field).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    cmp
                } else {
                    cmp.reverse()
                }
            });
        }

        if let Some(limit) = options.limit {
            matched.truncate(limit);
        }

        if let Some(projection) = &options.select {
            matched = matched.iter().map(|row| project(row, projection)).collect();
        }

        matched
    }
}

#[async_trait]
impl BackendClient for MemoryBackend {
    async fn select(&self, collection: &str, options: &QueryOptions) -> Result<Vec<Value>> {
        Ok(self.rows_matching(collection, options))
    }

    async fn select_by_id(
        &self,
        collection: &str,
        id: &str,
        select: Option<&str>,
    ) -> Result<Option<Value>> {
        let collections = self.collections.read();
        let row = collections
            .get(collection)
            .and_then(|rows| rows.iter().find(|r| row_id(r) == Some(id)))
            .cloned();
        Ok(row.map(|r| match select {
            Some(projection) => project(&r, projection),
            None => r,
        }))
    }

    async fn insert(&self, collection: &str, row: Value) -> Result<Value> {
        if !row.is_object() {
            return Err(OpsdeskError::Backend(
                "insert payload must be a JSON object".to_string(),
            ));
        }
        let row = ensure_server_fields(row);

        let mut collections = self.collections.write();
        let rows = collections.entry(collection.to_string()).or_default();
        if let Some(id) = row_id(&row) {
            if rows.iter().any(|r| row_id(r) == Some(id)) {
                return Err(OpsdeskError::Backend(format!(
                    "duplicate key value violates unique constraint: {}/{}",
                    collection, id
                )));
            }
        }
        rows.push(row.clone());
        drop(collections);

        self.hub
            .publish(ChangeEvent::new(ChangeKind::Insert, collection, row.clone()));
        Ok(row)
    }

    async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<Value> {
        let Some(changes) = changes.as_object().cloned() else {
            return Err(OpsdeskError::Backend(
                "update payload must be a JSON object".to_string(),
            ));
        };

        let mut collections = self.collections.write();
        let updated = collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .map(|row| {
                if let Some(fields) = row.as_object_mut() {
                    for (key, value) in changes {
                        fields.insert(key, value);
                    }
                    fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
                }
                row.clone()
            });
        drop(collections);

        match updated {
            Some(row) => {
                self.hub
                    .publish(ChangeEvent::new(ChangeKind::Update, collection, row.clone()));
                Ok(row)
            }
            None => Err(OpsdeskError::Backend(format!(
                "no row matched update: {}/{}",
                collection, id
            ))),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write();
        let removed = collections.get_mut(collection).and_then(|rows| {
            let index = rows.iter().position(|r| row_id(r) == Some(id))?;
            Some(rows.remove(index))
        });
        drop(collections);

        // Absent rows delete successfully; only the present ones emit events.
        if let Some(row) = removed {
            self.hub
                .publish(ChangeEvent::new(ChangeKind::Delete, collection, row));
        }
        Ok(())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let collections = self.collections.read();
        let count = collections
            .get(collection)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }
}

impl RealtimeBackend for MemoryBackend {
    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        self.hub.subscribe(filter)
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Assign id and created_at the way the hosted backend would
fn ensure_server_fields(mut row: Value) -> Value {
    if let Some(fields) = row.as_object_mut() {
        if !fields.contains_key("id") {
            fields.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
        }
        if !fields.contains_key("created_at") {
            fields.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
        }
    }
    row
}

fn project(row: &Value, projection: &str) -> Value {
    let fields: Vec<&str> = projection.split(',').map(str::trim).collect();
    let mut out = serde_json::Map::new();
    if let Some(source) = row.as_object() {
        for field in fields {
            if let Some(value) = source.get(field) {
                out.insert(field.to_string(), value.clone());
            }
        }
    }
    Value::Object(out)
}

fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::options::OrderBy;

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let backend = MemoryBackend::new();
        let row = backend
            .insert("projects", json!({"name": "Site relaunch"}))
            .await
            .unwrap();
        assert!(row["id"].is_string());
        assert!(row["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_select_with_order_and_limit() {
        let backend = MemoryBackend::new();
        backend.seed(
            "tasks",
            vec![
                json!({"id": "t1", "priority": 3}),
                json!({"id": "t2", "priority": 1}),
                json!({"id": "t3", "priority": 2}),
            ],
        );

        let options = QueryOptions::new().order_by(OrderBy::asc("priority")).limit(2);
        let rows = backend.select("tasks", &options).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "t2");
        assert_eq!(rows[1]["id"], "t3");
    }

    #[tokio::test]
    async fn test_projection() {
        let backend = MemoryBackend::new();
        backend.seed("tasks", vec![json!({"id": "t1", "title": "Draft", "secret": "x"})]);

        let row = backend
            .select_by_id("tasks", "t1", Some("id,title"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["id"], "t1");
        assert_eq!(row["title"], "Draft");
        assert!(row.get("secret").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_row_is_backend_error() {
        let backend = MemoryBackend::new();
        let err = backend
            .update("tasks", "missing", json!({"title": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, OpsdeskError::Backend(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_row_succeeds() {
        let backend = MemoryBackend::new();
        backend.delete("tasks", "missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let backend = MemoryBackend::new();
        backend.insert("tasks", json!({"id": "t1"})).await.unwrap();
        let err = backend.insert("tasks", json!({"id": "t1"})).await.unwrap_err();
        assert!(err.to_string().contains("unique constraint"));
    }

    #[tokio::test]
    async fn test_mutations_publish_change_events() {
        let backend = MemoryBackend::new();
        let mut sub = backend.subscribe(ChangeFilter::collection("tasks"));

        let row = backend.insert("tasks", json!({"title": "Ship"})).await.unwrap();
        let id = row["id"].as_str().unwrap().to_string();

        let insert = sub.recv().await.unwrap();
        assert_eq!(insert.kind, ChangeKind::Insert);

        backend.update("tasks", &id, json!({"title": "Shipped"})).await.unwrap();
        let update = sub.recv().await.unwrap();
        assert_eq!(update.kind, ChangeKind::Update);
        assert_eq!(update.record["title"], "Shipped");

        backend.delete("tasks", &id).await.unwrap();
        let delete = sub.recv().await.unwrap();
        assert_eq!(delete.kind, ChangeKind::Delete);
    }
}
