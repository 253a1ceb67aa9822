//! Row-change events and subscriptions
//!
//! The in-memory backend publishes an event for every mutation; consumers
//! subscribe per collection with an optional column predicate. Delivery is
//! fan-out over a broadcast channel, and a subscriber that is dropped
//! simply stops receiving — there is no explicit cancellation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

/// Kinds of row changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-change event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Collection the row belongs to
    pub collection: String,
    /// The affected row. For deletes, whatever fields the backend still
    /// had; always includes `id`.
    pub record: Value,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, collection: impl Into<String>, record: Value) -> Self {
        Self {
            kind,
            collection: collection.into(),
            record,
            timestamp: Utc::now(),
        }
    }
}

/// Subscription filter: a collection plus an optional column predicate
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    pub collection: String,
    pub column: Option<(String, Value)>,
}

impl ChangeFilter {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            column: None,
        }
    }

    /// Restrict to rows where `column` equals `value`
    pub fn with_column(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.column = Some((column.into(), value.into()));
        self
    }

    /// Check if an event matches this filter
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.collection != self.collection {
            return false;
        }
        if let Some((column, expected)) = &self.column {
            let actual = event.record.get(column).unwrap_or(&Value::Null);
            if actual != expected {
                return false;
            }
        }
        true
    }
}

const HUB_CAPACITY: usize = 256;

/// Broadcast hub for change events
#[derive(Debug, Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all matching subscribers. A send with no
    /// subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe with a filter; only matching events are delivered.
    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }
}

/// A filtered change-event subscription
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
}

impl Subscription {
    /// Receive the next matching event. Returns `None` once the hub is
    /// gone. Events missed under lag are skipped, not replayed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change subscription lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Adapt the subscription into a stream of matching events.
    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> {
        let filter = self.filter;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(event) if filter.matches(&event) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "change subscription lagged, events dropped");
                None
            }
        })
    }
}
