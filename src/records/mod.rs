//! Generic record access over the hosted backend
//!
//! The `BackendClient` trait is the single "execute filtered query"
//! primitive; `RecordService<T>` is the typed per-collection facade the
//! rest of the application uses.

mod backend;
mod memory;
mod options;
mod rest;
mod service;

pub use backend::{BackendClient, RealtimeBackend};
pub use memory::MemoryBackend;
pub use options::{Filter, FilterValue, OrderBy, QueryOptions};
pub use rest::RestBackend;
pub use service::{RawRecordService, RecordService};
