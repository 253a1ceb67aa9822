//! Opsdesk - Agency operating system core
//!
//! Role-based access control, session lifecycle, and generic record
//! access over a hosted backend.

pub mod access;
pub mod config;
pub mod error;
pub mod objects;
pub mod realtime;
pub mod records;
pub mod session;
pub mod types;

pub use access::{has_permission, level_for, AccessLevel, Module, Role};
pub use config::AppConfig;
pub use error::{OpsdeskError, Result};
pub use records::RecordService;
pub use session::SessionContext;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
