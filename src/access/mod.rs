//! Role-based access control
//!
//! Provides:
//! - Closed role, module, and access-level enumerations
//! - The static permission table covering every (role, module) pair
//! - A pure evaluator used by the session context and module gates

mod level;
mod module;
mod role;
mod table;

pub use level::AccessLevel;
pub use module::Module;
pub use role::Role;
pub use table::{has_permission, level_for, visible_modules};
