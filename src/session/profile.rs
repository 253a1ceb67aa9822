//! Profile records
//!
//! One profile per identity, created by a backend trigger when an
//! identity first registers. The application reads and edits profiles
//! through the record service; it never deletes them.

use serde::{Deserialize, Serialize};

use crate::access::Role;

/// Collection name for profile rows
pub const PROFILES_COLLECTION: &str = "profiles";

/// Application-owned record linking an identity to a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Equals the identity id
    pub id: String,
    pub display_name: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Links client-role profiles to their client record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Partial profile edit; only set fields change
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}
