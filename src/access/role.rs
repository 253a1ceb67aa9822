//! User roles

use serde::{Deserialize, Serialize};

/// The four-tier role classification.
///
/// Canonical names are `admin`/`manager`/`user`/`client`. The legacy labels
/// `founder`/`team`/`contractor` used by the identity provider are accepted
/// as aliases on input only and never produced on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Founders and administrators
    #[serde(alias = "founder")]
    Admin,
    /// Internal team members
    #[serde(alias = "team")]
    Manager,
    /// Contractors and limited internal users
    #[serde(alias = "contractor")]
    User,
    /// External client portal users
    Client,
}

impl Role {
    /// Every role, in privilege order
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::User, Role::Client];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
            Role::Client => "client",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::OpsdeskError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "admin" | "founder" => Ok(Role::Admin),
            "manager" | "team" => Ok(Role::Manager),
            "user" | "contractor" => Ok(Role::User),
            "client" => Ok(Role::Client),
            other => Err(crate::error::OpsdeskError::InvalidInput(format!(
                "Unknown role: {}. Valid roles: admin, manager, user, client",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_aliases_parse_to_canonical() {
        assert_eq!("founder".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("team".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("contractor".parse::<Role>().unwrap(), Role::User);
        assert_eq!("client".parse::<Role>().unwrap(), Role::Client);
    }

    #[test]
    fn test_serde_aliases() {
        let role: Role = serde_json::from_str("\"founder\"").unwrap();
        assert_eq!(role, Role::Admin);
        // Output is always canonical
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("superuser".parse::<Role>().is_err());
    }
}
