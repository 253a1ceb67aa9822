//! Access levels

use serde::{Deserialize, Serialize};

/// How much a role may do within a module.
///
/// Totally ordered: `None < View < Edit < Full`. The derived `Ord` follows
/// declaration order, so comparisons and `rank` always agree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// No access at all
    #[default]
    None,
    /// Read-only access
    View,
    /// Read and modify
    Edit,
    /// Full control, including administrative actions
    Full,
}

impl AccessLevel {
    /// Numeric rank: none=0, view=1, edit=2, full=3
    pub fn rank(self) -> u8 {
        match self {
            AccessLevel::None => 0,
            AccessLevel::View => 1,
            AccessLevel::Edit => 2,
            AccessLevel::Full => 3,
        }
    }

    /// Whether this level satisfies a required level
    pub fn satisfies(self, required: AccessLevel) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::None => "none",
            AccessLevel::View => "view",
            AccessLevel::Edit => "edit",
            AccessLevel::Full => "full",
        }
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = crate::error::OpsdeskError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "none" => Ok(AccessLevel::None),
            "view" => Ok(AccessLevel::View),
            "edit" => Ok(AccessLevel::Edit),
            "full" => Ok(AccessLevel::Full),
            other => Err(crate::error::OpsdeskError::InvalidInput(format!(
                "Unknown access level: {}. Valid levels: none, view, edit, full",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
