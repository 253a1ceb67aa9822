//! Functional modules subject to role-gating

use serde::{Deserialize, Serialize};

/// A named functional area of the application.
///
/// The set is fixed at build time; per-user module lists are always derived
/// from the permission table, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    /// Founder dashboard: company pulse, KPIs
    Headquarters,
    /// Contracts, compliance, legal vault
    Legal,
    /// Invoices, revenue, runway
    Finance,
    /// Service catalog and packages
    Services,
    /// Client roster and client portal administration
    Clients,
    /// Projects, tasks, delivery pipeline
    Operations,
    /// Internal knowledge base
    Wiki,
    /// Brand assets and guidelines
    Brand,
    /// Traffic and performance analytics
    Analytics,
}

impl Module {
    /// Every module that participates in permission checks
    pub const ALL: [Module; 9] = [
        Module::Headquarters,
        Module::Legal,
        Module::Finance,
        Module::Services,
        Module::Clients,
        Module::Operations,
        Module::Wiki,
        Module::Brand,
        Module::Analytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::Headquarters => "headquarters",
            Module::Legal => "legal",
            Module::Finance => "finance",
            Module::Services => "services",
            Module::Clients => "clients",
            Module::Operations => "operations",
            Module::Wiki => "wiki",
            Module::Brand => "brand",
            Module::Analytics => "analytics",
        }
    }
}

impl std::str::FromStr for Module {
    type Err = crate::error::OpsdeskError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "headquarters" => Ok(Module::Headquarters),
            "legal" => Ok(Module::Legal),
            "finance" => Ok(Module::Finance),
            "services" => Ok(Module::Services),
            "clients" => Ok(Module::Clients),
            "operations" => Ok(Module::Operations),
            "wiki" => Ok(Module::Wiki),
            "brand" => Ok(Module::Brand),
            "analytics" => Ok(Module::Analytics),
            other => Err(crate::error::OpsdeskError::InvalidInput(format!(
                "Unknown module: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
