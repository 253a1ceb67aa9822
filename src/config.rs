//! Startup configuration
//!
//! Two values are required to talk to the hosted backend: the project URL
//! and the public (anon) API key. Absence of either is a fatal startup
//! error; the `opsdesk-setup` binary reports the same checks with
//! remediation guidance instead of failing.

use crate::error::{OpsdeskError, Result};

/// Environment variable holding the backend project URL
pub const ENV_BACKEND_URL: &str = "OPSDESK_BACKEND_URL";
/// Environment variable holding the public API key
pub const ENV_API_KEY: &str = "OPSDESK_API_KEY";
/// Optional flag enabling demo-only behavior such as role switching
pub const ENV_DEMO: &str = "OPSDESK_DEMO";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted backend, e.g. `https://project.example.co`
    pub backend_url: String,
    /// Public API key sent with every backend request
    pub api_key: String,
    /// Demo mode: permits local role overrides, never backend authorization
    pub demo_mode: bool,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Fails with a `Config` error naming the first missing variable.
    pub fn from_env() -> Result<Self> {
        let backend_url = require_env(ENV_BACKEND_URL)?;
        let api_key = require_env(ENV_API_KEY)?;
        let demo_mode = std::env::var(ENV_DEMO)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            api_key,
            demo_mode,
        })
    }

    /// Check each required variable and return findings for the setup tool.
    pub fn diagnose() -> Vec<ConfigCheck> {
        [
            (
                ENV_BACKEND_URL,
                "Set it to your backend project URL, e.g. https://abc123.supabase.co",
            ),
            (
                ENV_API_KEY,
                "Set it to the project's public (anon) API key from the dashboard's API settings",
            ),
        ]
        .into_iter()
        .map(|(var, hint)| ConfigCheck {
            var,
            present: present(var),
            hint,
        })
        .collect()
    }
}

/// Result of checking a single required variable
#[derive(Debug, Clone)]
pub struct ConfigCheck {
    pub var: &'static str,
    pub present: bool,
    pub hint: &'static str,
}

fn present(var: &str) -> bool {
    std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn require_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(OpsdeskError::Config(format!(
            "{} is not set; the application cannot start without it",
            var
        ))),
    }
}
