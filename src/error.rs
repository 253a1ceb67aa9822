//! Error types for Opsdesk

use thiserror::Error;

/// Result type alias for Opsdesk operations
pub type Result<T> = std::result::Result<T, OpsdeskError>;

/// Main error type for Opsdesk
#[derive(Error, Debug)]
pub enum OpsdeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OpsdeskError {
    /// Whether the error is a normal authorization denial rather than a fault
    pub fn is_denial(&self) -> bool {
        matches!(self, OpsdeskError::Unauthorized(_))
    }

    /// Human-readable message suitable for a login/signup form
    pub fn user_message(&self) -> String {
        match self {
            OpsdeskError::Auth(msg) => msg.clone(),
            OpsdeskError::Unauthorized(_) => "You do not have access to this area".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_is_not_a_fault() {
        let err = OpsdeskError::Unauthorized("finance requires view".to_string());
        assert!(err.is_denial());
        assert!(!OpsdeskError::Backend("boom".to_string()).is_denial());
    }

    #[test]
    fn test_auth_user_message_passes_through() {
        let err = OpsdeskError::Auth("Passwords do not match".to_string());
        assert_eq!(err.user_message(), "Passwords do not match");
    }
}
