//! Identity provider boundary
//!
//! The hosted auth service owns identities and sessions; the application
//! depends only on this trait: an existing-session query, sign-in/up/out,
//! and a push subscription for session changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::access::Role;
use crate::error::Result;

/// Provider-owned identity; read-only to the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque, stable id
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Ephemeral pairing of identity and issuance metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Utc::now() > exp).unwrap_or(false)
    }
}

/// Sign-in credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Sign-up request; role and display name travel as identity metadata
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: Option<String>,
    pub role: Role,
}

/// Provider-pushed session change
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

/// The external identity/session provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return the existing session, if any
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Authenticate with email/password
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session>;

    /// Register a new identity; role and display name are attached as
    /// metadata so the backend trigger can create the profile row
    async fn sign_up(&self, request: &SignUp) -> Result<Session>;

    /// Invalidate the current session
    async fn sign_out(&self) -> Result<()>;

    /// Subscribe to provider-pushed session changes
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
