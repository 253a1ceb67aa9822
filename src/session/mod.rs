//! Auth and session lifecycle
//!
//! Provides:
//! - The identity-provider boundary (sessions, sign-in/up/out, push events)
//! - Profile records linking identities to roles
//! - The process-wide session context with permission checks

mod context;
mod profile;
mod provider;

pub use context::{AuthState, SessionContext};
pub use profile::{Profile, ProfileUpdate, PROFILES_COLLECTION};
pub use provider::{AuthEvent, Credentials, Identity, IdentityProvider, Session, SignUp};
