//! Session context
//!
//! The single process-wide holder of "who is logged in and what can they
//! do". Constructed once at startup and passed by `Arc`; its state is
//! mutated only by the lifecycle methods below and the provider-event
//! handler, never by ambient code.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::access::{self, AccessLevel, Module, Role};
use crate::error::{OpsdeskError, Result};
use crate::records::{BackendClient, RecordService};
use crate::session::profile::{Profile, PROFILES_COLLECTION};
use crate::session::provider::{AuthEvent, Credentials, IdentityProvider, Session, SignUp};

/// Lifecycle states of the session context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Asking the provider for an existing session
    Initializing,
    /// No session held
    Unauthenticated,
    /// Explicit sign-in/sign-up in flight
    Authenticating,
    /// A session is held; the profile may still be unresolved
    Authenticated,
}

struct Inner {
    state: AuthState,
    session: Option<Session>,
    profile: Option<Profile>,
    /// Demo-only local override; never affects backend authorization
    role_override: Option<Role>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: AuthState::Initializing,
            session: None,
            profile: None,
            role_override: None,
        }
    }
}

/// Process-wide auth/session holder
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    profiles: RecordService<Profile>,
    demo_mode: bool,
    inner: RwLock<Inner>,
}

impl SessionContext {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        backend: Arc<dyn BackendClient>,
        demo_mode: bool,
    ) -> Self {
        Self {
            provider,
            profiles: RecordService::new(backend, PROFILES_COLLECTION),
            demo_mode,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Ask the provider for an existing session and settle initial state.
    /// With no session, the profile fetch is never attempted.
    pub async fn initialize(&self) {
        self.set_state(AuthState::Initializing);
        match self.provider.get_session().await {
            Ok(Some(session)) => self.apply_session(session).await,
            Ok(None) => {
                debug!("no existing session");
                self.clear();
            }
            Err(e) => {
                error!("session lookup failed: {}", e);
                self.clear();
            }
        }
    }

    /// Explicit email/password sign-in. Failures leave the context
    /// unauthenticated and propagate a typed auth error.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<()> {
        self.set_state(AuthState::Authenticating);
        match self.provider.sign_in(credentials).await {
            Ok(session) => {
                info!(user = %session.identity.id, "signed in");
                self.apply_session(session).await;
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(as_auth_error(e))
            }
        }
    }

    /// Register a new identity. Local validation runs before the provider
    /// is contacted.
    pub async fn sign_up(&self, request: &SignUp) -> Result<()> {
        if request.password != request.confirm_password {
            return Err(OpsdeskError::Auth("Passwords do not match".to_string()));
        }

        self.set_state(AuthState::Authenticating);
        match self.provider.sign_up(request).await {
            Ok(session) => {
                info!(user = %session.identity.id, "signed up");
                self.apply_session(session).await;
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(as_auth_error(e))
            }
        }
    }

    /// Provider sign-out, then clear everything held locally.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.provider.sign_out().await;
        self.clear();
        info!("signed out");
        result
    }

    /// Apply a provider-pushed session change. This is the only path
    /// besides the explicit calls above that may mutate the context.
    pub async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                self.set_state(AuthState::Initializing);
                self.apply_session(session).await;
            }
            AuthEvent::SignedOut => {
                debug!("provider reported sign-out");
                self.clear();
            }
        }
    }

    /// Spawn a task that feeds provider events into the context for the
    /// lifetime of the subscription.
    pub fn spawn_event_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let context = Arc::clone(self);
        let mut events = context.provider.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => context.handle_event(event).await,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth events lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn apply_session(&self, session: Session) {
        let identity_id = session.identity.id.clone();
        {
            let mut inner = self.inner.write();
            inner.session = Some(session);
            inner.profile = None;
        }

        match self.profiles.get_by_id(&identity_id).await {
            Ok(Some(profile)) => {
                debug!(user = %identity_id, role = %profile.role, "profile resolved");
                let mut inner = self.inner.write();
                inner.profile = Some(profile);
                inner.state = AuthState::Authenticated;
            }
            Ok(None) => {
                // The backend trigger creates profiles on registration;
                // a missing row means it has not landed yet.
                warn!(user = %identity_id, "no profile for identity");
                self.inner.write().state = AuthState::Authenticated;
            }
            Err(e) => {
                error!(user = %identity_id, "profile fetch failed: {}", e);
                self.inner.write().state = AuthState::Authenticated;
            }
        }
    }

    fn clear(&self) {
        let mut inner = self.inner.write();
        inner.session = None;
        inner.profile = None;
        inner.role_override = None;
        inner.state = AuthState::Unauthenticated;
    }

    fn set_state(&self, state: AuthState) {
        self.inner.write().state = state;
    }

    pub fn state(&self) -> AuthState {
        self.inner.read().state
    }

    /// True while the provider is being consulted
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state(),
            AuthState::Initializing | AuthState::Authenticating
        )
    }

    /// Authenticated for app purposes: a session and a resolved profile
    pub fn is_authenticated(&self) -> bool {
        let inner = self.inner.read();
        inner.session.is_some() && inner.profile.is_some()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.read().session.clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.inner.read().profile.clone()
    }

    /// The role permission checks evaluate against: the demo override if
    /// set, otherwise the profile's role.
    pub fn role(&self) -> Option<Role> {
        let inner = self.inner.read();
        inner.role_override.or(inner.profile.as_ref().map(|p| p.role))
    }

    /// Permission check bound to the held profile's role. Always false
    /// when unauthenticated. A false result is normal control flow.
    pub fn has_permission(&self, module: Module, required: AccessLevel) -> bool {
        match self.role() {
            Some(role) => access::has_permission(role, module, required),
            None => false,
        }
    }

    /// Gate-style permission check for call sites that want an error.
    pub fn require(&self, module: Module, required: AccessLevel) -> Result<()> {
        if self.has_permission(module, required) {
            Ok(())
        } else {
            Err(OpsdeskError::Unauthorized(format!(
                "{} requires {} access",
                module, required
            )))
        }
    }

    /// Modules the current role may at least view.
    pub fn visible_modules(&self) -> Vec<Module> {
        self.role().map(access::visible_modules).unwrap_or_default()
    }

    /// Demo-only local role override. Display-side only; the backend still
    /// authorizes with the real session.
    pub fn switch_role(&self, role: Role) -> Result<()> {
        if !self.demo_mode {
            return Err(OpsdeskError::Unauthorized(
                "role switching is only available in demo mode".to_string(),
            ));
        }
        info!(%role, "demo role override");
        self.inner.write().role_override = Some(role);
        Ok(())
    }
}

fn as_auth_error(err: OpsdeskError) -> OpsdeskError {
    match err {
        e @ OpsdeskError::Auth(_) => e,
        other => OpsdeskError::Auth(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Filter, MemoryBackend, QueryOptions};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::broadcast;

    struct MockProvider {
        session: Option<Session>,
        reject_credentials: bool,
        sender: broadcast::Sender<AuthEvent>,
    }

    impl MockProvider {
        fn new(session: Option<Session>) -> Self {
            let (sender, _) = broadcast::channel(8);
            Self {
                session,
                reject_credentials: false,
                sender,
            }
        }

        fn session_for(id: &str) -> Session {
            Session {
                identity: crate::session::Identity {
                    id: id.to_string(),
                    email: format!("{}@example.com", id),
                    display_name: None,
                    avatar_url: None,
                },
                access_token: "token".to_string(),
                expires_at: None,
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for MockProvider {
        async fn get_session(&self) -> Result<Option<Session>> {
            Ok(self.session.clone())
        }

        async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
            if self.reject_credentials {
                return Err(OpsdeskError::Auth("Invalid login credentials".to_string()));
            }
            let id = credentials.email.split('@').next().unwrap().to_string();
            Ok(Self::session_for(&id))
        }

        async fn sign_up(&self, request: &SignUp) -> Result<Session> {
            let id = request.email.split('@').next().unwrap().to_string();
            Ok(Self::session_for(&id))
        }

        async fn sign_out(&self) -> Result<()> {
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.sender.subscribe()
        }
    }

    /// Counts profile lookups so tests can assert none happened
    struct CountingBackend {
        inner: MemoryBackend,
        lookups: AtomicUsize,
    }

    impl CountingBackend {
        fn new(inner: MemoryBackend) -> Self {
            Self {
                inner,
                lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BackendClient for CountingBackend {
        async fn select(&self, collection: &str, options: &QueryOptions) -> Result<Vec<Value>> {
            self.inner.select(collection, options).await
        }

        async fn select_by_id(
            &self,
            collection: &str,
            id: &str,
            select: Option<&str>,
        ) -> Result<Option<Value>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.select_by_id(collection, id, select).await
        }

        async fn insert(&self, collection: &str, row: Value) -> Result<Value> {
            self.inner.insert(collection, row).await
        }

        async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<Value> {
            self.inner.update(collection, id, changes).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<()> {
            self.inner.delete(collection, id).await
        }

        async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
            self.inner.count(collection, filter).await
        }
    }

    /// Backend whose profile lookups always fail
    struct FailingBackend;

    #[async_trait]
    impl BackendClient for FailingBackend {
        async fn select(&self, _: &str, _: &QueryOptions) -> Result<Vec<Value>> {
            Err(OpsdeskError::Backend("connection refused".to_string()))
        }

        async fn select_by_id(&self, _: &str, _: &str, _: Option<&str>) -> Result<Option<Value>> {
            Err(OpsdeskError::Backend("connection refused".to_string()))
        }

        async fn insert(&self, _: &str, _: Value) -> Result<Value> {
            Err(OpsdeskError::Backend("connection refused".to_string()))
        }

        async fn update(&self, _: &str, _: &str, _: Value) -> Result<Value> {
            Err(OpsdeskError::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _: &str, _: &str) -> Result<()> {
            Err(OpsdeskError::Backend("connection refused".to_string()))
        }

        async fn count(&self, _: &str, _: &Filter) -> Result<u64> {
            Err(OpsdeskError::Backend("connection refused".to_string()))
        }
    }

    fn backend_with_profile(id: &str, role: &str) -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.seed(
            PROFILES_COLLECTION,
            vec![json!({"id": id, "display_name": "Ana", "role": role})],
        );
        backend
    }

    #[tokio::test]
    async fn test_fresh_start_without_session() {
        let provider = Arc::new(MockProvider::new(None));
        let backend = Arc::new(CountingBackend::new(MemoryBackend::new()));
        let backend_client: Arc<dyn BackendClient> = backend.clone();
        let context = SessionContext::new(provider, backend_client, false);

        context.initialize().await;

        assert_eq!(context.state(), AuthState::Unauthenticated);
        assert!(!context.is_loading());
        assert!(!context.is_authenticated());
        // No session means the profile fetch never runs
        assert_eq!(backend.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_existing_session_resolves_profile() {
        let provider = Arc::new(MockProvider::new(Some(MockProvider::session_for("u1"))));
        let backend = Arc::new(backend_with_profile("u1", "manager"));
        let context = SessionContext::new(provider, backend, false);

        context.initialize().await;

        assert_eq!(context.state(), AuthState::Authenticated);
        assert!(context.is_authenticated());
        assert_eq!(context.role(), Some(Role::Manager));
    }

    #[tokio::test]
    async fn test_profile_fetch_failure_is_isolated() {
        let provider = Arc::new(MockProvider::new(Some(MockProvider::session_for("u1"))));
        let context = SessionContext::new(provider, Arc::new(FailingBackend), false);

        context.initialize().await;

        assert!(!context.is_authenticated());
        assert!(!context.is_loading());
        // Session is still cached even though the profile never resolved
        assert!(context.session().is_some());
        assert!(!context.has_permission(Module::Operations, AccessLevel::View));
    }

    #[tokio::test]
    async fn test_sign_up_password_mismatch() {
        let provider = Arc::new(MockProvider::new(None));
        let backend = Arc::new(MemoryBackend::new());
        let context = SessionContext::new(provider, backend, false);
        context.initialize().await;

        let err = context
            .sign_up(&SignUp {
                email: "u1@example.com".to_string(),
                password: "one".to_string(),
                confirm_password: "two".to_string(),
                display_name: None,
                role: Role::Client,
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Passwords do not match");
        assert_eq!(context.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_in_failure_stays_unauthenticated() {
        let mut provider = MockProvider::new(None);
        provider.reject_credentials = true;
        let context =
            SessionContext::new(Arc::new(provider), Arc::new(MemoryBackend::new()), false);
        context.initialize().await;

        let err = context
            .sign_in(&Credentials {
                email: "u1@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid login credentials");
        assert_eq!(context.state(), AuthState::Unauthenticated);
        assert!(!context.is_loading());
    }

    #[tokio::test]
    async fn test_sign_in_then_sign_out() {
        let provider = Arc::new(MockProvider::new(None));
        let backend = Arc::new(backend_with_profile("u1", "admin"));
        let context = SessionContext::new(provider, backend, false);
        context.initialize().await;

        context
            .sign_in(&Credentials {
                email: "u1@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert!(context.is_authenticated());
        assert!(context.has_permission(Module::Finance, AccessLevel::Full));

        context.sign_out().await.unwrap();
        assert_eq!(context.state(), AuthState::Unauthenticated);
        assert!(!context.has_permission(Module::Finance, AccessLevel::View));
    }

    #[tokio::test]
    async fn test_provider_events_recompute_state() {
        let provider = Arc::new(MockProvider::new(None));
        let backend = Arc::new(backend_with_profile("u2", "client"));
        let context = SessionContext::new(provider, backend, false);
        context.initialize().await;

        context
            .handle_event(AuthEvent::SignedIn(MockProvider::session_for("u2")))
            .await;
        assert!(context.is_authenticated());
        assert_eq!(context.role(), Some(Role::Client));
        assert_eq!(context.visible_modules(), vec![Module::Clients]);

        context.handle_event(AuthEvent::SignedOut).await;
        assert!(!context.is_authenticated());
    }

    #[tokio::test]
    async fn test_switch_role_is_demo_gated() {
        let provider = Arc::new(MockProvider::new(Some(MockProvider::session_for("u1"))));
        let backend = Arc::new(backend_with_profile("u1", "client"));
        let context = SessionContext::new(provider, backend, false);
        context.initialize().await;

        assert!(context.switch_role(Role::Admin).is_err());
        assert_eq!(context.role(), Some(Role::Client));
    }

    #[tokio::test]
    async fn test_switch_role_in_demo_mode() {
        let provider = Arc::new(MockProvider::new(Some(MockProvider::session_for("u1"))));
        let backend = Arc::new(backend_with_profile("u1", "client"));
        let context = SessionContext::new(provider, backend, true);
        context.initialize().await;

        context.switch_role(Role::Admin).unwrap();
        assert_eq!(context.role(), Some(Role::Admin));
        assert!(context.has_permission(Module::Legal, AccessLevel::Full));
        // Sign-out drops the override with everything else
        context.sign_out().await.unwrap();
        assert_eq!(context.role(), None);
    }

    #[tokio::test]
    async fn test_require_denial_message() {
        let provider = Arc::new(MockProvider::new(Some(MockProvider::session_for("u1"))));
        let backend = Arc::new(backend_with_profile("u1", "user"));
        let context = SessionContext::new(provider, backend, false);
        context.initialize().await;

        context.require(Module::Operations, AccessLevel::Edit).unwrap();
        let err = context
            .require(Module::Finance, AccessLevel::View)
            .unwrap_err();
        assert!(err.is_denial());
    }
}
