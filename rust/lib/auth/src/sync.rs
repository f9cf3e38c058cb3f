//! Session synchronizer.
//!
//! # Ordering
//!
//! `start()` registers the provider listener first and only then issues the
//! initial session fetch, so no event fired during the fetch is missed. Each
//! observation takes a token from one monotonic counter: an event when it is
//! delivered, the fetch when it is issued. An observation is applied only if
//! its token is newer than the last applied one. A fetch that resolves after
//! a later event is therefore dropped, and the event's session stands.
//!
//! # Outcomes
//!
//! Every write operation returns an [`OpResult`] and shows exactly one
//! notification. Local session state never changes directly from a write;
//! it follows the provider's own state-change events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::json;

use campus_diag::LogStore;
use campus_state::{Notification, Notifier, StateCell, SubscriptionId};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::messages;
use crate::outcome::OpResult;
use crate::profile::{ProfileFields, ProfileRecord, ProfileStore};
use crate::provider::{
    AuthChange, AuthEventKind, AuthSession, IdentityProvider, IdentityUser, ListenerId, Session,
    SignUpRequest,
};
use crate::state::AuthState;

/// Keeps an observable [`AuthState`] in step with the identity provider and
/// runs the account write operations.
///
/// Cheap to clone; clones share the same state and listener.
#[derive(Clone)]
pub struct SessionSynchronizer {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    log: Arc<LogStore>,
    config: AuthConfig,
    state: Arc<StateCell<AuthState>>,
    /// Next observation token. Starts at 1; 0 means "nothing applied yet".
    next_token: AtomicU64,
    applied_token: Mutex<u64>,
    listener: Mutex<Option<ListenerId>>,
}

impl SessionSynchronizer {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
        log: Arc<LogStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                profiles,
                notifier,
                log,
                config,
                state: Arc::new(StateCell::new(AuthState::initial())),
                next_token: AtomicU64::new(1),
                applied_token: Mutex::new(0),
                listener: Mutex::new(None),
            }),
        }
    }

    // ====================================================================
    // Lifecycle
    // ====================================================================

    /// Register the provider listener, then fetch the current session.
    ///
    /// Setup faults are logged and still resolve `loading`, so the UI never
    /// waits forever. Calling `start` again while running is a no-op.
    pub async fn start(&self) {
        if self.inner.listener.lock().is_some() {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let registered = self.inner.provider.on_session_change(Arc::new(move |change: AuthChange| {
            if let Some(inner) = weak.upgrade() {
                inner.on_change(change);
            }
        }));
        match registered {
            Ok(id) => *self.inner.listener.lock() = Some(id),
            Err(e) => {
                self.inner.log.error(messages::LOG_SETUP_FAILED, AuthError::from(e).to_fault());
                self.inner.resolve_loading();
                return;
            }
        }

        let token = self.inner.issue_token();
        match self.inner.provider.get_current_session().await {
            Ok(session) => {
                self.inner.apply(token, session);
            }
            Err(e) => {
                self.inner.log.error(messages::LOG_SETUP_FAILED, AuthError::from(e).to_fault());
                self.inner.resolve_loading();
            }
        }
    }

    /// Unregister the provider listener. Also happens when the last clone
    /// is dropped.
    pub fn stop(&self) {
        if let Some(id) = self.inner.listener.lock().take() {
            self.inner.provider.remove_listener(id);
        }
    }

    pub fn is_listening(&self) -> bool {
        self.inner.listener.lock().is_some()
    }

    // ====================================================================
    // State
    // ====================================================================

    /// Snapshot of `{user, session, loading, is_resetting_password}`.
    pub fn state(&self) -> AuthState {
        self.inner.state.get()
    }

    pub fn user(&self) -> Option<IdentityUser> {
        self.inner.state.with(|s| s.user.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.with(|s| s.session.clone())
    }

    pub fn loading(&self) -> bool {
        self.inner.state.with(|s| s.loading)
    }

    pub fn is_resetting_password(&self) -> bool {
        self.inner.state.with(|s| s.is_resetting_password)
    }

    /// The underlying cell, for `watch`-style RAII subscriptions.
    pub fn state_cell(&self) -> &Arc<StateCell<AuthState>> {
        &self.inner.state
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        self.inner.state.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.state.unsubscribe(id)
    }

    // ====================================================================
    // Write operations
    // ====================================================================

    /// Create an account, then its profile record.
    ///
    /// If the profile write fails the account still exists upstream, but the
    /// whole operation reports the profile error. There is no rollback.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
    ) -> OpResult<AuthSession> {
        let inner = &self.inner;
        let request = SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            email_redirect_to: inner.config.sign_up_redirect(),
            data: fields.clone(),
        };

        let result: Result<AuthSession, AuthError> = async {
            let data = inner.provider.sign_up(request).await?;
            if let Some(user) = &data.user {
                let record = ProfileRecord::new(user.id.clone(), fields);
                inner.profiles.insert_profile(&record).await?;
            }
            Ok(data)
        }
        .await;

        match result {
            Ok(data) => {
                inner.notifier.notify(messages::signed_up());
                OpResult::ok(data)
            }
            Err(e) => inner.fail(messages::LOG_SIGN_UP_FAILED, e),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> OpResult<AuthSession> {
        let inner = &self.inner;
        match inner.provider.sign_in_with_password(email, password).await {
            Ok(data) => {
                inner.notifier.notify(messages::signed_in());
                OpResult::ok(data)
            }
            Err(e) => inner.fail(messages::LOG_SIGN_IN_FAILED, e.into()),
        }
    }

    /// Ask the provider to revoke the session. Local state is cleared by the
    /// provider's `SignedOut` event, not here.
    pub async fn sign_out(&self) -> OpResult<()> {
        let inner = &self.inner;
        match inner.provider.sign_out().await {
            Ok(()) => {
                inner.notifier.notify(messages::signed_out());
                inner.log.info(messages::LOG_SIGN_OUT_OK, None);
                OpResult::ok(())
            }
            Err(e) => inner.fail(messages::LOG_SIGN_OUT_FAILED, e.into()),
        }
    }

    /// Send a password-reset email. `is_resetting_password` is true for the
    /// duration of the call and false again on every exit path.
    pub async fn reset_password(&self, email: &str) -> OpResult<()> {
        let inner = &self.inner;
        let _pending = PendingReset::begin(&inner.state);

        let redirect = inner.config.reset_redirect();
        match inner.provider.send_password_reset_email(email, &redirect).await {
            Ok(()) => {
                inner.notifier.notify(messages::reset_sent());
                inner.log.info(messages::LOG_RESET_SENT, Some(json!({ "email": email })));
                OpResult::ok(())
            }
            Err(e) => inner.fail(messages::LOG_RESET_FAILED, e.into()),
        }
    }

    pub async fn update_password(&self, new_password: &str) -> OpResult<()> {
        let inner = &self.inner;
        match inner.provider.update_credential(new_password).await {
            Ok(_) => {
                inner.notifier.notify(messages::password_updated());
                inner.log.info(messages::LOG_PASSWORD_UPDATED, None);
                OpResult::ok(())
            }
            Err(e) => inner.fail(messages::LOG_PASSWORD_UPDATE_FAILED, e.into()),
        }
    }
}

impl Inner {
    fn issue_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst)
    }

    fn on_change(&self, change: AuthChange) {
        let token = self.issue_token();
        let user_id = change.session.as_ref().map(|s| s.user.id.clone());
        self.apply(token, change.session);

        match change.kind {
            AuthEventKind::SignedIn => {
                self.log.info(messages::LOG_SIGNED_IN, Some(json!({ "userId": user_id })));
            }
            AuthEventKind::SignedOut => self.log.info(messages::LOG_SIGNED_OUT, None),
            _ => {}
        }
    }

    /// Apply an observation unless a newer one is already applied.
    fn apply(&self, token: u64, session: Option<Session>) -> bool {
        let applied = self.state.update_if(|state| {
            let mut last = self.applied_token.lock();
            if token < *last {
                return false;
            }
            *last = token;
            state.observe(session);
            true
        });
        if !applied {
            tracing::debug!(token, "stale session observation dropped");
        }
        applied
    }

    fn resolve_loading(&self) {
        self.state.update_if(|state| {
            if !state.loading {
                return false;
            }
            state.loading = false;
            true
        });
    }

    fn fail<T>(&self, log_message: &str, error: AuthError) -> OpResult<T> {
        self.log.error(log_message, error.to_fault());
        self.notifier.notify(Notification::failure(error.to_string()));
        OpResult::err(error)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(id) = self.listener.get_mut().take() {
            self.provider.remove_listener(id);
        }
    }
}

/// Holds `is_resetting_password` true until dropped.
struct PendingReset<'a> {
    state: &'a StateCell<AuthState>,
}

impl<'a> PendingReset<'a> {
    fn begin(state: &'a StateCell<AuthState>) -> Self {
        state.update(|s| s.is_resetting_password = true);
        Self { state }
    }
}

impl Drop for PendingReset<'_> {
    fn drop(&mut self) {
        self.state.update(|s| s.is_resetting_password = false);
    }
}
