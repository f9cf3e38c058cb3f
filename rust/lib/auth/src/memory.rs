//! In-memory identity provider and profile store.
//!
//! Used by tests and the `campus run` demo. Failures can be scripted per
//! operation, events can be emitted by hand or held back, and the initial
//! session fetch can be held open to exercise arrival-order races.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{ProfileError, ProviderError};
use crate::profile::{ProfileRecord, ProfileStore};
use crate::provider::{
    AuthChange, AuthEventKind, AuthSession, IdentityProvider, IdentityUser, ListenerId, Session,
    SessionListener, SignUpRequest,
};

const MIN_PASSWORD_LEN: usize = 6;
const SESSION_TTL_SECS: i64 = 3600;

/// Provider operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOp {
    GetSession,
    Subscribe,
    SignUp,
    SignIn,
    SignOut,
    ResetPassword,
    UpdateCredential,
}

struct Account {
    user: IdentityUser,
    password: String,
}

/// Releases a held initial fetch. Dropping it releases the fetch as well.
pub struct FetchGate {
    tx: Option<oneshot::Sender<()>>,
}

impl FetchGate {
    pub fn release(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Default)]
pub struct MemoryProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<Session>>,
    listeners: Mutex<Vec<(ListenerId, SessionListener)>>,
    next_listener: AtomicU64,
    failures: Mutex<HashMap<ProviderOp, ProviderError>>,
    fetch_gate: Mutex<Option<oneshot::Receiver<()>>>,
    fetch_waiting: AtomicBool,
    held_events: Mutex<Option<Vec<AuthChange>>>,
    reset_requests: Mutex<Vec<(String, String)>>,
    sign_ups: Mutex<Vec<SignUpRequest>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ====================================================================
    // Scripting
    // ====================================================================

    /// Make every call of `op` fail with `error` until cleared.
    pub fn fail(&self, op: ProviderOp, error: ProviderError) {
        self.failures.lock().insert(op, error);
    }

    pub fn clear_failure(&self, op: ProviderOp) {
        self.failures.lock().remove(&op);
    }

    /// Hold the next `get_current_session` call until the gate is released.
    ///
    /// The held call returns the session that was current when it was made.
    pub fn hold_initial_fetch(&self) -> FetchGate {
        let (tx, rx) = oneshot::channel();
        *self.fetch_gate.lock() = Some(rx);
        FetchGate { tx: Some(tx) }
    }

    /// Queue the events the provider's own operations fire instead of
    /// delivering them. Its current session still changes immediately.
    pub fn hold_events(&self) {
        let mut held = self.held_events.lock();
        if held.is_none() {
            *held = Some(Vec::new());
        }
    }

    /// Deliver queued events in order and stop holding.
    pub fn release_events(&self) {
        let queued = self.held_events.lock().take().unwrap_or_default();
        for change in queued {
            self.deliver(change);
        }
    }

    /// Create an account directly, without emitting events.
    pub fn seed_account(&self, email: &str, password: &str) -> IdentityUser {
        let user = new_user(email, serde_json::Value::Null);
        self.accounts.lock().insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Replace the current session and notify listeners, in call order.
    pub fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        *self.current.lock() = session.clone();
        self.deliver(AuthChange::new(kind, session));
    }

    /// A fresh session for an existing account, without emitting events.
    pub fn mint_session(&self, email: &str) -> Option<Session> {
        let accounts = self.accounts.lock();
        accounts.get(email).map(|a| new_session(a.user.clone()))
    }

    // ====================================================================
    // Inspection
    // ====================================================================

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.lock().contains_key(email)
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        self.accounts.lock().get(email).map(|a| a.password.clone())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.current.lock().clone()
    }

    /// True while a held fetch is parked on its gate.
    pub fn fetch_waiting(&self) -> bool {
        self.fetch_waiting.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// `(email, redirect_to)` of every reset email sent.
    pub fn reset_requests(&self) -> Vec<(String, String)> {
        self.reset_requests.lock().clone()
    }

    pub fn sign_up_requests(&self) -> Vec<SignUpRequest> {
        self.sign_ups.lock().clone()
    }

    /// Session change caused by a provider operation; respects `hold_events`.
    fn publish(&self, kind: AuthEventKind, session: Option<Session>) {
        *self.current.lock() = session.clone();
        let change = AuthChange::new(kind, session);
        if let Some(queue) = self.held_events.lock().as_mut() {
            queue.push(change);
            return;
        }
        self.deliver(change);
    }

    fn deliver(&self, change: AuthChange) {
        let listeners: Vec<SessionListener> =
            self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(change.clone());
        }
    }

    fn check(&self, op: ProviderOp) -> Result<(), ProviderError> {
        match self.failures.lock().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryProvider {
    async fn get_current_session(&self) -> Result<Option<Session>, ProviderError> {
        self.check(ProviderOp::GetSession)?;
        let snapshot = self.current.lock().clone();
        let gate = self.fetch_gate.lock().take();
        if let Some(gate) = gate {
            self.fetch_waiting.store(true, Ordering::SeqCst);
            let _ = gate.await;
            self.fetch_waiting.store(false, Ordering::SeqCst);
        }
        Ok(snapshot)
    }

    fn on_session_change(&self, listener: SessionListener) -> Result<ListenerId, ProviderError> {
        self.check(ProviderOp::Subscribe)?;
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<AuthSession, ProviderError> {
        self.check(ProviderOp::SignUp)?;
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(ProviderError::weak_password(MIN_PASSWORD_LEN));
        }
        let user = {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(&request.email) {
                return Err(ProviderError::user_exists());
            }
            let metadata = serde_json::to_value(&request.data)
                .map_err(|e| ProviderError::internal(e.to_string()))?;
            let user = new_user(&request.email, metadata);
            accounts.insert(
                request.email.clone(),
                Account {
                    user: user.clone(),
                    password: request.password.clone(),
                },
            );
            user
        };
        self.sign_ups.lock().push(request);

        let session = new_session(user.clone());
        self.publish(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(AuthSession {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        self.check(ProviderOp::SignIn)?;
        let user = {
            let accounts = self.accounts.lock();
            match accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(ProviderError::invalid_credentials()),
            }
        };

        let session = new_session(user.clone());
        self.publish(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(AuthSession {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.check(ProviderOp::SignOut)?;
        self.publish(AuthEventKind::SignedOut, None);
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), ProviderError> {
        self.check(ProviderOp::ResetPassword)?;
        // Unknown addresses succeed too, so accounts cannot be enumerated.
        self.reset_requests
            .lock()
            .push((email.to_string(), redirect_to.to_string()));
        Ok(())
    }

    async fn update_credential(&self, new_password: &str) -> Result<IdentityUser, ProviderError> {
        self.check(ProviderOp::UpdateCredential)?;
        let session = self.current.lock().clone().ok_or_else(ProviderError::no_session)?;
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(ProviderError::weak_password(MIN_PASSWORD_LEN));
        }
        {
            let mut accounts = self.accounts.lock();
            if let Some(account) = accounts.values_mut().find(|a| a.user.id == session.user.id) {
                account.password = new_password.to_string();
            }
        }
        self.publish(AuthEventKind::UserUpdated, Some(session.clone()));
        Ok(session.user)
    }
}

fn new_user(email: &str, user_metadata: serde_json::Value) -> IdentityUser {
    IdentityUser {
        id: uuid::Uuid::new_v4().to_string(),
        email: Some(email.to_string()),
        user_metadata,
        created_at: campus_diag::now_iso8601(),
    }
}

fn new_session(user: IdentityUser) -> Session {
    Session {
        access_token: uuid::Uuid::new_v4().to_string().replace('-', ""),
        refresh_token: Some(uuid::Uuid::new_v4().to_string().replace('-', "")),
        expires_at: chrono::Utc::now().timestamp() + SESSION_TTL_SECS,
        user,
    }
}

// ── Profile store ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryProfileStore {
    records: Mutex<HashMap<String, ProfileRecord>>,
    failure: Mutex<Option<ProfileError>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert fail with `error` until cleared.
    pub fn fail_with(&self, error: ProfileError) {
        *self.failure.lock() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    pub fn get(&self, id: &str) -> Option<ProfileRecord> {
        self.records.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn insert_profile(&self, record: &ProfileRecord) -> Result<(), ProfileError> {
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        let mut records = self.records.lock();
        if records.contains_key(&record.id) {
            return Err(ProfileError::Duplicate(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileFields;
    use std::sync::Arc;

    fn sign_up_request(email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.into(),
            password: password.into(),
            email_redirect_to: "http://localhost:8080/".into(),
            data: ProfileFields::new("ana"),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let provider = MemoryProvider::new();
        let created = provider.sign_up(sign_up_request("ana@uni.edu", "secret1")).await.unwrap();
        assert!(provider.has_account("ana@uni.edu"));
        assert_eq!(created.user.unwrap().user_metadata["username"], "ana");

        let signed_in = provider.sign_in_with_password("ana@uni.edu", "secret1").await.unwrap();
        assert!(signed_in.session.is_some());
        assert!(provider.current_session().is_some());
    }

    #[tokio::test]
    async fn duplicate_sign_up_rejected() {
        let provider = MemoryProvider::new();
        provider.seed_account("ana@uni.edu", "secret1");
        let err = provider.sign_up(sign_up_request("ana@uni.edu", "secret1")).await.unwrap_err();
        assert_eq!(err.code(), crate::error_code::USER_EXISTS);
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let provider = MemoryProvider::new();
        provider.seed_account("ana@uni.edu", "secret1");
        let err = provider.sign_in_with_password("ana@uni.edu", "nope").await.unwrap_err();
        assert_eq!(err.code(), crate::error_code::INVALID_CREDENTIALS);
        assert!(provider.current_session().is_none());
    }

    #[tokio::test]
    async fn events_reach_listeners_in_order() {
        let provider = MemoryProvider::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        provider
            .on_session_change(Arc::new(move |change: AuthChange| s.lock().push(change.kind)))
            .unwrap();

        provider.seed_account("ana@uni.edu", "secret1");
        provider.sign_in_with_password("ana@uni.edu", "secret1").await.unwrap();
        provider.sign_out().await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![AuthEventKind::SignedIn, AuthEventKind::SignedOut]
        );
    }

    #[tokio::test]
    async fn removed_listener_is_not_called() {
        let provider = MemoryProvider::new();
        let id = provider.on_session_change(Arc::new(|_: AuthChange| panic!("called"))).unwrap();
        provider.remove_listener(id);
        provider.sign_out().await.unwrap();
        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn held_fetch_returns_snapshot_from_call_time() {
        let provider = Arc::new(MemoryProvider::new());
        provider.seed_account("ana@uni.edu", "secret1");
        let gate = provider.hold_initial_fetch();

        let fetch = tokio::spawn({
            let provider = provider.clone();
            async move { provider.get_current_session().await }
        });
        while !provider.fetch_waiting() {
            tokio::task::yield_now().await;
        }

        let fresh = provider.mint_session("ana@uni.edu");
        provider.emit(AuthEventKind::SignedIn, fresh);
        gate.release();

        assert!(fetch.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn held_events_are_delivered_on_release() {
        let provider = MemoryProvider::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        provider
            .on_session_change(Arc::new(move |change: AuthChange| s.lock().push(change.kind)))
            .unwrap();
        provider.seed_account("ana@uni.edu", "secret1");

        provider.hold_events();
        provider.sign_in_with_password("ana@uni.edu", "secret1").await.unwrap();
        provider.sign_out().await.unwrap();
        assert!(seen.lock().is_empty());
        assert!(provider.current_session().is_none());

        provider.release_events();
        assert_eq!(
            *seen.lock(),
            vec![AuthEventKind::SignedIn, AuthEventKind::SignedOut]
        );

        // No longer holding.
        provider.sign_in_with_password("ana@uni.edu", "secret1").await.unwrap();
        assert_eq!(seen.lock().len(), 3);
    }

    #[tokio::test]
    async fn update_credential_requires_session() {
        let provider = MemoryProvider::new();
        let err = provider.update_credential("another1").await.unwrap_err();
        assert_eq!(err.code(), crate::error_code::NO_SESSION);

        provider.seed_account("ana@uni.edu", "secret1");
        provider.sign_in_with_password("ana@uni.edu", "secret1").await.unwrap();
        provider.update_credential("another1").await.unwrap();
        assert_eq!(provider.password_of("ana@uni.edu").as_deref(), Some("another1"));
    }

    #[tokio::test]
    async fn scripted_failure() {
        let provider = MemoryProvider::new();
        provider.fail(ProviderOp::SignOut, ProviderError::network("offline"));
        assert_eq!(provider.sign_out().await.unwrap_err().message(), "offline");

        provider.clear_failure(ProviderOp::SignOut);
        assert!(provider.sign_out().await.is_ok());
    }

    #[tokio::test]
    async fn profile_store_rejects_duplicates() {
        let store = MemoryProfileStore::new();
        let record = ProfileRecord::new("u1", ProfileFields::new("ana"));
        store.insert_profile(&record).await.unwrap();
        assert!(matches!(
            store.insert_profile(&record).await,
            Err(ProfileError::Duplicate(id)) if id == "u1"
        ));
        assert_eq!(store.len(), 1);
    }
}
