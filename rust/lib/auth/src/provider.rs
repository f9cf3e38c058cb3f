//! Identity provider boundary.
//!
//! The provider issues, refreshes and revokes sessions, and pushes a
//! [`AuthChange`] to every registered listener whenever its session changes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::profile::ProfileFields;

/// The authenticated principal, as recorded by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-form metadata attached at sign-up.
    #[serde(default)]
    pub user_metadata: Value,
    pub created_at: String,
}

/// A provider-issued session: tokens, validity window and the user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    pub expires_at: i64,
    pub user: IdentityUser,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        now_secs >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

/// Why the provider's session changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// A state-change notification: the event kind plus the provider's new
/// session (`None` once signed out or expired).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

pub type SessionListener = Arc<dyn Fn(AuthChange) + Send + Sync>;

/// Handle returned by [`IdentityProvider::on_session_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Account creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Where the confirmation email sends the user back to.
    pub email_redirect_to: String,
    /// Stored as the user's metadata.
    pub data: ProfileFields,
}

/// What sign-up and sign-in return. Sign-up may yield a user without a
/// session when the provider requires email confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: Option<IdentityUser>,
    pub session: Option<Session>,
}

/// Identity provider operations consumed by the synchronizer.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// The provider's current session, if any.
    async fn get_current_session(&self) -> Result<Option<Session>, ProviderError>;

    /// Register a listener for session changes. Events are delivered in
    /// emission order.
    fn on_session_change(&self, listener: SessionListener) -> Result<ListenerId, ProviderError>;

    /// Unregister a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    async fn sign_up(&self, request: SignUpRequest) -> Result<AuthSession, ProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    async fn send_password_reset_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), ProviderError>;

    /// Change the password of the current session's user.
    async fn update_credential(&self, new_password: &str) -> Result<IdentityUser, ProviderError>;
}
