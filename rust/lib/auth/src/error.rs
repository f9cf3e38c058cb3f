use thiserror::Error;

use campus_diag::Fault;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable identifiers for provider failures. Match on these, never on the
// human-readable message.

pub mod error_code {
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const USER_EXISTS: &str = "user_exists";
    pub const WEAK_PASSWORD: &str = "weak_password";
    pub const NO_SESSION: &str = "no_session";
    pub const NETWORK: &str = "network";
    pub const INTERNAL: &str = "internal";
}

// ── ProviderError ───────────────────────────────────────────────────

/// A fault reported by the identity provider. Always carries a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    code: &'static str,
    message: String,
}

impl ProviderError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::new(error_code::INVALID_CREDENTIALS, "Invalid login credentials")
    }

    pub fn user_exists() -> Self {
        Self::new(error_code::USER_EXISTS, "User already registered")
    }

    pub fn weak_password(min_len: usize) -> Self {
        Self::new(
            error_code::WEAK_PASSWORD,
            format!("Password should be at least {} characters", min_len),
        )
    }

    pub fn no_session() -> Self {
        Self::new(error_code::NO_SESSION, "Auth session missing")
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(error_code::NETWORK, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(error_code::INTERNAL, message)
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// ── ProfileError ────────────────────────────────────────────────────

/// A fault from the profile store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// A profile for this identity already exists.
    #[error("duplicate key value violates unique constraint \"profiles_pkey\" ({0})")]
    Duplicate(String),

    /// The store refused the write.
    #[error("{0}")]
    Rejected(String),

    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

// ── AuthError ───────────────────────────────────────────────────────

/// Error half of an [`OpResult`](crate::OpResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The account was created but its dependent profile write failed.
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl AuthError {
    /// Structured form for the log store, with the cause chain as stack.
    pub fn to_fault(&self) -> Fault {
        Fault::from_error(self)
    }

    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self {
            AuthError::Provider(e) => Some(e),
            AuthError::Profile(_) => None,
        }
    }

    pub fn as_profile(&self) -> Option<&ProfileError> {
        match self {
            AuthError::Profile(e) => Some(e),
            AuthError::Provider(_) => None,
        }
    }
}
