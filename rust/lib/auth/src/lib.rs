//! Campus auth — keeps local session state in step with the identity provider.
//!
//! The identity provider owns sessions. This crate only caches the latest one
//! it has observed and exposes it as an observable [`AuthState`]:
//!
//! ```text
//! provider events ──► SessionSynchronizer ──► StateCell<AuthState> ──► UI
//!                         │
//! user actions ──────────►├──► provider / profile store calls
//!                         ├──► Notifier   (one toast per action)
//!                         └──► LogStore   (structured log lines)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let sync = SessionSynchronizer::new(provider, profiles, notifier, log, AuthConfig::default());
//! sync.start().await;
//! let result = sync.sign_in("ana@uni.edu", "secret").await;
//! if result.is_ok() { /* navigate */ }
//! sync.stop();
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod messages;
pub mod outcome;
pub mod profile;
pub mod provider;
pub mod state;
pub mod sync;

pub use config::AuthConfig;
pub use error::{error_code, AuthError, ProfileError, ProviderError};
pub use memory::{FetchGate, MemoryProfileStore, MemoryProvider, ProviderOp};
pub use outcome::OpResult;
pub use profile::{ProfileFields, ProfileRecord, ProfileStore};
pub use provider::{
    AuthChange, AuthEventKind, AuthSession, IdentityProvider, IdentityUser, ListenerId,
    Session, SessionListener, SignUpRequest,
};
pub use state::AuthState;
pub use sync::SessionSynchronizer;
