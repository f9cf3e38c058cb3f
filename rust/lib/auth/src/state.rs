use crate::provider::{IdentityUser, Session};

/// What the UI reads to decide what to show.
///
/// `user` is always derived from `session`; the two never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<IdentityUser>,
    pub session: Option<Session>,
    /// True until the first session observation (fetch or event) resolves.
    pub loading: bool,
    /// True while a password-reset request is in flight.
    pub is_resetting_password: bool,
}

impl AuthState {
    pub fn initial() -> Self {
        Self {
            user: None,
            session: None,
            loading: true,
            is_resetting_password: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Replace the cached session wholesale and resolve loading.
    ///
    /// An already expired session is cached as no session.
    pub(crate) fn observe(&mut self, session: Option<Session>) {
        self.observe_at(session, chrono::Utc::now().timestamp());
    }

    fn observe_at(&mut self, session: Option<Session>, now_secs: i64) {
        let session = session.filter(|s| !s.is_expired_at(now_secs));
        self.user = session.as_ref().map(|s| s.user.clone());
        self.session = session;
        self.loading = false;
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::IdentityUser;

    fn session(expires_at: i64) -> Session {
        Session {
            access_token: "t".into(),
            refresh_token: None,
            expires_at,
            user: IdentityUser {
                id: "u1".into(),
                email: None,
                user_metadata: serde_json::Value::Null,
                created_at: "2026-01-01T00:00:00.000Z".into(),
            },
        }
    }

    #[test]
    fn observe_caches_live_session() {
        let mut state = AuthState::initial();
        state.observe_at(Some(session(2_000)), 1_000);
        assert!(state.is_authenticated());
        assert_eq!(state.user.as_ref().map(|u| u.id.as_str()), Some("u1"));
        assert!(!state.loading);
    }

    #[test]
    fn observe_clears_expired_session() {
        let mut state = AuthState::initial();
        state.observe_at(Some(session(2_000)), 1_000);
        state.observe_at(Some(session(500)), 1_000);
        assert!(state.session.is_none());
        assert!(state.user.is_none());
        assert!(!state.loading);
    }
}
