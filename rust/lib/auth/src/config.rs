use serde::{Deserialize, Serialize};

/// Auth configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Public origin of the web app, e.g. `https://campus.example`.
    pub site_origin: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            site_origin: "http://localhost:8080".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn new(site_origin: impl Into<String>) -> Self {
        Self {
            site_origin: site_origin.into(),
        }
    }

    fn origin(&self) -> &str {
        self.site_origin.trim_end_matches('/')
    }

    /// Landing page after confirming the sign-up email.
    pub fn sign_up_redirect(&self) -> String {
        format!("{}/", self.origin())
    }

    /// Page that completes a password reset.
    pub fn reset_redirect(&self) -> String {
        format!("{}/reset-password", self.origin())
    }
}
