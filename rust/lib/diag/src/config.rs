use serde::{Deserialize, Serialize};

use crate::entry::Severity;
use crate::error::ConfigError;

/// Build mode. Decides console mirroring and remote forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    /// Parse `"development"` / `"production"` (case-insensitive).
    pub fn from_env_str(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }

    /// Whether an entry of this severity is echoed to the developer console.
    ///
    /// WARN and ERROR always are; DEBUG and INFO only in development.
    pub fn mirrors(&self, level: Severity) -> bool {
        match self {
            Mode::Development => true,
            Mode::Production => level >= Severity::Warn,
        }
    }

    /// Whether entries are forwarded to the remote sink.
    pub fn forwards(&self) -> bool {
        matches!(self, Mode::Production)
    }
}

/// Diagnostics configuration.
///
/// Every field has a default, so an empty `[diag]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagConfig {
    pub mode: Mode,

    /// Log ring buffer capacity.
    pub capacity: usize,

    /// Remote sink path or absolute URL.
    pub sink_url: String,

    /// Origin used to resolve a relative `sink_url`. Without one, a relative
    /// sink cannot be reached and forwarding is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Whether the diagnostic trail is registered for crash reporting.
    pub trail_enabled: bool,

    /// Diagnostic trail capacity.
    pub trail_capacity: usize,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            capacity: 100,
            sink_url: "/api/logs".to_string(),
            base_url: None,
            trail_enabled: true,
            trail_capacity: 100,
        }
    }
}

impl DiagConfig {
    /// Resolve the absolute sink URL, if one can be built.
    pub fn resolve_sink_url(&self) -> Option<String> {
        let sink = self.sink_url.trim();
        if sink.is_empty() {
            return None;
        }
        if sink.starts_with("http://") || sink.starts_with("https://") {
            return Some(sink.to_string());
        }
        let base = self.base_url.as_deref()?.trim_end_matches('/');
        Some(format!("{}/{}", base, sink.trim_start_matches('/')))
    }
}
