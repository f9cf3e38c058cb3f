//! Client configuration.
//!
//! Reads/writes `~/.campus/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use campus_auth::AuthConfig;
use campus_diag::{DiagConfig, Mode};

/// Client configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Log store, remote sink and diagnostic trail.
    pub diag: DiagConfig,

    /// Redirect targets handed to the identity provider.
    pub auth: AuthConfig,
}

impl ClientConfig {
    /// Default config file path: ~/.campus/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply a `CAMPUS_MODE`-style override on top of the file.
    pub fn override_mode(&mut self, raw: Option<&str>) -> anyhow::Result<()> {
        if let Some(raw) = raw {
            self.diag.mode = Mode::from_env_str(raw)?;
        }
        Ok(())
    }
}

/// Return the campus config directory (~/.campus).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".campus")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.diag.capacity, 100);
        assert_eq!(config.diag.mode, Mode::Production);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ClientConfig::default();
        config.diag.mode = Mode::Development;
        config.diag.capacity = 20;
        config.diag.base_url = Some("https://campus.example".into());
        config.auth = AuthConfig::new("https://campus.example");
        config.save(&path).unwrap();

        let back = ClientConfig::load(&path).unwrap();
        assert_eq!(back, config);
        assert_eq!(
            back.diag.resolve_sink_url().as_deref(),
            Some("https://campus.example/api/logs")
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[diag]\nmode = \"development\"\n").unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.diag.mode, Mode::Development);
        assert_eq!(config.diag.sink_url, "/api/logs");
        assert_eq!(config.auth, AuthConfig::default());
    }

    #[test]
    fn mode_override() {
        let mut config = ClientConfig::default();
        config.override_mode(None).unwrap();
        assert_eq!(config.diag.mode, Mode::Production);

        config.override_mode(Some("development")).unwrap();
        assert_eq!(config.diag.mode, Mode::Development);

        assert!(config.override_mode(Some("staging")).is_err());
        assert_eq!(config.diag.mode, Mode::Development);
    }
}
