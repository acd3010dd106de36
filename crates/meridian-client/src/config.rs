//! # Backend Configuration
//!
//! Where the sales backend lives and how the register talks to it.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults                                                            │
//! │  2. register.toml (explicit path, or the platform config dir)           │
//! │  3. MERIDIAN_* environment variables                                    │
//! │  4. validate()                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example `register.toml`
//! ```toml
//! base_url = "https://pos.example.com/api"
//! api_token = "secret"
//! store_id = "store-1"
//! timeout_secs = 15
//! reference_ttl_secs = 300
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "register.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Root of the REST API, e.g. `https://pos.example.com/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent on every request.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Store the register sells from. Can also be picked at runtime.
    #[serde(default)]
    pub store_id: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long fetched reference data is trusted before a refresh.
    #[serde(default = "default_reference_ttl_secs")]
    pub reference_ttl_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_reference_ttl_secs() -> u64 {
    300
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: default_base_url(),
            api_token: None,
            store_id: None,
            timeout_secs: default_timeout_secs(),
            reference_ttl_secs: default_reference_ttl_secs(),
        }
    }
}

impl BackendConfig {
    /// Loads configuration from file and environment, then validates it.
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading backend config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Checks the URL scheme, timeout and store id.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "Backend URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(store_id) = &self.store_id {
            if store_id.trim().is_empty() {
                return Err(ClientError::InvalidConfig("store_id must not be blank".into()));
            }
        }

        Ok(())
    }

    /// Applies `MERIDIAN_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MERIDIAN_API_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.base_url = url;
        }

        if let Some(token) = lookup("MERIDIAN_API_TOKEN") {
            self.api_token = Some(token);
        }

        if let Some(id) = lookup("MERIDIAN_STORE_ID") {
            self.store_id = Some(id);
        }

        if let Some(secs) = lookup("MERIDIAN_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid MERIDIAN_TIMEOUT_SECS"),
            }
        }

        if let Some(secs) = lookup("MERIDIAN_REFERENCE_TTL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.reference_ttl_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid MERIDIAN_REFERENCE_TTL_SECS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "meridian", "register")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn reference_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.reference_ttl_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = BackendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_validation() {
        let mut config = BackendConfig::default();

        config.base_url = "ftp://files.example.com".into();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.base_url = "https://pos.example.com/api".into();
        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MERIDIAN_API_URL", "https://pos.example.com/api"),
            ("MERIDIAN_API_TOKEN", "t0ken"),
            ("MERIDIAN_STORE_ID", "store-9"),
            ("MERIDIAN_TIMEOUT_SECS", "not-a-number"),
            ("MERIDIAN_REFERENCE_TTL_SECS", "60"),
        ]
        .into_iter()
        .collect();

        let mut config = BackendConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url, "https://pos.example.com/api");
        assert_eq!(config.api_token.as_deref(), Some("t0ken"));
        assert_eq!(config.store_id.as_deref(), Some("store-9"));
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.reference_ttl_secs, 60);
    }

    #[test]
    fn test_toml_with_missing_fields_uses_defaults() {
        let config: BackendConfig = toml::from_str(r#"store_id = "store-1""#).unwrap();
        assert_eq!(config.store_id.as_deref(), Some("store-1"));
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.reference_ttl_secs, 300);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let path = std::env::temp_dir().join(format!("meridian-{}.toml", std::process::id()));
        std::fs::write(&path, "base_url = \"http://127.0.0.1:9000\"\ntimeout_secs = 3\n").unwrap();

        let config = BackendConfig::load(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = config.unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout_secs, 3);
    }
}
