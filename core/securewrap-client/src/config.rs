//! Client-side configuration shared by the issuer and the agent.
//!
//! Loaded from `config.toml` in the platform config directory (or an
//! explicit path), then overridden field by field from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use securewrap_crypto::DeploymentKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};

pub const ENV_AUTHORITY_URL: &str = "SECUREWRAP_AUTHORITY_URL";
pub const ENV_TIMEOUT_SECS: &str = "SECUREWRAP_TIMEOUT_SECS";
pub const ENV_DEPLOYMENT_KEY: &str = "SECUREWRAP_DEPLOYMENT_KEY";

pub const DEFAULT_AUTHORITY_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the Authority, without a trailing path.
    pub authority_url: String,
    /// Per-request timeout for Authority calls.
    pub request_timeout_secs: u64,
    /// Base64 deployment key shared by issuer and agents.
    pub deployment_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            authority_url: DEFAULT_AUTHORITY_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            deployment_key: None,
        }
    }
}

impl ClientConfig {
    /// `<config dir>/securewrap/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("securewrap").join("config.toml"))
    }

    /// Loads the file at `path` (or the default location), then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        if !path.exists() {
            info!("No client config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("read {}: {e}", path.display())))?;
        let config = Self::from_toml(&contents)?;
        debug!("Loaded client config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> ClientResult<Self> {
        toml::from_str(contents).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ClientResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_AUTHORITY_URL).filter(|v| !v.trim().is_empty()) {
            self.authority_url = url.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                ClientError::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {secs:?}"))
            })?;
        }
        if let Some(key) = lookup(ENV_DEPLOYMENT_KEY).filter(|v| !v.trim().is_empty()) {
            self.deployment_key = Some(key);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Decodes the configured deployment key.
    pub fn deployment_key(&self) -> ClientResult<DeploymentKey> {
        let encoded = self
            .deployment_key
            .as_deref()
            .ok_or_else(|| ClientError::Config("no deployment key configured".into()))?;
        DeploymentKey::from_base64(encoded)
            .map_err(|e| ClientError::Config(format!("deployment key: {e}")))
    }
}
