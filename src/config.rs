// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/qrscan/config.json`. A missing file
//! means defaults; command-line flags are applied on top by the caller.

use crate::backends::camera::CameraBackendType;
use crate::constants::{config_file, detection, service};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Where the bearer token comes from
///
/// Serialized as `{"env": "VAR"}`, `{"file": "/path"}` or `{"value": "..."}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    /// Read from an environment variable
    Env(String),
    /// Read from a file (surrounding whitespace trimmed)
    File(PathBuf),
    /// Inline secret
    Value(String),
}

impl Default for TokenSource {
    fn default() -> Self {
        TokenSource::Env(service::TOKEN_ENV.to_string())
    }
}

impl TokenSource {
    /// Resolve the secret
    pub fn resolve(&self) -> Result<String, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve with a custom environment lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = match self {
            TokenSource::Env(name) => lookup(name).ok_or_else(|| {
                ConfigError::MissingToken(format!("environment variable {} is not set", name))
            })?,
            TokenSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                ConfigError::MissingToken(format!("cannot read {}: {}", path.display(), e))
            })?,
            TokenSource::Value(value) => value.clone(),
        };

        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(ConfigError::MissingToken(format!("{:?} is empty", self)));
        }
        Ok(token)
    }
}

// Never print inline secrets
impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Env(name) => write!(f, "env:{}", name),
            TokenSource::File(path) => write!(f, "file:{}", path.display()),
            TokenSource::Value(_) => write!(f, "value:<redacted>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decode service URL
    pub endpoint: String,
    /// Bearer token reference
    pub token: TokenSource,
    /// HTTP request timeout
    pub request_timeout_secs: u64,
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Directory (or file) replayed by the image backend
    pub image_dir: Option<PathBuf>,
    /// Device id or label fragment to select by default
    pub preferred_device: Option<String>,
    /// Detector downscale bound
    pub max_dimension: u32,
    /// Give up on a one-shot scan after this many seconds
    pub scan_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: service::DEFAULT_ENDPOINT.to_string(),
            token: TokenSource::default(),
            request_timeout_secs: service::DEFAULT_TIMEOUT_SECS,
            backend: CameraBackendType::default(),
            image_dir: None,
            preferred_device: None,
            max_dimension: detection::DEFAULT_MAX_DIMENSION,
            scan_timeout_secs: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(config_file::APP_DIR).join(config_file::FILE_NAME))
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Read(format!("{}: {}", path.display(), e))),
        };

        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(service::ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(endpoint = %endpoint, "Endpoint overridden from environment");
            self.endpoint = endpoint.trim().to_string();
        }
    }

    /// Check values that would only fail later at request time
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::InvalidEndpoint(format!(
                "{:?} is not an http(s) URL",
                self.endpoint
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_secs.map(Duration::from_secs)
    }
}
