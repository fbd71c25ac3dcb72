//! Configuration for the cardstack client and relay
//!
//! Loaded from `config.toml` in the platform config directory, then
//! overridden from the environment. Missing files mean defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Could not determine {0} directory")]
    NoDirectory(&'static str),

    #[error("{0} is not set")]
    MissingSecret(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Hosted backend project (tables and auth service)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostedConfig {
    pub url: String,
    /// Public anonymous key sent with every request
    pub anon_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub hosted: HostedConfig,
    /// Endpoint of the elaboration relay
    pub relay_url: String,
    /// Where local slots, the demo flag and the auth session live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosted: HostedConfig::default(),
            relay_url: "http://127.0.0.1:8787/elaborate".to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    /// `~/.config/cardstack/config.toml` (or the platform equivalent)
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("cardstack").join("config.toml"))
            .ok_or(ConfigError::NoDirectory("config"))
    }

    /// Load from the default path and the environment
    pub fn load() -> Result<Self> {
        let mut config = Self::from_file(&Self::default_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `CARDSTACK_*` overrides from a variable lookup
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("CARDSTACK_HOSTED_URL") {
            self.hosted.url = url;
        }
        if let Some(key) = var("CARDSTACK_HOSTED_KEY") {
            self.hosted.anon_key = key;
        }
        if let Some(url) = var("CARDSTACK_RELAY_URL") {
            self.relay_url = url;
        }
        if let Some(dir) = var("CARDSTACK_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("cardstack"))
                .ok_or(ConfigError::NoDirectory("data")),
        }
    }
}

/// Relay process settings. The upstream key only ever comes from the environment.
#[derive(Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    pub upstream_url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind", &self.bind)
            .field("upstream_url", &self.upstream_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

pub const DEFAULT_RELAY_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_str = var("CARDSTACK_RELAY_BIND").unwrap_or_else(|| DEFAULT_RELAY_BIND.to_string());
        let bind = bind_str.parse().map_err(|_| ConfigError::InvalidValue {
            key: "CARDSTACK_RELAY_BIND",
            value: bind_str.clone(),
        })?;
        let api_key = var("OPENAI_API_KEY")
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingSecret("OPENAI_API_KEY"))?;

        Ok(Self {
            bind,
            upstream_url: var("CARDSTACK_UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            model: var("CARDSTACK_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        })
    }
}
