//! Configuration management.
//!
//! Configuration lives in `./config/adgm-register.toml`; `--init` writes the
//! built-in template there. When the default path is absent the template
//! itself is used, so the tool runs out of the box. The `NTFY_URL`
//! environment variable overrides the notification URL from the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs, io};
use thiserror::Error;

/// Configuration file path relative to the working directory.
pub const CONFIG_PATH: &str = "./config/adgm-register.toml";

/// Default configuration content; the only place defaults exist.
pub const DEFAULT_CONFIG: &str = include_str!("../config/adgm-register.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration field '{field}' cannot be empty")]
    EmptyRequired { field: &'static str },

    #[error("'{field}' must be an http(s) URL, got: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub register: RegisterConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Public register endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConfig {
    /// Base URL; the company slug is appended as the final path segment.
    pub base_url: String,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub request_timeout_secs: u64,
    /// Total attempts per request on transient server errors (minimum 1).
    pub max_attempts: u32,
    /// Backoff grows as backoff_factor * 2^(attempt - 1) seconds.
    pub backoff_factor: f64,
}

/// Notification sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    /// ntfy topic URL; empty or absent means console fallback.
    #[serde(default)]
    pub ntfy_url: Option<String>,
}

impl AppConfig {
    /// Load from an explicit path (which must exist), or from `CONFIG_PATH`,
    /// falling back to the built-in template when the default path is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let content = match path {
            Some(p) => fs::read_to_string(p).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ConfigError::FileNotFound(p.to_path_buf()),
                _ => ConfigError::Io(e),
            })?,
            None => match fs::read_to_string(CONFIG_PATH) {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => DEFAULT_CONFIG.to_string(),
                Err(e) => return Err(ConfigError::Io(e)),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse, apply environment overrides, validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(content)?;

        if let Ok(url) = env::var("NTFY_URL") {
            if !url.trim().is_empty() {
                config.notify.ntfy_url = Some(url);
            }
        }
        // An empty string in the file means "unconfigured".
        if config
            .notify
            .ntfy_url
            .as_deref()
            .is_some_and(|u| u.trim().is_empty())
        {
            config.notify.ntfy_url = None;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.register.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "register.base_url",
            });
        }
        if !self.register.base_url.starts_with("http://")
            && !self.register.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidUrl {
                field: "register.base_url",
                value: self.register.base_url.clone(),
            });
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent",
            });
        }
        Ok(())
    }

    /// Write the default template to `CONFIG_PATH` (for `--init`).
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = PathBuf::from(CONFIG_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, DEFAULT_CONFIG)?;
        Ok(path)
    }
}
