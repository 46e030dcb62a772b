//! Configuration management for deepseek-proxy
//!
//! Layered, later layers win:
//! 1. Built-in defaults
//! 2. Config file (`./deepseek-proxy.json`, else the global one)
//! 3. Environment variables (`DEEPSEEKV3_HOST`, `DEEPSEEKV3_PORT`, `DEEPSEEKV3_DEBUG`)
//! 4. CLI parameters

pub mod models;
pub mod settings;

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

pub use self::{
    models::{default_models, ModelEntry, ModelList},
    settings::{AutomationConfig, ServerConfig, UpstreamConfig},
};
use crate::{
    error::{ProxyError, Result},
    services::streaming::IdGenerator,
};

pub const ENV_HOST: &str = "DEEPSEEKV3_HOST";
pub const ENV_PORT: &str = "DEEPSEEKV3_PORT";
pub const ENV_DEBUG: &str = "DEEPSEEKV3_DEBUG";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,

    /// Stream identifier generation
    #[serde(default)]
    pub ids: IdGenerator,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,

    /// Append logs to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            automation: AutomationConfig::default(),
            models: default_models(),
            ids: IdGenerator::default(),
            debug: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Config file to read: `explicit` if given, else the project file when present,
    /// else the global file
    #[must_use]
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| {
            let project = Self::project_config_path();
            if project.exists() {
                project
            } else {
                Self::global_config_path()
            }
        })
    }

    /// Load from `path` (defaults when it does not exist), then apply the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the result is invalid
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_path(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ProxyError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&contents).map_err(|e| ProxyError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// # Errors
    ///
    /// Returns an error if `DEEPSEEKV3_PORT` is not a port number
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|h| !h.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }

        if let Some(port) = lookup(ENV_PORT).filter(|p| !p.trim().is_empty()) {
            self.server.port = port.trim().parse().map_err(|_| {
                ProxyError::ConfigValidation(format!("{ENV_PORT} is not a valid port: {port}"))
            })?;
        }

        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug = parse_flag(&debug);
        }

        Ok(())
    }

    /// Check values that would only fail later at request time
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::ConfigValidation`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.upstream.target_url).map_err(|e| {
            ProxyError::ConfigValidation(format!(
                "upstream.target_url `{}`: {e}",
                self.upstream.target_url
            ))
        })?;

        if self.upstream.default_model.trim().is_empty() {
            return Err(ProxyError::ConfigValidation(
                "upstream.default_model must not be empty".to_string(),
            ));
        }

        if self.automation.timeout_secs == 0 {
            return Err(ProxyError::ConfigValidation(
                "automation.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the configuration directory path
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deepseek-proxy")
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Get the project config file path in the current directory
    #[must_use]
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("deepseek-proxy.json")
    }

    /// `host:port` the server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
