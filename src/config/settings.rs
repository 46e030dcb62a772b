//! Configuration sections

use serde::{Deserialize, Serialize};

/// Address the HTTP front door listens on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upstream chat endpoint and the fixed header set sent to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Model name reported in every chunk
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_encoding")]
    pub accept_encoding: String,
}

fn default_target_url() -> String {
    "https://www.deepseekv3.com/api/chat".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_encoding() -> String {
    "gzip, deflate, br, zstd".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            default_model: default_model(),
            user_agent: default_user_agent(),
            accept_encoding: default_accept_encoding(),
        }
    }
}

/// Browser automation helper used for reauthentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Program to run; reauthentication is disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Upper bound for one login run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 5000);

        let upstream = UpstreamConfig::default();
        assert_eq!(upstream.target_url, "https://www.deepseekv3.com/api/chat");
        assert_eq!(upstream.default_model, "deepseek-chat");

        let automation = AutomationConfig::default();
        assert!(automation.command.is_none());
        assert_eq!(automation.timeout_secs, 300);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let server: ServerConfig = serde_json::from_str(r#"{"port": 8080}"#).unwrap();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 8080);

        let automation: AutomationConfig =
            serde_json::from_str(r#"{"command": "node", "args": ["login.js"]}"#).unwrap();
        assert_eq!(automation.command.as_deref(), Some("node"));
        assert_eq!(automation.timeout_secs, 300);
    }
}
