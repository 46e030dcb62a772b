//! Error types for deepseek-proxy
//!
//! [`ProxyError`] is the crate-wide error. The narrower enums describe failures that
//! the streaming driver recovers from locally (a skipped line or chunk) or that come
//! from the reauthentication collaborator.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`ProxyError`]
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Main error type for deepseek-proxy
#[derive(Debug, Error)]
pub enum ProxyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),

    /// HTTP client error before the upstream stream was opened
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream rejected the session (HTTP 403) and the retry budget is spent
    #[error("Upstream rejected the session after reauthentication")]
    Authentication,

    /// Reauthentication collaborator failed
    #[error(transparent)]
    Automation(#[from] AutomationError),

    /// Chunk could not be assembled
    #[error(transparent)]
    Chunk(#[from] ChunkCreationError),

    /// Upstream answered with an unexpected status
    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Upstream connection dropped or could not be read mid-stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid client input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl From<String> for ProxyError {
    fn from(s: String) -> Self {
        ProxyError::Other(s)
    }
}

impl From<&str> for ProxyError {
    fn from(s: &str) -> Self {
        ProxyError::Other(s.to_string())
    }
}

/// Malformed upstream SSE line
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line bytes are not text
    #[error("invalid input type: {0}")]
    InvalidInput(String),

    /// `data:` payload is not a JSON object
    #[error("invalid json: {0}")]
    InvalidJson(String),
}

/// Invalid [`ChoiceSpec`](crate::services::streaming::ChoiceSpec)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChoiceCreationError {
    #[error("Index must be a non-negative integer")]
    InvalidIndex,

    #[error("Finish reason must be absent or a non-empty string")]
    InvalidFinishReason,
}

/// Invalid [`ChunkSpec`](crate::services::streaming::ChunkSpec)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkCreationError {
    #[error("Invalid model name")]
    InvalidModelName,

    #[error("Invalid chunk index")]
    InvalidIndex,

    #[error("Invalid system fingerprint")]
    InvalidSystemFingerprint,

    #[error("Invalid conversation ID")]
    InvalidConversationId,

    #[error("Failed to create choice")]
    Choice(#[source] ChoiceCreationError),
}

impl From<ChoiceCreationError> for ChunkCreationError {
    fn from(e: ChoiceCreationError) -> Self {
        ChunkCreationError::Choice(e)
    }
}

/// Browser automation (reauthentication) failure
#[derive(Debug, Error)]
pub enum AutomationError {
    /// Helper program could not be started
    #[error("Failed to launch browser automation `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Helper exited unsuccessfully
    #[error("Browser automation exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// Helper did not finish in time
    #[error("Browser automation timed out after {0}s")]
    Timeout(u64),

    /// Helper printed something other than a session document
    #[error("Browser automation produced invalid session output: {0}")]
    InvalidOutput(String),

    /// No automation command configured
    #[error("Browser automation is not configured")]
    NotConfigured,
}
