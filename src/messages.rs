//! Request types for chat completions
//!
//! Clients send an OpenAI chat-completion request; the upstream only accepts the
//! conversation plus its anti-bot token.

use serde::{Deserialize, Serialize};

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in the conversation
///
/// `content` is kept as raw JSON so text and multi-part content pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl ChatMessage {
    /// Create a new user message
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: serde_json::Value::String(text.into()),
        }
    }
}

/// Inbound OpenAI-style request; fields other than `messages` are accepted and ignored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Body POSTed to the upstream chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    pub messages: Vec<ChatMessage>,

    #[serde(rename = "turnstileToken", default)]
    pub turnstile_token: String,
}

impl From<ChatCompletionRequest> for UpstreamRequest {
    fn from(request: ChatCompletionRequest) -> Self {
        Self {
            messages: request.messages,
            turnstile_token: String::new(),
        }
    }
}
