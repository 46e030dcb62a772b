//! deepseek-proxy: OpenAI-compatible streaming API for the deepseekv3.com web chat
//!
//! The upstream only exposes a browser page. This crate replays its chat endpoint,
//! converts the upstream SSE stream into `chat.completion.chunk` events, and renews the
//! browser session through an external automation helper when the upstream answers 403.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

pub mod cli;
pub mod config;
pub mod error;
pub mod messages;
pub mod server;
pub mod services;

// Re-exports for convenience
pub use error::{ProxyError, Result};
