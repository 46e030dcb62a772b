//! Reauthentication through browser automation
//!
//! Logging in and passing the upstream's human verification happens in a real browser,
//! driven by an external helper program. The helper prints the resulting session as
//! JSON on stdout:
//!
//! ```json
//! {"cookies": [{"name": "sid", "value": "...", "domain": ".deepseekv3.com", "path": "/"}],
//!  "storage": {"tokenExpiry": "...", "chatMessages": "[]", "turnstileToken": "..."}}
//! ```

use std::{process::Stdio, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{process::Command, sync::Mutex};
use tracing::{debug, info, warn};

use crate::{
    config::AutomationConfig,
    error::AutomationError,
    services::session::{SessionState, SessionStore},
};

/// Produces fresh upstream credentials and publishes them to the store
#[async_trait]
pub trait Reauthenticator: Send + Sync {
    /// Run the login flow; on success `store` holds the new session.
    async fn reauthenticate(&self, store: &SessionStore) -> Result<(), AutomationError>;
}

/// Runs the configured browser helper program
#[derive(Debug, Clone)]
pub struct CommandReauthenticator {
    program: String,
    args: Vec<String>,
}

impl CommandReauthenticator {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from config; `None` when no helper is configured
    #[must_use]
    pub fn from_config(config: &AutomationConfig) -> Option<Self> {
        config
            .command
            .as_ref()
            .filter(|program| !program.trim().is_empty())
            .map(|program| Self::new(program.clone(), config.args.clone()))
    }

    /// Parse the helper's stdout into a session
    fn parse_output(stdout: &[u8]) -> Result<SessionState, AutomationError> {
        let text = std::str::from_utf8(stdout)
            .map_err(|e| AutomationError::InvalidOutput(e.to_string()))?
            .trim();

        if text.is_empty() {
            return Err(AutomationError::InvalidOutput("empty output".to_string()));
        }

        serde_json::from_str(text).map_err(|e| AutomationError::InvalidOutput(e.to_string()))
    }
}

#[async_trait]
impl Reauthenticator for CommandReauthenticator {
    async fn reauthenticate(&self, store: &SessionStore) -> Result<(), AutomationError> {
        info!(program = %self.program, "Launching browser automation");

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| AutomationError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AutomationError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let state = Self::parse_output(&output.stdout)?;
        debug!(
            cookies = state.cookies.len(),
            storage_keys = state.storage.len(),
            "Browser automation produced a session"
        );
        store.replace(state);
        Ok(())
    }
}

/// Stand-in used when no helper program is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledReauthenticator;

#[async_trait]
impl Reauthenticator for DisabledReauthenticator {
    async fn reauthenticate(&self, _store: &SessionStore) -> Result<(), AutomationError> {
        Err(AutomationError::NotConfigured)
    }
}

/// Serializes reauthentication across requests.
///
/// Only one login runs at a time. A caller that waited while another caller refreshed
/// the session reuses the new credentials instead of launching the browser again.
pub struct ReauthGate {
    inner: Arc<dyn Reauthenticator>,
    timeout: Duration,
    in_flight: Mutex<()>,
}

impl ReauthGate {
    #[must_use]
    pub fn new(inner: Arc<dyn Reauthenticator>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            in_flight: Mutex::new(()),
        }
    }

    /// Refresh the session that was read at `seen_generation`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error, or [`AutomationError::Timeout`].
    pub async fn refresh(
        &self,
        store: &SessionStore,
        seen_generation: u64,
    ) -> Result<(), AutomationError> {
        let _guard = self.in_flight.lock().await;

        if store.generation() > seen_generation {
            debug!(
                seen_generation,
                current = store.generation(),
                "Session already refreshed by another request"
            );
            return Ok(());
        }

        match tokio::time::timeout(self.timeout, self.inner.reauthenticate(store)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Browser automation timed out");
                Err(AutomationError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}
