//! Service layer around the upstream web chat
//!
//! - [`session`]: shared upstream credentials
//! - [`automation`]: browser-driven reauthentication
//! - [`upstream`]: HTTP client for the chat endpoint
//! - [`streaming`]: SSE parsing, chunk assembly and the streaming driver

pub mod automation;
pub mod session;
pub mod streaming;
pub mod upstream;

use std::{sync::Arc, time::Duration};

use tracing::warn;

use crate::{config::Config, error::Result};

use self::{
    automation::{CommandReauthenticator, DisabledReauthenticator, ReauthGate, Reauthenticator},
    session::SessionStore,
    streaming::StreamingDriver,
    upstream::UpstreamClient,
};

/// Reauthenticator described by `config`
#[must_use]
pub fn reauthenticator_from_config(config: &Config) -> Arc<dyn Reauthenticator> {
    match CommandReauthenticator::from_config(&config.automation) {
        Some(command) => Arc::new(command),
        None => {
            warn!("No browser automation configured; expired sessions cannot be renewed");
            Arc::new(DisabledReauthenticator)
        }
    }
}

/// Wire the driver and its collaborators around `store`
///
/// # Errors
///
/// Returns an error if the upstream client cannot be built
pub fn build_driver(
    config: &Config,
    store: Arc<SessionStore>,
    reauthenticator: Arc<dyn Reauthenticator>,
) -> Result<StreamingDriver> {
    let upstream = UpstreamClient::new(&config.upstream)?;
    let gate = ReauthGate::new(
        reauthenticator,
        Duration::from_secs(config.automation.timeout_secs),
    );

    Ok(StreamingDriver::new(
        upstream,
        store,
        Arc::new(gate),
        config.upstream.default_model.clone(),
        config.ids,
    ))
}
