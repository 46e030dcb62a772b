//! HTTP client for the upstream web-chat endpoint

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Response,
};
use tracing::debug;

use crate::{
    config::UpstreamConfig,
    error::{ProxyError, Result},
    messages::UpstreamRequest,
    services::session::SessionState,
};

/// Opens streaming chat requests against the upstream
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    target_url: String,
}

impl UpstreamClient {
    /// Create a client sending the fixed header set of `config`.
    ///
    /// No request timeout is set: generation can legitimately take minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value is invalid or the client cannot be built
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_str(&config.accept_encoding).map_err(|_| {
                ProxyError::ConfigValidation("Invalid accept-encoding header".to_string())
            })?,
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|_| {
                ProxyError::ConfigValidation("Invalid user-agent header".to_string())
            })?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            target_url: config.target_url.clone(),
        })
    }

    /// POST `body` with the session's cookies and return the unread response.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Transport`] if the upstream cannot be reached
    pub async fn open(&self, body: &UpstreamRequest, session: &SessionState) -> Result<Response> {
        let mut request = self.client.post(&self.target_url).json(body);

        if let Some(cookies) = session.cookie_header() {
            request = request.header(header::COOKIE, cookies);
        }

        debug!(
            url = %self.target_url,
            cookies = session.cookies.len(),
            messages = body.messages.len(),
            "Opening upstream stream"
        );

        request
            .send()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))
    }
}
