//! Streaming driver
//!
//! Turns one client request into an OpenAI-compatible SSE stream:
//!
//! ```text
//! INIT -> CONNECTING -> STREAMING -> FINALIZING -> DONE
//!             |  ^
//!         403 v  | once
//!            REAUTH
//! ```
//!
//! The returned stream is lazy: nothing is sent upstream until it is first polled, and
//! dropping it closes the upstream connection.

use std::{pin::Pin, sync::Arc};

use futures::{Stream, StreamExt};
use reqwest::{Response, StatusCode};
use tracing::{debug, error, info, warn};

use super::{
    build_chunk, parse_bytes, ChunkSpec, DeltaContent, IdGenerator, LineDecoder, SseEvent,
    StreamIds,
};
use crate::{
    error::{ProxyError, Result},
    messages::UpstreamRequest,
    services::{automation::ReauthGate, session::SessionStore, upstream::UpstreamClient},
};

/// Literal terminator of a successful stream
pub const DONE_EVENT: &str = "data: [DONE]\n\n";

/// Finish reason of the terminal chunk
pub const FINISH_REASON_STOP: &str = "stop";

/// Serialized SSE events (`data: ...\n\n`); an `Err` item ends the stream without `[DONE]`
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Drives upstream requests and reauthentication for every client request
#[derive(Clone)]
pub struct StreamingDriver {
    upstream: UpstreamClient,
    store: Arc<SessionStore>,
    reauth: Arc<ReauthGate>,
    model: String,
    ids: IdGenerator,
}

impl StreamingDriver {
    #[must_use]
    pub fn new(
        upstream: UpstreamClient,
        store: Arc<SessionStore>,
        reauth: Arc<ReauthGate>,
        model: impl Into<String>,
        ids: IdGenerator,
    ) -> Self {
        Self {
            upstream,
            store,
            reauth,
            model: model.into(),
            ids,
        }
    }

    /// Session store shared with the reauthentication collaborator
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Model name reported in chunks
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Stream the completion for `request`.
    ///
    /// Content chunks are numbered from 0 in upstream order, followed by one
    /// `finish_reason: "stop"` chunk and [`DONE_EVENT`]. Fatal failures are yielded as a
    /// single `Err` and end the stream.
    #[must_use]
    pub fn run(&self, request: UpstreamRequest) -> ChunkStream {
        let driver = self.clone();

        Box::pin(async_stream::stream! {
            let ids = driver.ids.generate();
            let mut request = request;
            debug!(conversation_id = %ids.conversation_id, "Starting stream");

            let response = match driver.connect(&mut request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(
                        conversation_id = %ids.conversation_id,
                        error = %e,
                        "Failed to open upstream stream"
                    );
                    yield Err(e);
                    return;
                }
            };

            let mut index: i64 = 0;
            let mut decoder = LineDecoder::new();
            let mut body = response.bytes_stream();

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(
                            conversation_id = %ids.conversation_id,
                            error = %e,
                            "Upstream connection failed mid-stream"
                        );
                        yield Err(ProxyError::Transport(e.to_string()));
                        return;
                    }
                };

                for line in decoder.push(&bytes) {
                    if let Some(event) = driver.content_event(&line, index, &ids) {
                        yield Ok(event);
                        index += 1;
                    }
                }
            }

            if let Some(line) = decoder.finish() {
                if let Some(event) = driver.content_event(&line, index, &ids) {
                    yield Ok(event);
                    index += 1;
                }
            }

            match driver.render(DeltaContent::default(), Some(FINISH_REASON_STOP), index, &ids) {
                Ok(event) => {
                    yield Ok(event);
                }
                Err(e) => {
                    error!(
                        conversation_id = %ids.conversation_id,
                        error = %e,
                        "Failed to build final chunk"
                    );
                    yield Err(e);
                    return;
                }
            }

            info!(conversation_id = %ids.conversation_id, chunks = index, "Stream completed");
            yield Ok(DONE_EVENT.to_string());
        })
    }

    /// Open the upstream stream, reauthenticating at most once.
    async fn connect(&self, request: &mut UpstreamRequest) -> Result<Response> {
        let mut reauthenticated = false;

        loop {
            let snapshot = self.store.snapshot();
            if let Some(token) = snapshot.state.turnstile_token() {
                request.turnstile_token = token.to_string();
            }

            let response = self.upstream.open(request, &snapshot.state).await?;
            let status = response.status();

            if status == StatusCode::FORBIDDEN {
                drop(response);

                if reauthenticated {
                    warn!("Upstream rejected the refreshed session");
                    return Err(ProxyError::Authentication);
                }

                warn!(
                    generation = snapshot.generation,
                    "Upstream session expired, reauthenticating"
                );
                self.reauth.refresh(&self.store, snapshot.generation).await?;
                reauthenticated = true;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProxyError::UpstreamStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(response);
        }
    }

    /// Chunk event for a content line; `None` for skipped or malformed lines
    fn content_event(&self, line: &[u8], index: i64, ids: &StreamIds) -> Option<String> {
        let text = match parse_bytes(line) {
            Ok(Some(SseEvent::ContentFragment { text })) if !text.is_empty() => text,
            Ok(_) => return None,
            Err(e) => {
                warn!(
                    error = %e,
                    line = %String::from_utf8_lossy(line),
                    "Skipping malformed upstream line"
                );
                return None;
            }
        };

        match self.render(DeltaContent::assistant(text), None, index, ids) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(index, error = %e, "Skipping chunk that could not be assembled");
                None
            }
        }
    }

    fn render(
        &self,
        delta: DeltaContent,
        finish_reason: Option<&str>,
        index: i64,
        ids: &StreamIds,
    ) -> Result<String> {
        let chunk = build_chunk(ChunkSpec {
            model_name: self.model.clone(),
            index,
            delta,
            system_fingerprint: ids.system_fingerprint.clone(),
            conversation_id: ids.conversation_id.clone(),
            finish_reason: finish_reason.map(str::to_string),
            created_at: None,
        })?;

        Ok(chunk.to_sse_event()?)
    }
}
