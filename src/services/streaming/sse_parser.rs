//! Server-Sent Events (SSE) line parser for the upstream chat stream
//!
//! The upstream only uses `data:` records whose payload is either a JSON object with a
//! `text` field or the `[DONE]` marker. Every other SSE field (`event`, `id`, `retry`)
//! and every comment line is ignored.

use bytes::{Buf, BytesMut};

use crate::error::ParseError;

const DATA_FIELD: &str = "data";
const DONE_MARKER: &str = "[DONE]";

/// Event recognized on one upstream line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Text fragment of the assistant reply
    ContentFragment { text: String },

    /// `data: [DONE]`
    StreamEnd,
}

impl SseEvent {
    /// Text carried by the event, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::ContentFragment { text } => Some(text),
            Self::StreamEnd => None,
        }
    }
}

/// Parse one upstream line.
///
/// Returns `Ok(None)` for lines that carry no event: blanks, comments, non-`data`
/// fields and empty payloads.
///
/// # Errors
///
/// Returns [`ParseError::InvalidJson`] when a `data:` payload is not a JSON object.
pub fn parse_line(line: &str) -> Result<Option<SseEvent>, ParseError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some((field, value)) = line.split_once(':') else {
        return Ok(None);
    };

    if field.trim() != DATA_FIELD {
        return Ok(None);
    }

    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if value == DONE_MARKER {
        return Ok(Some(SseEvent::StreamEnd));
    }

    let payload: serde_json::Value =
        serde_json::from_str(value).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let serde_json::Value::Object(object) = payload else {
        return Err(ParseError::InvalidJson(
            "JSON data must be an object".to_string(),
        ));
    };

    let text = match object.get("text") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) if !is_falsy(other) => other.to_string(),
        _ => String::new(),
    };

    Ok(Some(SseEvent::ContentFragment { text }))
}

/// `null`, `false`, zero and empty containers carry no text
#[allow(clippy::float_cmp)]
fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
    }
}

/// Parse one raw upstream line.
///
/// # Errors
///
/// Returns [`ParseError::InvalidInput`] when the bytes are not UTF-8, otherwise the
/// errors of [`parse_line`].
pub fn parse_bytes(line: &[u8]) -> Result<Option<SseEvent>, ParseError> {
    let line = std::str::from_utf8(line).map_err(|e| ParseError::InvalidInput(e.to_string()))?;
    parse_line(line)
}

/// Splits an upstream byte stream into lines.
///
/// Network chunks may end mid-line or mid-character, so incomplete input is buffered
/// until the next call. `\n`, `\r\n` and a bare `\r` all end a line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
    /// Previous chunk ended with `\r`; a leading `\n` belongs to that terminator
    pending_cr: bool,
}

impl LineDecoder {
    /// Create a new decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every line it completes.
    ///
    /// Line terminators are stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut chunk = chunk;
        if self.pending_cr && !chunk.is_empty() {
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
            self.pending_cr = false;
        }
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(line_end) = self
            .buffer
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
        {
            let line = self.buffer.split_to(line_end).to_vec();
            let terminator = self.buffer[0];
            self.buffer.advance(1);

            if terminator == b'\r' {
                match self.buffer.first() {
                    Some(b'\n') => self.buffer.advance(1),
                    Some(_) => {}
                    None => self.pending_cr = true,
                }
            }
            lines.push(line);
        }

        lines
    }

    /// Return the trailing unterminated line, if any
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        self.pending_cr = false;
        if self.buffer.is_empty() {
            return None;
        }

        Some(self.buffer.split().to_vec())
    }
}
