//! Chat-completion chunk assembly
//!
//! Builds validated OpenAI `chat.completion.chunk` objects from a delta plus the
//! per-request context (model, ids, index). Construction never performs I/O.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ChoiceCreationError, ChunkCreationError};

/// `object` value of every streamed chunk
pub const OBJECT_TYPE: &str = "chat.completion.chunk";

/// Incremental message content carried by one chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<serde_json::Value>>,
}

impl DeltaContent {
    /// Assistant text delta
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Some("assistant".to_string()),
            content: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Input for [`build_choice`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSpec {
    pub index: i64,
    pub delta: DeltaContent,
    pub finish_reason: Option<String>,
}

/// The single choice of a streamed chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u64,
    pub delta: DeltaContent,
    pub logprobs: Option<serde_json::Value>,
    pub finish_reason: Option<String>,
}

/// Input for [`build_chunk`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpec {
    pub model_name: String,
    pub index: i64,
    pub delta: DeltaContent,
    pub system_fingerprint: String,
    pub conversation_id: String,
    pub finish_reason: Option<String>,
    /// Unix seconds; `None` means now
    pub created_at: Option<i64>,
}

/// OpenAI streaming chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub system_fingerprint: String,
    pub choices: Vec<Choice>,
}

impl ChatCompletionChunk {
    /// Render as one outbound SSE event (`data: {json}\n\n`)
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk cannot be serialized.
    pub fn to_sse_event(&self) -> serde_json::Result<String> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

/// Build one validated choice.
///
/// # Errors
///
/// Fails when the index is negative or the finish reason is an empty string.
pub fn build_choice(spec: ChoiceSpec) -> Result<Choice, ChoiceCreationError> {
    let index = u64::try_from(spec.index).map_err(|_| ChoiceCreationError::InvalidIndex)?;

    if spec.finish_reason.as_deref().is_some_and(str::is_empty) {
        return Err(ChoiceCreationError::InvalidFinishReason);
    }

    Ok(Choice {
        index,
        delta: spec.delta,
        logprobs: None,
        finish_reason: spec.finish_reason,
    })
}

/// Build one validated chunk holding exactly one choice.
///
/// Checks run in order: model name, index, system fingerprint, conversation id.
///
/// # Errors
///
/// Returns the first failed check, or [`ChunkCreationError::Choice`] wrapping the
/// choice failure.
pub fn build_chunk(spec: ChunkSpec) -> Result<ChatCompletionChunk, ChunkCreationError> {
    if spec.model_name.is_empty() {
        return Err(ChunkCreationError::InvalidModelName);
    }
    if spec.index < 0 {
        return Err(ChunkCreationError::InvalidIndex);
    }
    if spec.system_fingerprint.is_empty() {
        return Err(ChunkCreationError::InvalidSystemFingerprint);
    }
    if spec.conversation_id.is_empty() {
        return Err(ChunkCreationError::InvalidConversationId);
    }

    let created = spec.created_at.unwrap_or_else(|| Utc::now().timestamp());

    let choice = build_choice(ChoiceSpec {
        index: spec.index,
        delta: spec.delta,
        finish_reason: spec.finish_reason,
    })?;

    Ok(ChatCompletionChunk {
        id: spec.conversation_id,
        object: OBJECT_TYPE.to_string(),
        created,
        model: spec.model_name,
        system_fingerprint: spec.system_fingerprint,
        choices: vec![choice],
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn spec() -> ChunkSpec {
        ChunkSpec {
            model_name: "deepseek-chat".to_string(),
            index: 0,
            delta: DeltaContent::assistant("Hi"),
            system_fingerprint: "fp_abc".to_string(),
            conversation_id: "chatcmpl-abc".to_string(),
            finish_reason: None,
            created_at: Some(1_735_693_261),
        }
    }

    #[test]
    fn test_build_chunk() {
        let chunk = build_chunk(spec()).unwrap();

        assert_eq!(chunk.id, "chatcmpl-abc");
        assert_eq!(chunk.object, OBJECT_TYPE);
        assert_eq!(chunk.created, 1_735_693_261);
        assert_eq!(chunk.model, "deepseek-chat");
        assert_eq!(chunk.system_fingerprint, "fp_abc");
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.choices[0].index, 0);
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
        assert_eq!(chunk.choices[0].finish_reason, None);
    }

    #[test]
    fn test_created_defaults_to_now() {
        let before = Utc::now().timestamp();
        let chunk = build_chunk(ChunkSpec {
            created_at: None,
            ..spec()
        })
        .unwrap();
        let after = Utc::now().timestamp();

        assert!(chunk.created >= before && chunk.created <= after);
    }

    #[test]
    fn test_validation_order() {
        let err = build_chunk(ChunkSpec {
            model_name: String::new(),
            index: -1,
            system_fingerprint: String::new(),
            ..spec()
        })
        .unwrap_err();
        assert_eq!(err, ChunkCreationError::InvalidModelName);

        let err = build_chunk(ChunkSpec {
            index: -1,
            conversation_id: String::new(),
            ..spec()
        })
        .unwrap_err();
        assert_eq!(err, ChunkCreationError::InvalidIndex);

        let err = build_chunk(ChunkSpec {
            system_fingerprint: String::new(),
            conversation_id: String::new(),
            ..spec()
        })
        .unwrap_err();
        assert_eq!(err, ChunkCreationError::InvalidSystemFingerprint);

        let err = build_chunk(ChunkSpec {
            conversation_id: String::new(),
            ..spec()
        })
        .unwrap_err();
        assert_eq!(err, ChunkCreationError::InvalidConversationId);
    }

    #[test]
    fn test_empty_finish_reason_is_wrapped() {
        let err = build_chunk(ChunkSpec {
            finish_reason: Some(String::new()),
            ..spec()
        })
        .unwrap_err();

        assert_eq!(
            err,
            ChunkCreationError::Choice(ChoiceCreationError::InvalidFinishReason)
        );
    }

    #[test]
    fn test_build_choice_rejects_negative_index() {
        let err = build_choice(ChoiceSpec {
            index: -3,
            delta: DeltaContent::default(),
            finish_reason: None,
        })
        .unwrap_err();
        assert_eq!(err, ChoiceCreationError::InvalidIndex);
    }

    #[test]
    fn test_terminal_chunk_serialization() {
        let chunk = build_chunk(ChunkSpec {
            index: 2,
            delta: DeltaContent::default(),
            finish_reason: Some("stop".to_string()),
            ..spec()
        })
        .unwrap();

        let value: serde_json::Value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(
            value["choices"][0],
            serde_json::json!({
                "index": 2,
                "delta": {},
                "logprobs": null,
                "finish_reason": "stop"
            })
        );
    }

    #[test]
    fn test_sse_event_round_trip() {
        let chunk = build_chunk(spec()).unwrap();
        let event = chunk.to_sse_event().unwrap();

        assert!(event.starts_with("data: "));
        assert!(event.ends_with("\n\n"));

        let json = event.trim_start_matches("data: ").trim_end();
        let parsed: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, chunk.id);
        assert_eq!(parsed.model, chunk.model);
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("Hi"));
        assert_eq!(parsed.choices[0].finish_reason, None);
    }
}
