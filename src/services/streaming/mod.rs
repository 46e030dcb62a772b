//! Streaming support for chat completions
//!
//! Upstream SSE lines are parsed into [`SseEvent`]s, assembled into OpenAI
//! [`ChatCompletionChunk`]s and re-emitted by the [`StreamingDriver`].

pub mod chunk;
pub mod driver;
pub mod ids;
pub mod sse_parser;

pub use chunk::{
    build_choice, build_chunk, ChatCompletionChunk, Choice, ChoiceSpec, ChunkSpec, DeltaContent,
    OBJECT_TYPE,
};
pub use driver::{ChunkStream, StreamingDriver, DONE_EVENT, FINISH_REASON_STOP};
pub use ids::{random_alphanum, IdGenerator, StreamIds};
pub use sse_parser::{parse_bytes, parse_line, LineDecoder, SseEvent};
