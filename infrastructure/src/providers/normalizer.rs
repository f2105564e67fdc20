//! Chunk normalization for streaming provider replies.
//!
//! Backends disagree on the shape of a streamed chunk. Each provider
//! config names a normalizer; the gateway runs every raw chunk through
//! it and forwards only plain text deltas, so the engine never sees a
//! provider-native chunk shape. Chunks that carry no text (role
//! preambles, stop markers, usage records) normalize to `None` and are
//! dropped silently.

use serde_json::Value;

/// Turns one raw chunk payload into a text delta, or nothing.
pub type ChunkNormalizer = fn(&Value) -> Option<String>;

/// OpenAI-style delta: `choices[0].delta.content`
pub fn openai_delta(chunk: &Value) -> Option<String> {
    chunk
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Anthropic-style content block delta: `delta.text`, only on chunks
/// tagged `content_block_delta`
pub fn block_delta(chunk: &Value) -> Option<String> {
    if chunk.get("type")?.as_str()? != "content_block_delta" {
        return None;
    }
    chunk
        .get("delta")?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// Bare text payloads: either a JSON string or `{"text": ...}`
pub fn plain_text(chunk: &Value) -> Option<String> {
    if let Some(text) = chunk.as_str() {
        return Some(text.to_string());
    }
    chunk.get("text")?.as_str().map(str::to_string)
}

/// Look up a normalizer by its configured name
pub fn by_name(name: &str) -> Option<ChunkNormalizer> {
    match name {
        "openai_delta" => Some(openai_delta),
        "block_delta" => Some(block_delta),
        "plain_text" => Some(plain_text),
        _ => None,
    }
}
