//! Collaboration outputs: the buffered result, the streaming wire
//! events, and embedded tool-call extraction.

pub mod result;
pub mod stream;
pub mod tool_call;
