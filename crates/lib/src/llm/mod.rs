//! Completion provider client.
//!
//! One OpenAI-compatible chat-completions client (non-streaming). The relay only
//! ever issues a single system+user completion per request.

mod openai;

pub use openai::{ChatMessage, ChatResponse, OpenAiClient, OpenAiError, DEFAULT_MODEL};
