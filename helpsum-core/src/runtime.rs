//! Contract for pluggable model runtimes.
//!
//! A runtime accepts a GGUF file path plus a [`ModelConfig`] and returns a
//! handle that can stream chat completions. The chunk shape mirrors the
//! OpenAI-style deltas emitted by llama.cpp: a chunk may carry a role
//! marker, a content delta, both, or neither.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A role-tagged message in the conversation sent to the model.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// A single streaming chat completion request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// An incremental unit of generated text.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ChatChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatChunk {
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            role: None,
            content: Some(content.into()),
        }
    }
}

/// Load-time parameters for a model.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Maximum number of context tokens a single inference call may consider.
    pub n_ctx: u32,
    /// Built-in chat template name to apply instead of the model's own
    /// (e.g. `llama3`).
    pub chat_format: Option<String>,
}

/// An ordered stream of completion chunks. Consuming it is the sole blocking
/// operation of a run; it suspends the caller between chunks.
pub type ChunkStream<'a> = Box<dyn Iterator<Item = Result<ChatChunk>> + 'a>;

/// A loaded model able to serve streaming chat completions.
pub trait ChatModel {
    fn chat_stream(&mut self, request: ChatRequest) -> Result<ChunkStream<'_>>;
}

/// A backend that can load model files into [`ChatModel`] handles.
pub trait ModelBackend {
    type Model: ChatModel;

    fn load_model(&self, path: &Path, config: &ModelConfig) -> Result<Self::Model>;
}
