//! Message protocol between the session and the inference process.
//!
//! Every message serializes as `{"type": kind, "payload": {...}}`, with the
//! payload omitted for kinds that carry none.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which model a `progress` event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Embed,
    Llm,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Embed => write!(f, "embed"),
            ModelKind::Llm => write!(f, "llm"),
        }
    }
}

/// Commands sent to the inference process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Command {
    /// Load both models
    Load,
    /// Embed a query
    Embed { query: String },
    /// Answer a query from the retrieved chunks
    Generate {
        query: String,
        chunks: Vec<String>,
        persona: String,
    },
}

impl Command {
    /// Protocol name of the command.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Load => "load",
            Command::Embed { .. } => "embed",
            Command::Generate { .. } => "generate",
        }
    }
}

/// Events emitted by the inference process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// Load progress of one model, 0 to 100
    Progress { model: ModelKind, progress: f32 },
    /// Name of the generation model
    ModelInfo { name: String },
    /// Both models are loaded
    Ready,
    /// Embedding of an `embed` query
    Embedding { embedding: Vec<f32>, query: String },
    /// Next fragment of a streamed answer
    Token { text: String },
    /// The answer is complete
    Done,
    /// A command failed
    Error { message: String },
}

impl Event {
    /// Whether the event ends a `generate` stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Done | Event::Error { .. })
    }
}
