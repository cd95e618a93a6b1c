//! Configuration for the MiniLM sentence embedding model.
//!
//! The transformer shape (layers, heads, vocabulary) comes from the model's
//! own `config.json`. This struct only carries what the rest of the crate
//! needs to know about the embedder.

use super::traits::ModelConfig;
use crate::config::{EMBEDDING_DIM, EMBEDDING_MAX_TOKENS, EMBEDDING_MODEL_ID};
use serde::{Deserialize, Serialize};

/// Configuration for MiniLM (BERT architecture) embedding models.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MiniLmConfig {
    /// Model identifier
    pub model_id: String,

    /// Whether to apply L2 normalization to embeddings
    pub normalize_embeddings: bool,

    /// Hidden dimension size (embedding output dimension)
    pub hidden_size: usize,

    /// Maximum number of tokens per input; longer input is truncated
    pub max_tokens: usize,
}

impl Default for MiniLmConfig {
    fn default() -> Self {
        Self {
            model_id: EMBEDDING_MODEL_ID.to_string(),
            normalize_embeddings: true,
            hidden_size: EMBEDDING_DIM,
            max_tokens: EMBEDDING_MAX_TOKENS,
        }
    }
}

impl ModelConfig for MiniLmConfig {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embedding_dim(&self) -> usize {
        self.hidden_size
    }

    fn max_sequence_length(&self) -> usize {
        self.max_tokens
    }

    fn normalize_embeddings(&self) -> bool {
        self.normalize_embeddings
    }
}
