//! Production configuration constants.
//!
//! These values define the default behaviour of retrieval, chunking and
//! generation. They are used throughout the codebase and by the CLI so both
//! sides of the knowledge-base artifact agree on the same settings.
//!
//! # Usage
//!
//! ```
//! use quill_core::config::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K, EMBEDDING_DIM};
//!
//! let query = vec![0.0f32; EMBEDDING_DIM];
//! assert_eq!(query.len(), 384);
//! assert_eq!(DEFAULT_TOP_K, 4);
//! assert!(DEFAULT_MIN_SCORE > 0.0);
//! ```

// =============================================================================
// Model Configuration
// =============================================================================

/// Embedding model identifier (sentence-transformers MiniLM, BERT architecture).
pub const EMBEDDING_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding vector dimension (MiniLM hidden_size).
///
/// Chunks in the knowledge base and query embeddings must both have this
/// length. A mismatch at query time is fatal for the session.
pub const EMBEDDING_DIM: usize = 384;

/// Maximum tokens fed to the embedding model per text.
///
/// MiniLM was trained on sequences of up to 256 word pieces; longer input is
/// truncated by the tokenizer.
pub const EMBEDDING_MAX_TOKENS: usize = 256;

/// Generation model identifier (Llama architecture, ChatML template).
pub const GENERATION_MODEL_ID: &str = "HuggingFaceTB/SmolLM2-360M-Instruct";

// =============================================================================
// Retrieval Configuration
// =============================================================================

/// Number of chunks passed to the generation model as context.
pub const DEFAULT_TOP_K: usize = 4;

/// Minimum cosine similarity for a chunk to be considered relevant.
pub const DEFAULT_MIN_SCORE: f32 = 0.3;

// =============================================================================
// Chunking Configuration
// =============================================================================

/// Character budget for the size-bounded chunking policy.
pub const DEFAULT_CHUNK_CHARS: usize = 512;

// =============================================================================
// Generation Configuration
// =============================================================================

/// Maximum number of new tokens generated per answer.
pub const DEFAULT_MAX_NEW_TOKENS: usize = 300;

/// Seed for the logits processor. Only relevant when sampling is enabled.
pub const DEFAULT_SEED: u64 = 299_792_458;

/// Persona used when the user leaves the persona field empty.
pub const DEFAULT_PERSONA: &str = "helpful assistant";

/// Maximum number of whitespace-separated words kept from a persona.
pub const MAX_PERSONA_WORDS: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_dim_matches_minilm() {
        assert_eq!(EMBEDDING_DIM, 384);
    }

    #[test]
    fn test_retrieval_defaults() {
        let k = DEFAULT_TOP_K;
        let min_score = DEFAULT_MIN_SCORE;
        assert_eq!(k, 4);
        assert!((min_score - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_default_persona_fits_word_limit() {
        let words = DEFAULT_PERSONA.split_whitespace().count();
        assert!(words <= MAX_PERSONA_WORDS);
    }
}
