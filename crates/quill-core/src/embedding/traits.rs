//! Traits for embedding operations.
//!
//! The knowledge-base builder and the inference process only see
//! [`Embedder`], so the BERT backend can be swapped for a fake in tests.

use crate::error::EmbeddingError;

/// Trait for embedding model operations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The builder shares one embedder
/// behind an `Arc`, and the inference process moves it onto its own thread.
///
/// # Examples
///
/// ```ignore
/// let embedder: Arc<dyn Embedder> = Arc::new(BertEmbedder::from_bytes(...)?);
///
/// let embedding = embedder.embed_text("How do I reset my password?")?;
/// assert_eq!(embedding.len(), embedder.embedding_dim());
/// ```
pub trait Embedder: Send + Sync {
    /// Identifier of the underlying model, used in logs.
    fn model_id(&self) -> &str;

    /// Returns the embedding dimension (vector size).
    ///
    /// All embeddings from this model will have this length.
    fn embedding_dim(&self) -> usize;

    /// Embeds a single text into a vector of `embedding_dim()` floats.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Trait for embedding model configurations.
pub trait ModelConfig: Clone + Send + Sync {
    /// Returns the model identifier (e.g., "sentence-transformers/all-MiniLM-L6-v2").
    fn model_id(&self) -> &str;

    /// Returns the output embedding dimension.
    fn embedding_dim(&self) -> usize;

    /// Returns the maximum sequence length the model can handle.
    fn max_sequence_length(&self) -> usize;

    /// Whether embeddings should be L2 normalized (unit vectors).
    fn normalize_embeddings(&self) -> bool;
}
