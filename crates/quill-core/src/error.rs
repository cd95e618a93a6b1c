//! Error types for quill-core.
//!
//! This module defines the error types used across the core library:
//! embedding, generation, asset loading, chunking, knowledge-base handling,
//! the inference process, the knowledge-base build, and the session.

use crate::session::SessionState;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Failed to load model from bytes
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    /// Failed to create tensor during inference
    #[error("Failed to create tensor: {0}")]
    TensorCreation(String),
    /// Forward pass through the model failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Failed to tokenize text
    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Tokenizer not available or initialization failed
    #[error("Tokenizer unavailable: {0}")]
    TokenizerUnavailable(String),
}

/// Errors that can occur while generating text.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Failed to load model weights or configuration
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    /// Tokenizer not available or initialization failed
    #[error("Tokenizer unavailable: {0}")]
    TokenizerUnavailable(String),
    /// Failed to encode the prompt
    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),
    /// Forward pass or sampling failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Failed to turn generated tokens back into text
    #[error("Decoding failed: {0}")]
    DecodeFailed(String),
}

/// Errors that can occur during asset loading.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// Failed to load asset from source
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),
    /// Asset not found at expected location
    #[error("Asset not found: {0}")]
    NotFound(String),
    /// Asset data is invalid or corrupted
    #[error("Invalid asset data: {0}")]
    InvalidData(String),
}

/// Errors that can occur during text chunking.
#[derive(Debug, Clone, Error)]
pub enum ChunkingError {
    /// Invalid chunking configuration
    #[error("Invalid chunking config: {0}")]
    InvalidConfig(String),
}

/// Errors that can occur while reading, validating or querying a knowledge base.
#[derive(Debug, Clone, Error)]
pub enum KnowledgeBaseError {
    /// The artifact could not be read
    #[error("Failed to read knowledge base: {0}")]
    Read(String),
    /// The artifact is not a valid list of `{text, embedding}` records
    #[error("Failed to parse knowledge base: {0}")]
    Parse(String),
    /// The knowledge base could not be serialized
    #[error("Failed to serialize knowledge base: {0}")]
    Serialize(String),
    /// A record carries an empty embedding
    #[error("Chunk {index} has an empty embedding")]
    EmptyEmbedding { index: usize },
    /// Records disagree on the embedding dimension
    #[error("Chunk {index} has dimension {actual}, expected {expected}")]
    InconsistentDimensions {
        index: usize,
        expected: usize,
        actual: usize,
    },
    /// Query embedding dimension differs from the stored embeddings
    #[error("Embedding dimension mismatch: knowledge base has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors raised by the inference process and its handle.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// Failed to spawn the inference thread
    #[error("Failed to spawn inference thread: {0}")]
    ThreadSpawnFailed(String),
    /// Command channel disconnected (inference thread has stopped)
    #[error("Inference process channel disconnected")]
    ChannelDisconnected,
    /// `embed` or `generate` arrived before a successful `load`
    #[error("Models are not loaded")]
    ModelsNotLoaded,
    /// A model could not be loaded
    #[error("Failed to load model: {0}")]
    ModelLoadFailed(String),
    /// Embedding failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// Generation failed
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// A model backend panicked while handling a command
    #[error("Inference panicked: {0}")]
    Panicked(String),
}

impl From<AssetError> for InferenceError {
    fn from(err: AssetError) -> Self {
        InferenceError::ModelLoadFailed(err.to_string())
    }
}

/// Errors that abort a knowledge-base build.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// The source document does not exist
    #[error("Source not found: {0}")]
    SourceNotFound(String),
    /// The source document could not be read
    #[error("Failed to read source: {0}")]
    SourceRead(String),
    /// Chunking produced nothing to embed
    #[error("Source produced no chunks")]
    NoChunks,
    /// The embedding model could not be loaded
    #[error("Embedding model unavailable: {0}")]
    EmbedderUnavailable(String),
    /// Chunking failed
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
    /// Embedding a chunk failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// The embedded chunks do not form a valid knowledge base
    #[error(transparent)]
    KnowledgeBase(#[from] KnowledgeBaseError),
    /// The artifact could not be written
    #[error("Failed to write artifact: {0}")]
    ArtifactWrite(String),
}

/// Errors surfaced by the session orchestrator.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// An operation was attempted from a state that does not allow it
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
    /// The inference process reported a failure while loading models
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    /// Loading or querying the knowledge base failed
    #[error(transparent)]
    KnowledgeBase(#[from] KnowledgeBaseError),
    /// Sending to the inference process failed
    #[error(transparent)]
    Inference(#[from] InferenceError),
    /// The inference process event stream ended
    #[error("Inference event stream closed")]
    EventStreamClosed,
}

// Conversion implementations for error chaining

impl From<EmbeddingError> for String {
    fn from(err: EmbeddingError) -> String {
        err.to_string()
    }
}

impl From<GenerationError> for String {
    fn from(err: GenerationError) -> String {
        err.to_string()
    }
}

impl From<AssetError> for EmbeddingError {
    fn from(err: AssetError) -> Self {
        EmbeddingError::ModelLoad(err.to_string())
    }
}

impl From<AssetError> for GenerationError {
    fn from(err: AssetError) -> Self {
        GenerationError::ModelLoad(err.to_string())
    }
}
