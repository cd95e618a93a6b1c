//! Embedding model abstractions and implementations.
//!
//! ## Core Traits
//!
//! - [`Embedder`] - Embedding model inference interface
//! - [`ModelConfig`] - Model configuration parameters
//!
//! ## Implementations
//!
//! - [`MiniLmConfig`] - Configuration for MiniLM sentence models
//! - [`BertEmbedder`] - BERT encoder with mean pooling, using Candle
//! - [`TokenizerHandle`] - Wrapper for HuggingFace tokenizers
//!
//! ## Example
//!
//! ```ignore
//! use quill_core::embedding::{BertEmbedder, Embedder, MiniLmConfig, TokenizerHandle};
//!
//! let tokenizer = TokenizerHandle::from_bytes(std::fs::read("tokenizer.json")?, 256)?;
//! let embedder = BertEmbedder::from_bytes(
//!     std::fs::read("model.safetensors")?,
//!     &std::fs::read("config.json")?,
//!     tokenizer,
//!     MiniLmConfig::default(),
//!     &candle_core::Device::Cpu,
//! )?;
//!
//! let embedding = embedder.embed_text("Hello, world!")?;
//! ```

mod traits;

pub mod config;
pub mod model;
pub mod tokenizer;

pub use traits::{Embedder, ModelConfig};

pub use config::MiniLmConfig;

pub use model::BertEmbedder;

pub use tokenizer::TokenizerHandle;
