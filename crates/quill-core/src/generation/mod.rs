//! Streaming text generation.
//!
//! ## Core Types
//!
//! - [`Generator`] - Streaming generation interface
//! - [`LlamaGenerator`] - SmolLM2 (Llama architecture) implementation using Candle
//! - [`TokenOutputStream`] - Incremental detokenizer
//! - [`CancelToken`] - Cooperative cancellation between decoding steps
//!
//! Prompts are built with [`build_messages`] and framed with the ChatML
//! template by the generator.

mod traits;

pub mod cancel;
pub mod config;
pub mod model;
pub mod prompt;
pub mod stream;

pub use traits::{GenerationStats, Generator};

pub use cancel::CancelToken;
pub use config::{GenerationOptions, SmolLmConfig};
pub use model::LlamaGenerator;
pub use prompt::{build_messages, ChatMessage, Role};
pub use stream::TokenOutputStream;
