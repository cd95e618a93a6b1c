//! # Quill Core
//!
//! Local retrieval-augmented question answering: answers a question from a
//! small precomputed knowledge base with models that run on this machine.
//!
//! This crate provides the algorithms, the inference process and the session
//! state machine; the `quill` binary is a thin front end over them.
//!
//! ## Modules
//!
//! - [`config`] - Production configuration constants
//! - [`error`] - Error types for every concern
//! - [`device`] - Compute device and dtype selection
//! - [`embedding`] - Sentence embedding model (MiniLM)
//! - [`generation`] - Streaming instruction-tuned generation (SmolLM2)
//! - [`chunking`] - Source document chunking policies
//! - [`knowledge`] - Knowledge base artifact and loading
//! - [`retrieval`] - Top-k cosine similarity retrieval
//! - [`processing`] - Knowledge base build pipeline
//! - [`inference`] - Inference process and its message protocol
//! - [`session`] - Session orchestrator

pub mod chunking;
pub mod config;
pub mod device;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod inference;
pub mod knowledge;
pub mod processing;
pub mod retrieval;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;
