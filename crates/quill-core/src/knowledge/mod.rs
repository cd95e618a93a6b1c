//! Knowledge base: the embedded chunks answers are grounded in.
//!
//! - [`Chunk`] / [`KnowledgeBase`] - validated in-memory collection and its
//!   JSON artifact format
//! - [`KnowledgeSource`] - loads the artifact at session start

mod loader;
mod types;

pub use loader::{FileKnowledgeSource, InMemoryKnowledgeSource, KnowledgeSource};
pub use types::{Chunk, KnowledgeBase};
