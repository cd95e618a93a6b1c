//! Offline knowledge-base build.
//!
//! # Architecture
//!
//! The `KnowledgeBaseBuilder` coordinates:
//! 1. **Reading**: Loads the source document
//! 2. **Chunking**: Splits text with the selected [`ChunkingPolicy`](crate::chunking::ChunkingPolicy)
//! 3. **Embedding**: Computes a vector for each chunk
//! 4. **Writing**: Persists the artifact atomically
//! 5. **Progress**: Reports progress via callbacks
//!
//! # Example
//!
//! ```ignore
//! use quill_core::processing::{BuildProgress, KnowledgeBaseBuilder};
//!
//! let builder = KnowledgeBaseBuilder::new(Arc::new(embedder), ChunkingPolicy::BlockSplit)?;
//! let report = builder.build_file(source, output, |progress: BuildProgress| {
//!     println!("{:.0}% complete", progress.percent_complete());
//! })?;
//! ```

mod artifact;
mod pipeline;
mod progress;

pub use artifact::{read_source, write_artifact};
pub use pipeline::KnowledgeBaseBuilder;
pub use progress::{BuildProgress, BuildReport, ProgressTimer};
