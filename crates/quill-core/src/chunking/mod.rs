//! Text chunking strategies for building a knowledge base.
//!
//! Source documents are plain text or lightweight Markdown. Both policies
//! work line by line and treat any line whose first non-blank character is
//! `#` as a heading:
//!
//! - [`BlockSplitChunker`] - one chunk per blank-line separated block,
//!   heading lines removed
//! - [`HeadingContextChunker`] - lines accumulated up to a character budget,
//!   each chunk prefixed with its section heading

mod block;
mod heading;
mod types;

use crate::config::DEFAULT_CHUNK_CHARS;
use crate::error::ChunkingError;

pub use block::BlockSplitChunker;
pub use heading::HeadingContextChunker;
pub use types::TextChunk;

/// Trait for text chunking strategies.
///
/// Implementations define how to split text into coherent chunks suitable
/// for embedding.
pub trait ChunkingStrategy: Send + Sync {
    /// Splits text into chunks according to this strategy.
    ///
    /// Chunks are returned in document order with consecutive indices
    /// starting at 0. Every chunk is non-empty and trimmed.
    fn chunk(&self, text: &str) -> Result<Vec<TextChunk>, ChunkingError>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &'static str;
}

/// Chunking policy selected for a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkingPolicy {
    /// Split on blank lines
    #[default]
    BlockSplit,
    /// Size-bounded chunks carrying their section heading
    HeadingContext { max_chars: usize },
}

impl ChunkingPolicy {
    /// Heading-context policy with the default character budget.
    pub fn heading_context() -> Self {
        ChunkingPolicy::HeadingContext {
            max_chars: DEFAULT_CHUNK_CHARS,
        }
    }
}

/// Creates the chunker for a policy.
///
/// # Errors
///
/// Returns `ChunkingError::InvalidConfig` for a zero character budget.
pub fn create_chunker(policy: ChunkingPolicy) -> Result<Box<dyn ChunkingStrategy>, ChunkingError> {
    match policy {
        ChunkingPolicy::BlockSplit => Ok(Box::new(BlockSplitChunker::new())),
        ChunkingPolicy::HeadingContext { max_chars } => {
            Ok(Box::new(HeadingContextChunker::new(max_chars)?))
        }
    }
}

/// Whether a line is a Markdown-style heading.
pub fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Heading text with the leading `#` markers removed.
pub(crate) fn heading_text(line: &str) -> &str {
    line.trim().trim_start_matches('#').trim()
}
