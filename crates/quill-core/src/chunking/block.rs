//! Blank-line block splitting.

use super::{is_heading, ChunkingStrategy, TextChunk};
use crate::error::ChunkingError;

/// Splits text into blocks separated by one or more blank lines.
///
/// Heading lines are removed from each block and a block left with no text
/// is discarded, so `"# Experience\nDid X\nDid Y\n\n# Education\nDid Z"`
/// yields `"Did X\nDid Y"` and `"Did Z"`. Lines holding only whitespace
/// count as blank.
#[derive(Debug, Clone, Default)]
pub struct BlockSplitChunker;

impl BlockSplitChunker {
    pub fn new() -> Self {
        Self
    }
}

impl ChunkingStrategy for BlockSplitChunker {
    fn chunk(&self, text: &str) -> Result<Vec<TextChunk>, ChunkingError> {
        let mut chunks = Vec::new();
        let mut block: Vec<&str> = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                flush(&mut block, &mut chunks);
            } else if !is_heading(line) {
                block.push(line.trim_end());
            }
        }
        flush(&mut block, &mut chunks);

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "block-split"
    }
}

fn flush(block: &mut Vec<&str>, chunks: &mut Vec<TextChunk>) {
    let body = block.join("\n");
    let body = body.trim();
    if !body.is_empty() {
        chunks.push(TextChunk::new(chunks.len(), body));
    }
    block.clear();
}
