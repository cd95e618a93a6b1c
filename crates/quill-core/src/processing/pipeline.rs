//! Knowledge-base build pipeline.
//!
//! The `KnowledgeBaseBuilder` chunks a source document, embeds every chunk
//! and assembles the validated knowledge base.

use super::artifact::{read_source, write_artifact};
use super::progress::{BuildProgress, BuildReport, ProgressTimer};
use crate::chunking::{create_chunker, ChunkingPolicy, ChunkingStrategy};
use crate::embedding::Embedder;
use crate::error::BuildError;
use crate::knowledge::{Chunk, KnowledgeBase};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds knowledge bases from source documents.
///
/// The output depends only on the source text, the chunking policy and the
/// embedder, so rebuilding unchanged input with the same model reproduces
/// the same artifact.
///
/// # Example
///
/// ```ignore
/// use quill_core::chunking::ChunkingPolicy;
/// use quill_core::processing::KnowledgeBaseBuilder;
///
/// let builder = KnowledgeBaseBuilder::new(Arc::new(embedder), ChunkingPolicy::BlockSplit)?;
/// let report = builder.build_file(
///     Path::new("resume.md"),
///     Path::new("knowledge.json"),
///     |progress| println!("{:.0}%", progress.percent_complete()),
/// )?;
/// println!("{} chunks, {} dims", report.chunks, report.dimension);
/// ```
pub struct KnowledgeBaseBuilder {
    embedder: Arc<dyn Embedder>,
    chunker: Box<dyn ChunkingStrategy>,
}

impl KnowledgeBaseBuilder {
    /// Creates a builder for the given embedder and chunking policy.
    pub fn new(embedder: Arc<dyn Embedder>, policy: ChunkingPolicy) -> Result<Self, BuildError> {
        Ok(Self {
            embedder,
            chunker: create_chunker(policy)?,
        })
    }

    /// Chunks and embeds `content`.
    ///
    /// `on_progress` is called once before the first chunk and after every
    /// embedded chunk.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::NoChunks` when chunking yields nothing, and
    /// propagates the first embedding failure; nothing is returned for the
    /// chunks embedded before it.
    pub fn build<F>(
        &self,
        content: &str,
        mut on_progress: F,
    ) -> Result<(KnowledgeBase, BuildReport), BuildError>
    where
        F: FnMut(BuildProgress),
    {
        let timer = ProgressTimer::new();

        let text_chunks = self.chunker.chunk(content)?;
        let total_chunks = text_chunks.len();
        debug!(
            "Chunked {} chars into {} chunks with {} chunker",
            content.len(),
            total_chunks,
            self.chunker.name()
        );

        if total_chunks == 0 {
            return Err(BuildError::NoChunks);
        }

        on_progress(BuildProgress::new(0, total_chunks, timer.elapsed_ms()));

        let mut chunks = Vec::with_capacity(total_chunks);
        for (i, text_chunk) in text_chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed_text(&text_chunk.text)?;
            chunks.push(Chunk::new(text_chunk.text, embedding));

            on_progress(BuildProgress::new(i + 1, total_chunks, timer.elapsed_ms()));
        }

        let kb = KnowledgeBase::new(chunks)?;
        let report = BuildReport {
            chunks: kb.len(),
            dimension: kb.dimension().unwrap_or(0),
            elapsed_ms: timer.elapsed_ms(),
        };

        info!(
            "Embedded {} chunks ({} dims) in {}ms",
            report.chunks, report.dimension, report.elapsed_ms
        );

        Ok((kb, report))
    }

    /// Reads `source`, builds the knowledge base and writes it to `output`.
    ///
    /// `output` is only touched once the whole build has succeeded.
    pub fn build_file<F>(
        &self,
        source: &Path,
        output: &Path,
        on_progress: F,
    ) -> Result<BuildReport, BuildError>
    where
        F: FnMut(BuildProgress),
    {
        let content = read_source(source)?;
        let (kb, report) = self.build(&content, on_progress)?;
        write_artifact(&kb, output)?;
        Ok(report)
    }
}
