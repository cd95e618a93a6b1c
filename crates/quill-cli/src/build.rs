//! Build command implementation.
//!
//! Turns a source document into the knowledge base artifact.

use crate::config;
use anyhow::{Context, Result};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use quill_core::chunking::ChunkingPolicy;
use quill_core::embedding::Embedder;
use quill_core::error::BuildError;
use quill_core::inference::{FileModelLoader, ModelLoader};
use quill_core::processing::{read_source, write_artifact, BuildReport, KnowledgeBaseBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Chunking policy selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// One chunk per blank-line separated block
    BlockSplit,
    /// Size-bounded chunks prefixed with their section heading
    HeadingContext,
}

impl PolicyArg {
    pub fn into_policy(self, max_chars: usize) -> ChunkingPolicy {
        match self {
            PolicyArg::BlockSplit => ChunkingPolicy::BlockSplit,
            PolicyArg::HeadingContext => ChunkingPolicy::HeadingContext { max_chars },
        }
    }
}

/// Loads only the embedding model.
fn load_embedder(model_dir: Option<&PathBuf>) -> Result<Arc<dyn Embedder>, BuildError> {
    let model_dir = config::find_model_dir(model_dir)
        .map_err(|e| BuildError::EmbedderUnavailable(e.to_string()))?;
    info!("Loading embedding model from {}", model_dir.display());

    let mut loader = FileModelLoader::new(&model_dir);
    let embedder = loader
        .load_embedder(&mut |_| {})
        .map_err(|e| BuildError::EmbedderUnavailable(e.to_string()))?;
    Ok(Arc::from(embedder))
}

/// Builds the knowledge base and writes it to `output`.
///
/// This function:
/// 1. Reads the source document (fails before any model is loaded)
/// 2. Loads the embedding model
/// 3. Chunks and embeds the document with a progress bar
/// 4. Writes the artifact atomically
///
/// Nothing is written unless every step succeeds.
pub fn execute_build(
    source: &Path,
    output: &Path,
    policy: ChunkingPolicy,
    model_dir: Option<&PathBuf>,
) -> Result<BuildReport> {
    let content = read_source(source)?;
    let embedder = load_embedder(model_dir)?;

    let builder = KnowledgeBaseBuilder::new(embedder, policy)?;

    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}")?);
    pb.set_message("Embedding");

    let (kb, report) = builder.build(&content, |progress| {
        pb.set_length(progress.chunks_total as u64);
        pb.set_position(progress.chunks_completed as u64);
    })?;
    pb.finish_and_clear();

    write_artifact(&kb, output)
        .with_context(|| format!("Failed to write knowledge base: {}", output.display()))?;

    Ok(report)
}

/// One-line summary printed after a successful build.
pub fn format_report(report: &BuildReport, output: &Path) -> String {
    format!(
        "Wrote {} chunks ({} dims) to {} in {:.1}s",
        report.chunks,
        report.dimension,
        output.display(),
        report.elapsed_ms as f64 / 1000.0
    )
}
