//! Knowledge-base loading.
//!
//! The session loads the knowledge base exactly once, after the models
//! report ready. [`KnowledgeSource`] hides where the artifact comes from.

use super::types::KnowledgeBase;
use crate::error::KnowledgeBaseError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Trait for fetching and parsing the knowledge-base artifact.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Loads and validates the whole knowledge base.
    async fn load(&self) -> Result<KnowledgeBase, KnowledgeBaseError>;
}

/// Reads the artifact from a JSON file.
#[derive(Debug, Clone)]
pub struct FileKnowledgeSource {
    path: PathBuf,
}

impl FileKnowledgeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KnowledgeSource for FileKnowledgeSource {
    async fn load(&self) -> Result<KnowledgeBase, KnowledgeBaseError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| KnowledgeBaseError::Read(format!("{}: {}", self.path.display(), e)))?;
        let kb = KnowledgeBase::from_json(&bytes)?;
        info!(
            "Loaded {} chunks ({} dims) from {}",
            kb.len(),
            kb.dimension().unwrap_or(0),
            self.path.display()
        );
        Ok(kb)
    }
}

/// Serves an already built knowledge base.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeSource {
    kb: KnowledgeBase,
}

impl InMemoryKnowledgeSource {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl KnowledgeSource for InMemoryKnowledgeSource {
    async fn load(&self) -> Result<KnowledgeBase, KnowledgeBaseError> {
        Ok(self.kb.clone())
    }
}
