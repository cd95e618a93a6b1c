//! Source reading and artifact writing for the builder.

use crate::error::BuildError;
use crate::knowledge::KnowledgeBase;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Reads the source document.
///
/// # Errors
///
/// Returns `BuildError::SourceNotFound` when the path does not exist and
/// `BuildError::SourceRead` for any other failure.
pub fn read_source(path: &Path) -> Result<String, BuildError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BuildError::SourceNotFound(path.display().to_string()),
        _ => BuildError::SourceRead(format!("{}: {}", path.display(), e)),
    })
}

/// Writes the knowledge base to `path` atomically.
///
/// The artifact is written to a temporary file in the destination directory
/// and renamed into place, so a failed build never leaves a partial file and
/// an existing artifact is only replaced by a complete one.
pub fn write_artifact(kb: &KnowledgeBase, path: &Path) -> Result<(), BuildError> {
    let bytes = kb.to_json()?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .map_err(|e| BuildError::ArtifactWrite(format!("{}: {}", parent.display(), e)))?;

    let mut file = NamedTempFile::new_in(parent)
        .map_err(|e| BuildError::ArtifactWrite(format!("{}: {}", parent.display(), e)))?;
    file.write_all(&bytes)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| BuildError::ArtifactWrite(e.to_string()))?;
    file.persist(path)
        .map_err(|e| BuildError::ArtifactWrite(format!("{}: {}", path.display(), e.error)))?;

    info!("Wrote {} chunks to {}", kb.len(), path.display());
    Ok(())
}
