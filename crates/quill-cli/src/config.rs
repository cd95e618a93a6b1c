//! Configuration and path resolution for the CLI.
//!
//! Handles finding model files and the knowledge base across environments:
//! - Development: workspace assets directory
//! - Distribution: relative to executable
//! - Custom: environment variable or flags

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use quill_core::inference::ModelFiles;
use std::path::{Path, PathBuf};

/// Knowledge base file name
const KNOWLEDGE_FILENAME: &str = "knowledge.json";

/// Environment variable for custom model directory
const MODEL_DIR_ENV: &str = "QUILL_MODEL_DIR";

/// Subdirectories holding each model
const EMBED_SUBDIR: &str = "embed";
const LLM_SUBDIR: &str = "llm";

/// Whether `dir` has an `embed/` model with all of its files.
fn has_models(dir: &Path) -> bool {
    ModelFiles::in_dir(&dir.join(EMBED_SUBDIR)).validate().is_ok()
}

/// Finds the model directory containing `embed/` and `llm/`.
///
/// Search order:
/// 1. `--model-dir` flag
/// 2. `$QUILL_MODEL_DIR` environment variable
/// 3. Workspace `assets/models/` directory (development)
/// 4. Executable-relative `../assets/models/` or `assets/models/`
///
/// Only the embedding model is checked here; the inference process reports
/// a missing generation model when it loads.
pub fn find_model_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
        let path = PathBuf::from(dir);
        if has_models(&path) {
            return Ok(path);
        }
    }

    // CARGO_MANIFEST_DIR points to crates/quill-cli
    let workspace_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.join("assets/models"));

    if let Some(ref path) = workspace_path {
        if has_models(path) {
            return Ok(path.clone());
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            for candidate in [exe_dir.join("../assets/models"), exe_dir.join("assets/models")] {
                if has_models(&candidate) {
                    return Ok(candidate);
                }
            }
        }
    }

    Err(anyhow!(
        "Model files not found.\n\
         Expected {}/{{model.safetensors,tokenizer.json,config.json}} and the same under {}/.\n\
         Searched locations:\n\
         - ${} environment variable\n\
         - {}\n\
         - Relative to executable",
        EMBED_SUBDIR,
        LLM_SUBDIR,
        MODEL_DIR_ENV,
        workspace_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<workspace>/assets/models".to_string())
    ))
}

/// Returns the data directory.
///
/// - macOS: `~/Library/Application Support/dev.quill.Quill/`
/// - Linux: `~/.local/share/quill/`
/// - Windows: `%APPDATA%\quill\Quill\data\`
pub fn get_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "quill", "Quill")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Returns the knowledge base path, `--knowledge` taking precedence.
pub fn knowledge_path(custom_path: Option<&PathBuf>) -> Result<PathBuf> {
    match custom_path {
        Some(path) => Ok(path.clone()),
        None => Ok(get_data_dir()?.join(KNOWLEDGE_FILENAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_model_dir_wins() {
        let custom = PathBuf::from("/tmp/custom-models");
        assert_eq!(find_model_dir(Some(&custom)).unwrap(), custom);
    }

    #[test]
    fn test_has_models_requires_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let embed = dir.path().join(EMBED_SUBDIR);
        std::fs::create_dir_all(&embed).unwrap();
        std::fs::write(embed.join("model.safetensors"), b"").unwrap();
        std::fs::write(embed.join("tokenizer.json"), b"{}").unwrap();
        assert!(!has_models(dir.path()));

        std::fs::write(embed.join("config.json"), b"{}").unwrap();
        assert!(has_models(dir.path()));
    }

    #[test]
    fn test_knowledge_path() {
        let custom = PathBuf::from("/tmp/kb.json");
        assert_eq!(knowledge_path(Some(&custom)).unwrap(), custom);

        let default = knowledge_path(None).unwrap();
        assert!(default.ends_with(KNOWLEDGE_FILENAME));
    }
}
