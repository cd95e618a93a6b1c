//! Model loading for the inference process.
//!
//! [`ModelLoader`] is the seam between the inference thread and the model
//! backends: the process only asks for an embedder and a generator and
//! forwards the progress they report.

use crate::config::EMBEDDING_MAX_TOKENS;
use crate::device::{select_device, select_dtype, DeviceType};
use crate::embedding::{BertEmbedder, Embedder, MiniLmConfig, TokenizerHandle};
use crate::error::{AssetError, InferenceError};
use crate::generation::{Generator, LlamaGenerator, SmolLmConfig};
use candle_core::Device;
use once_cell::sync::OnceCell;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Read granularity for weight files.
const READ_CHUNK_BYTES: usize = 1 << 20;

/// Share of a model's progress spent reading weights; the rest covers
/// building the model.
const READ_PROGRESS_SHARE: f32 = 90.0;

/// Loads the two models on the inference thread.
///
/// `progress` takes a percentage in `0..=100`. Values need not be monotonic;
/// the process smooths them before emitting events.
pub trait ModelLoader: Send + 'static {
    fn load_embedder(
        &mut self,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn Embedder>, InferenceError>;

    fn load_generator(
        &mut self,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn Generator>, InferenceError>;
}

/// Files making up one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub weights: PathBuf,
    pub tokenizer: PathBuf,
    pub config: PathBuf,
}

impl ModelFiles {
    /// Standard layout: `model.safetensors`, `tokenizer.json` and
    /// `config.json` in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            weights: dir.join("model.safetensors"),
            tokenizer: dir.join("tokenizer.json"),
            config: dir.join("config.json"),
        }
    }

    /// Checks that every file exists.
    pub fn validate(&self) -> Result<(), AssetError> {
        let missing: Vec<String> = [&self.weights, &self.tokenizer, &self.config]
            .into_iter()
            .filter(|path| !path.is_file())
            .map(|path| path.display().to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AssetError::NotFound(missing.join(", ")))
        }
    }
}

/// Reads a file, reporting the fraction read as a percentage.
pub fn read_with_progress(
    path: &Path,
    progress: &mut dyn FnMut(f32),
) -> Result<Vec<u8>, AssetError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AssetError::NotFound(path.display().to_string()),
        _ => AssetError::LoadFailed(format!("{}: {}", path.display(), e)),
    })?;
    let total = file
        .metadata()
        .map(|m| m.len() as usize)
        .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?;

    let mut bytes = Vec::with_capacity(total);
    let mut buffer = vec![0u8; READ_CHUNK_BYTES];
    progress(0.0);
    loop {
        let n = file
            .read(&mut buffer)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&buffer[..n]);
        if total > 0 {
            progress((bytes.len() as f32 / total as f32 * 100.0).min(100.0));
        }
    }
    progress(100.0);

    Ok(bytes)
}

fn read_small(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AssetError::NotFound(path.display().to_string()),
        _ => AssetError::LoadFailed(format!("{}: {}", path.display(), e)),
    })
}

/// Loads MiniLM and SmolLM2 from a model directory.
///
/// The compute device is selected on first use, on the thread that loads
/// the models.
pub struct FileModelLoader {
    embed: ModelFiles,
    llm: ModelFiles,
    device: OnceCell<(Device, DeviceType)>,
}

impl FileModelLoader {
    /// Expects `embed/` and `llm/` subdirectories under `model_dir`.
    pub fn new(model_dir: &Path) -> Self {
        Self::from_files(
            ModelFiles::in_dir(&model_dir.join("embed")),
            ModelFiles::in_dir(&model_dir.join("llm")),
        )
    }

    pub fn from_files(embed: ModelFiles, llm: ModelFiles) -> Self {
        Self {
            embed,
            llm,
            device: OnceCell::new(),
        }
    }

    fn device(&self) -> &(Device, DeviceType) {
        self.device.get_or_init(select_device)
    }
}

impl ModelLoader for FileModelLoader {
    fn load_embedder(
        &mut self,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn Embedder>, InferenceError> {
        self.embed.validate()?;
        let (device, _) = self.device();

        let weights = read_with_progress(&self.embed.weights, &mut |p| {
            progress(p * READ_PROGRESS_SHARE / 100.0)
        })?;
        let config_json = read_small(&self.embed.config)?;
        let tokenizer = TokenizerHandle::from_bytes(
            read_small(&self.embed.tokenizer)?,
            EMBEDDING_MAX_TOKENS,
        )?;

        let embedder = BertEmbedder::from_bytes(
            weights,
            &config_json,
            tokenizer,
            MiniLmConfig::default(),
            device,
        )?;
        progress(100.0);
        info!("Embedding model ready ({} dims)", embedder.embedding_dim());

        Ok(Box::new(embedder))
    }

    fn load_generator(
        &mut self,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn Generator>, InferenceError> {
        self.llm.validate()?;
        let (device, device_type) = self.device();

        let weights = read_with_progress(&self.llm.weights, &mut |p| {
            progress(p * READ_PROGRESS_SHARE / 100.0)
        })?;
        let config_json = read_small(&self.llm.config)?;
        let tokenizer_bytes = read_small(&self.llm.tokenizer)?;

        let generator = LlamaGenerator::from_bytes(
            weights,
            &config_json,
            tokenizer_bytes,
            SmolLmConfig::default(),
            device,
            select_dtype(*device_type),
        )?;
        progress(100.0);
        info!("Generation model ready on {}", device_type);

        Ok(Box::new(generator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_files_layout() {
        let files = ModelFiles::in_dir(Path::new("/models/embed"));
        assert_eq!(files.weights, Path::new("/models/embed/model.safetensors"));
        assert_eq!(files.tokenizer, Path::new("/models/embed/tokenizer.json"));
        assert_eq!(files.config, Path::new("/models/embed/config.json"));
    }

    #[test]
    fn test_validate_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();

        let err = ModelFiles::in_dir(dir.path()).validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("model.safetensors"));
        assert!(message.contains("tokenizer.json"));
        assert!(!message.contains("config.json"));
    }

    #[test]
    fn test_read_with_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.bin");
        let data = vec![7u8; READ_CHUNK_BYTES * 2 + 10];
        std::fs::write(&path, &data).unwrap();

        let mut reported = Vec::new();
        let bytes = read_with_progress(&path, &mut |p| reported.push(p)).unwrap();

        assert_eq!(bytes, data);
        assert_eq!(reported.first(), Some(&0.0));
        assert_eq!(reported.last(), Some(&100.0));
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_missing_model_dir_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = FileModelLoader::new(dir.path());
        let result = loader.load_embedder(&mut |_| {});
        assert!(matches!(result, Err(InferenceError::ModelLoadFailed(_))));
    }
}
