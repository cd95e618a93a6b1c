//! BERT sentence embedding model.
//!
//! Runs a MiniLM-style BERT encoder with Candle and turns the token states
//! into a single sentence vector by mean pooling followed by L2
//! normalization, the same recipe sentence-transformers uses.

use super::config::MiniLmConfig;
use super::tokenizer::TokenizerHandle;
use super::traits::{Embedder, ModelConfig};
use crate::error::EmbeddingError;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tracing::info;

/// BERT embedding model with its tokenizer.
///
/// # Examples
///
/// ```ignore
/// let tokenizer = TokenizerHandle::from_bytes(std::fs::read("tokenizer.json")?, 256)?;
/// let embedder = BertEmbedder::from_bytes(
///     std::fs::read("model.safetensors")?,
///     &std::fs::read("config.json")?,
///     tokenizer,
///     MiniLmConfig::default(),
///     &Device::Cpu,
/// )?;
///
/// let embedding = embedder.embed_text("this is a test")?;
/// assert_eq!(embedding.len(), 384);
/// ```
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: TokenizerHandle,
    config: MiniLmConfig,
    device: Device,
}

impl BertEmbedder {
    /// Creates a new model from safetensors bytes and the model's `config.json`.
    ///
    /// Weights are always loaded in F32; BERT's layer norms are not stable in
    /// half precision.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::InvalidConfig` if `config.json` cannot be
    /// parsed or disagrees with `config.hidden_size`, and
    /// `EmbeddingError::ModelLoad` if the weights cannot be loaded.
    pub fn from_bytes(
        model_bytes: Vec<u8>,
        config_json: &[u8],
        tokenizer: TokenizerHandle,
        config: MiniLmConfig,
        device: &Device,
    ) -> Result<Self, EmbeddingError> {
        info!("Loading embedding model '{}'", config.model_id);
        info!(
            "Model bytes length: {} bytes ({:.2}MB)",
            model_bytes.len(),
            model_bytes.len() as f64 / 1_000_000.0
        );

        let bert_config: BertConfig = serde_json::from_slice(config_json).map_err(|e| {
            EmbeddingError::InvalidConfig(format!("Failed to parse config.json: {}", e))
        })?;

        if bert_config.hidden_size != config.hidden_size {
            return Err(EmbeddingError::InvalidConfig(format!(
                "config.json declares hidden size {}, expected {}",
                bert_config.hidden_size, config.hidden_size
            )));
        }

        info!(
            "Config: {}d hidden, {} layers, {} heads",
            bert_config.hidden_size,
            bert_config.num_hidden_layers,
            bert_config.num_attention_heads
        );

        let vb = VarBuilder::from_buffered_safetensors(model_bytes, DTYPE, device).map_err(
            |e| EmbeddingError::ModelLoad(format!("Failed to create VarBuilder: {}", e)),
        )?;

        let model = BertModel::load(vb, &bert_config)
            .map_err(|e| EmbeddingError::ModelLoad(format!("Failed to create BertModel: {}", e)))?;
        info!("BertModel created successfully");

        Ok(Self {
            model,
            tokenizer,
            config,
            device: device.clone(),
        })
    }

    /// Returns a reference to the config.
    pub fn config(&self) -> &MiniLmConfig {
        &self.config
    }

    /// Runs the encoder on already tokenized input.
    pub fn embed_tokens(&self, token_ids: Vec<u32>) -> Result<Vec<f32>, EmbeddingError> {
        let seq_len = token_ids.len();

        // [1, seq_len]
        let input_ids = Tensor::from_vec(token_ids, seq_len, &self.device)
            .map_err(|e| EmbeddingError::TensorCreation(format!("Failed to create tensor: {}", e)))?
            .unsqueeze(0)
            .map_err(|e| EmbeddingError::TensorCreation(format!("Failed to unsqueeze: {}", e)))?;

        let token_type_ids = input_ids.zeros_like().map_err(|e| {
            EmbeddingError::TensorCreation(format!("Failed to create token types: {}", e))
        })?;
        let attention_mask = input_ids.ones_like().map_err(|e| {
            EmbeddingError::TensorCreation(format!("Failed to create attention mask: {}", e))
        })?;

        // [1, seq_len] -> [1, seq_len, hidden_size]
        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Forward pass failed: {}", e)))?;

        let (_n_sentence, n_tokens, _hidden_size) = hidden_states
            .dims3()
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to get dims: {}", e)))?;

        // [1, seq_len, hidden_size] -> [1, hidden_size]
        let pooled = mean_pool(&hidden_states, n_tokens)?;

        let normalized = if self.config.normalize_embeddings() {
            normalize_l2(&pooled)?
        } else {
            pooled
        };

        let embedding = normalized
            .squeeze(0)
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to squeeze: {}", e)))?
            .to_vec1::<f32>()
            .map_err(|e| {
                EmbeddingError::InferenceFailed(format!("Failed to convert to vec: {}", e))
            })?;

        if embedding.len() != self.config.embedding_dim() {
            return Err(EmbeddingError::InferenceFailed(format!(
                "Model produced {} dimensions, expected {}",
                embedding.len(),
                self.config.embedding_dim()
            )));
        }

        Ok(embedding)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str {
        self.config.model_id()
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim()
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let token_ids = self.tokenizer.tokenize(text)?;
        self.embed_tokens(token_ids)
    }
}

/// Averages token states into one vector per sequence.
///
/// Input is never padded (one sequence per forward pass), so every token
/// counts toward the mean.
fn mean_pool(embeddings: &Tensor, n_tokens: usize) -> Result<Tensor, EmbeddingError> {
    embeddings
        .sum(1)
        .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to sum: {}", e)))?
        .affine(1.0 / n_tokens as f64, 0.0)
        .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to affine: {}", e)))
}

/// Applies L2 normalization to create unit vectors.
fn normalize_l2(v: &Tensor) -> Result<Tensor, EmbeddingError> {
    v.broadcast_div(
        &v.sqr()
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to square: {}", e)))?
            .sum_keepdim(1)
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to sum: {}", e)))?
            .sqrt()
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to sqrt: {}", e)))?,
    )
    .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to normalize: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::word_level_tokenizer_json;

    fn tokenizer() -> TokenizerHandle {
        TokenizerHandle::from_bytes(word_level_tokenizer_json(&["a"]), 8).unwrap()
    }

    #[test]
    fn test_model_load_invalid_config() {
        let result = BertEmbedder::from_bytes(
            vec![1, 2, 3],
            b"{}",
            tokenizer(),
            MiniLmConfig::default(),
            &Device::Cpu,
        );
        assert!(matches!(result, Err(EmbeddingError::InvalidConfig(_))));
    }

    #[test]
    fn test_mean_pool_and_normalize() {
        let states = Tensor::new(&[[[1.0f32, 0.0], [3.0, 4.0]]], &Device::Cpu).unwrap();
        let pooled = mean_pool(&states, 2).unwrap();
        assert_eq!(pooled.to_vec2::<f32>().unwrap(), vec![vec![2.0, 2.0]]);

        let normalized = normalize_l2(&pooled).unwrap().to_vec2::<f32>().unwrap();
        let norm: f32 = normalized[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }
}
