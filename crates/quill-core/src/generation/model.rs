//! SmolLM2 text generation with Candle.

use super::cancel::CancelToken;
use super::config::{GenerationOptions, SmolLmConfig};
use super::prompt::{render_chatml, ChatMessage};
use super::stream::TokenOutputStream;
use super::traits::{GenerationStats, Generator};
use crate::error::GenerationError;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use instant::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Llama-architecture instruct model with its tokenizer.
///
/// A fresh KV cache is built for every answer; nothing carries over between
/// questions.
pub struct LlamaGenerator {
    model: Llama,
    model_config: Config,
    tokenizer: Tokenizer,
    eos_tokens: Vec<u32>,
    config: SmolLmConfig,
    device: Device,
    dtype: DType,
}

impl LlamaGenerator {
    /// Creates a generator from safetensors bytes, `config.json` and
    /// `tokenizer.json`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::ModelLoad` if the configuration or weights
    /// cannot be loaded and `GenerationError::TokenizerUnavailable` if the
    /// tokenizer cannot be deserialized.
    pub fn from_bytes(
        model_bytes: Vec<u8>,
        config_json: &[u8],
        tokenizer_bytes: Vec<u8>,
        config: SmolLmConfig,
        device: &Device,
        dtype: DType,
    ) -> Result<Self, GenerationError> {
        info!("Loading generation model '{}'", config.model_id);
        info!(
            "Model bytes length: {} bytes ({:.2}MB), dtype {:?}",
            model_bytes.len(),
            model_bytes.len() as f64 / 1_000_000.0,
            dtype
        );

        let llama_config: LlamaConfig = serde_json::from_slice(config_json).map_err(|e| {
            GenerationError::ModelLoad(format!("Failed to parse config.json: {}", e))
        })?;
        let model_config = llama_config.into_config(false);

        let tokenizer = Tokenizer::from_bytes(tokenizer_bytes).map_err(|e| {
            GenerationError::TokenizerUnavailable(format!("Failed to deserialize tokenizer: {}", e))
        })?;

        let mut eos_tokens = match &model_config.eos_token_id {
            Some(LlamaEosToks::Single(id)) => vec![*id],
            Some(LlamaEosToks::Multiple(ids)) => ids.clone(),
            None => Vec::new(),
        };
        if let Some(id) = tokenizer.token_to_id(&config.end_of_turn) {
            if !eos_tokens.contains(&id) {
                eos_tokens.push(id);
            }
        }
        if eos_tokens.is_empty() {
            return Err(GenerationError::ModelLoad(
                "Model declares no end-of-sequence token".to_string(),
            ));
        }

        let vb = VarBuilder::from_buffered_safetensors(model_bytes, dtype, device).map_err(
            |e| GenerationError::ModelLoad(format!("Failed to create VarBuilder: {}", e)),
        )?;
        let model = Llama::load(vb, &model_config)
            .map_err(|e| GenerationError::ModelLoad(format!("Failed to create Llama: {}", e)))?;

        info!(
            "Llama created: {}d hidden, {} layers, {} context, stop tokens {:?}",
            model_config.hidden_size,
            model_config.num_hidden_layers,
            model_config.max_position_embeddings,
            eos_tokens
        );

        Ok(Self {
            model,
            model_config,
            tokenizer,
            eos_tokens,
            config,
            device: device.clone(),
            dtype,
        })
    }

    fn encode_prompt(&self, messages: &[ChatMessage]) -> Result<Vec<u32>, GenerationError> {
        let prompt = render_chatml(messages);
        let encoding = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| GenerationError::TokenizationFailed(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn next_logits(
        &self,
        input: &[u32],
        index_pos: usize,
        cache: &mut Cache,
    ) -> Result<Tensor, GenerationError> {
        let input = Tensor::new(input, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| GenerationError::InferenceFailed(format!("Failed to build input: {}", e)))?;
        self.model
            .forward(&input, index_pos, cache)
            .and_then(|logits| logits.squeeze(0))
            .and_then(|logits| logits.to_dtype(DType::F32))
            .map_err(|e| GenerationError::InferenceFailed(format!("Forward pass failed: {}", e)))
    }
}

impl Generator for LlamaGenerator {
    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn generate(
        &mut self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        cancel: &CancelToken,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<GenerationStats, GenerationError> {
        let start = Instant::now();
        let mut tokens = self.encode_prompt(messages)?;
        let prompt_len = tokens.len();

        let context_window = self.model_config.max_position_embeddings;
        if prompt_len >= context_window {
            return Err(GenerationError::TokenizationFailed(format!(
                "Prompt is {} tokens, model context is {}",
                prompt_len, context_window
            )));
        }
        let max_new_tokens = options.max_new_tokens.min(context_window - prompt_len);
        debug!(
            "Generating up to {} tokens from a {}-token prompt",
            max_new_tokens, prompt_len
        );

        let mut cache = Cache::new(true, self.dtype, &self.model_config, &self.device)
            .map_err(|e| GenerationError::InferenceFailed(format!("Failed to create cache: {}", e)))?;
        let mut logits_processor =
            LogitsProcessor::new(options.seed, options.sampling_temperature(), None);
        let mut stream = TokenOutputStream::new(&self.tokenizer);

        let mut stats = GenerationStats::default();
        let mut index_pos = 0;

        for step in 0..max_new_tokens {
            if cancel.is_cancelled() {
                debug!("Generation cancelled after {} tokens", stats.tokens_generated);
                stats.cancelled = true;
                break;
            }

            let context_size = if step > 0 { 1 } else { tokens.len() };
            let context = &tokens[tokens.len() - context_size..];
            let logits = self.next_logits(context, index_pos, &mut cache)?;
            index_pos += context.len();

            let next_token = logits_processor
                .sample(&logits)
                .map_err(|e| GenerationError::InferenceFailed(format!("Sampling failed: {}", e)))?;
            tokens.push(next_token);
            stats.tokens_generated += 1;

            if self.eos_tokens.contains(&next_token) {
                break;
            }

            if let Some(fragment) = stream.next_token(next_token)? {
                on_fragment(&fragment);
            }
        }

        if let Some(rest) = stream.decode_rest()? {
            on_fragment(&rest);
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "Generated {} tokens in {}ms",
            stats.tokens_generated, stats.elapsed_ms
        );
        Ok(stats)
    }
}
