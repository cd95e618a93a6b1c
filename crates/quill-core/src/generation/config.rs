//! Configuration for the generation model and decoding options.

use crate::config::{DEFAULT_MAX_NEW_TOKENS, DEFAULT_SEED, GENERATION_MODEL_ID};
use serde::{Deserialize, Serialize};

/// ChatML end-of-turn marker used by SmolLM2 instruct models.
pub const END_OF_TURN: &str = "<|im_end|>";

/// Configuration for SmolLM (Llama architecture) instruct models.
///
/// The transformer shape comes from the model's `config.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmolLmConfig {
    /// Model identifier, reported to the session as `modelInfo`
    pub model_id: String,

    /// Token that closes an assistant turn; generation stops on it
    pub end_of_turn: String,
}

impl Default for SmolLmConfig {
    fn default() -> Self {
        Self {
            model_id: GENERATION_MODEL_ID.to_string(),
            end_of_turn: END_OF_TURN.to_string(),
        }
    }
}

/// Decoding options for one answer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens
    pub max_new_tokens: usize,

    /// Pick the most likely token at every step (no sampling)
    pub greedy: bool,

    /// Sampling temperature, ignored when `greedy` is set
    pub temperature: f64,

    /// Seed for the sampler
    pub seed: u64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            greedy: true,
            temperature: 0.7,
            seed: DEFAULT_SEED,
        }
    }
}

impl GenerationOptions {
    /// Temperature handed to the logits processor; `None` selects argmax.
    pub fn sampling_temperature(&self) -> Option<f64> {
        if self.greedy {
            None
        } else {
            Some(self.temperature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_greedy() {
        let options = GenerationOptions::default();
        assert_eq!(options.max_new_tokens, 300);
        assert!(options.greedy);
        assert_eq!(options.sampling_temperature(), None);
    }

    #[test]
    fn test_sampling_temperature() {
        let options = GenerationOptions {
            greedy: false,
            temperature: 0.5,
            ..Default::default()
        };
        assert_eq!(options.sampling_temperature(), Some(0.5));
    }

    #[test]
    fn test_smollm_default() {
        let config = SmolLmConfig::default();
        assert_eq!(config.model_id, "HuggingFaceTB/SmolLM2-360M-Instruct");
        assert_eq!(config.end_of_turn, "<|im_end|>");
    }
}
