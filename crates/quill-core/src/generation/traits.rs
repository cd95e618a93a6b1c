use super::cancel::CancelToken;
use super::config::GenerationOptions;
use super::prompt::ChatMessage;
use crate::error::GenerationError;

/// Summary of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Tokens sampled, including the stop token if one was hit
    pub tokens_generated: usize,
    /// Wall-clock time spent generating
    pub elapsed_ms: u64,
    /// Generation stopped because the cancel token was set
    pub cancelled: bool,
}

/// Trait for streaming text generation.
///
/// Implementations are owned by the inference thread and never shared, so
/// only `Send` is required.
pub trait Generator: Send {
    /// Identifier of the underlying model, reported in `modelInfo`.
    fn model_id(&self) -> &str;

    /// Generates a reply to `messages`, calling `on_fragment` with each piece
    /// of text in order.
    ///
    /// Returns once the model emits an end-of-turn token, `max_new_tokens`
    /// is reached, or `cancel` is set. Cancellation is not an error.
    fn generate(
        &mut self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        cancel: &CancelToken,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<GenerationStats, GenerationError>;
}
