//! Rendering hooks driven by the orchestrator.

use super::state::Answer;
use crate::inference::ModelKind;

/// Receives everything the user should see.
///
/// All methods default to no-ops so a front end only implements what it
/// renders.
pub trait SessionView {
    /// Load progress of one model, non-decreasing per model.
    fn load_progress(&mut self, _model: ModelKind, _progress: f32) {}

    /// Name of the generation model.
    fn model_info(&mut self, _name: &str) {}

    /// Models and knowledge base are loaded; input is accepted from now on.
    fn ready(&mut self, _chunks: usize) {}

    /// An answer is about to stream under `label`.
    fn answer_started(&mut self, _label: &str) {}

    fn token(&mut self, _text: &str) {}

    fn answer_finished(&mut self, _answer: &Answer) {}

    /// Shown in place of the answer, already formatted as `Error: ...`.
    fn answer_failed(&mut self, _text: &str) {}

    /// The session has failed and will not accept further input.
    fn fatal(&mut self, _message: &str) {}
}

/// Answer-area text for a failed command.
pub fn error_text(message: &str) -> String {
    format!("Error: {}", message)
}

/// A view that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl SessionView for NullView {}
