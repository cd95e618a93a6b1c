//! Test utilities for quill-core.
//!
//! Deterministic stand-ins for the models and the inference channel, so unit
//! tests never need model files. Only compiled when running tests.

use crate::embedding::Embedder;
use crate::error::{EmbeddingError, GenerationError, InferenceError};
use crate::generation::{CancelToken, ChatMessage, GenerationOptions, GenerationStats, Generator, Role};
use crate::inference::{Command, CommandSink, Event, EventStream, ModelKind, ModelLoader};
use crate::session::{Answer, SessionView};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serialized WordLevel tokenizer with `[UNK]` as id 0 and `words` as ids
/// `1..`, split on whitespace. Without a decoder, decoding joins tokens with
/// spaces.
pub fn word_level_tokenizer_json(words: &[&str]) -> Vec<u8> {
    let mut vocab = serde_json::Map::new();
    vocab.insert("[UNK]".to_string(), json!(0));
    for (i, word) in words.iter().enumerate() {
        vocab.insert(word.to_string(), json!(i + 1));
    }

    let tokenizer = json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    });
    serde_json::to_vec(&tokenizer).expect("tokenizer JSON serializes")
}

/// Bag-of-words embedder: each lowercase word bumps one hashed dimension,
/// then the vector is L2-normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        "hash-embedder"
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dim];
        for word in text.split_whitespace() {
            // FNV-1a
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| {
                    (h ^ u64::from(b)).wrapping_mul(0x100000001b3)
                });
            vector[(hash % self.dim as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

/// Embedder whose every call fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing-embedder"
    }

    fn embedding_dim(&self) -> usize {
        8
    }

    fn embed_text(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::InferenceFailed("embedder offline".to_string()))
    }
}

/// Generator that answers `As a {persona}: {chunks}` from its prompt,
/// one word per fragment.
#[derive(Debug, Clone, Default)]
pub struct EchoGenerator {
    /// Panic instead of answering
    pub panics: bool,
    /// Stream `tick` fragments until cancelled
    pub endless: bool,
}

impl EchoGenerator {
    fn answer(messages: &[ChatMessage]) -> String {
        let persona = messages
            .iter()
            .find(|m| m.role == Role::System)
            .and_then(|m| m.content.strip_prefix("You are acting as: "))
            .and_then(|rest| rest.split(". ").next())
            .unwrap_or_default()
            .to_string();

        let context: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .flat_map(|m| m.content.lines())
            .filter(|line| line.starts_with('['))
            .filter_map(|line| line.split_once("] ").map(|(_, text)| text))
            .collect();

        format!("As a {}: {}", persona, context.join(" "))
    }
}

impl Generator for EchoGenerator {
    fn model_id(&self) -> &str {
        "fake-llm"
    }

    fn generate(
        &mut self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        cancel: &CancelToken,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<GenerationStats, GenerationError> {
        if self.panics {
            panic!("generator exploded");
        }

        let mut stats = GenerationStats::default();
        if self.endless {
            while !cancel.is_cancelled() {
                on_fragment("tick ");
                stats.tokens_generated += 1;
                std::thread::sleep(Duration::from_millis(1));
            }
            stats.cancelled = true;
            return Ok(stats);
        }

        let answer = Self::answer(messages);
        for (i, word) in answer.split(' ').enumerate() {
            if cancel.is_cancelled() || stats.tokens_generated >= options.max_new_tokens {
                stats.cancelled = cancel.is_cancelled();
                break;
            }
            if i == 0 {
                on_fragment(word);
            } else {
                on_fragment(&format!(" {}", word));
            }
            stats.tokens_generated += 1;
        }
        Ok(stats)
    }
}

/// How a fake model load ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadBehavior {
    #[default]
    Succeed,
    Fail,
}

/// Loader producing [`HashEmbedder`] (8 dims) and [`EchoGenerator`].
#[derive(Debug, Clone, Default)]
pub struct FakeLoader {
    pub embed_load: LoadBehavior,
    pub llm_load: LoadBehavior,
    pub generate_panics: bool,
    pub endless_generation: bool,
}

impl FakeLoader {
    fn step(behavior: LoadBehavior, model: ModelKind, progress: &mut dyn FnMut(f32)) -> Result<(), InferenceError> {
        for p in [0.0, 40.0, 30.0, 80.0] {
            progress(p);
        }
        match behavior {
            LoadBehavior::Succeed => Ok(()),
            LoadBehavior::Fail => Err(InferenceError::ModelLoadFailed(format!(
                "{} weights missing",
                model
            ))),
        }
    }
}

impl ModelLoader for FakeLoader {
    fn load_embedder(
        &mut self,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn Embedder>, InferenceError> {
        Self::step(self.embed_load, ModelKind::Embed, progress)?;
        Ok(Box::new(HashEmbedder::new(8)))
    }

    fn load_generator(
        &mut self,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn Generator>, InferenceError> {
        Self::step(self.llm_load, ModelKind::Llm, progress)?;
        Ok(Box::new(EchoGenerator {
            panics: self.generate_panics,
            endless: self.endless_generation,
        }))
    }
}

/// Receives events until one matches `stop`, returning everything received
/// including the match. Panics after five seconds.
pub async fn collect_until<F>(events: &mut EventStream, stop: F) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut received = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let event = tokio::time::timeout_at(deadline, events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream closed");
        let done = stop(&event);
        received.push(event);
        if done {
            return received;
        }
    }
}

/// Command sink that records what it was sent.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<Command>>,
    cancels: AtomicUsize,
}

impl RecordingSink {
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.commands().iter().map(Command::kind).collect()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl CommandSink for RecordingSink {
    fn send(&self, command: Command) -> Result<(), InferenceError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }

    fn cancel_generation(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// View that records every call as a line of text.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub calls: Vec<String>,
    pub answers: Vec<Answer>,
}

impl SessionView for RecordingView {
    fn load_progress(&mut self, model: ModelKind, progress: f32) {
        self.calls.push(format!("progress {} {}", model, progress));
    }

    fn model_info(&mut self, name: &str) {
        self.calls.push(format!("model {}", name));
    }

    fn ready(&mut self, chunks: usize) {
        self.calls.push(format!("ready {}", chunks));
    }

    fn answer_started(&mut self, label: &str) {
        self.calls.push(format!("start {}", label));
    }

    fn token(&mut self, text: &str) {
        self.calls.push(format!("token {}", text));
    }

    fn answer_finished(&mut self, answer: &Answer) {
        self.calls.push("finish".to_string());
        self.answers.push(answer.clone());
    }

    fn answer_failed(&mut self, text: &str) {
        self.calls.push(format!("failed {}", text));
    }

    fn fatal(&mut self, message: &str) {
        self.calls.push(format!("fatal {}", message));
    }
}
