//! The inference process.
//!
//! A dedicated OS thread owns both models and handles commands strictly in
//! the order they were sent. Results flow back as [`Event`]s on an unbounded
//! channel the session reads asynchronously.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │     Session     │────▶│  Command queue  │────▶│ Inference thread│
//! │  (tokio task)   │     │  (std mpsc)     │     │ (owns models)   │
//! └─────────────────┘     └─────────────────┘     └────────┬────────┘
//!          ▲                                               │
//!          │              ┌─────────────────┐              │
//!          └──────────────│   Event stream  │◀─────────────┘
//!                         │ (tokio mpsc)    │
//!                         └─────────────────┘
//! ```
//!
//! Every failure while handling a command, including a panic inside a model
//! backend, becomes a single `error` event and the thread keeps serving.

use super::loader::ModelLoader;
use super::progress::ProgressReporter;
use super::protocol::{Command, Event, ModelKind};
use crate::embedding::Embedder;
use crate::error::InferenceError;
use crate::generation::{build_messages, CancelToken, GenerationOptions, Generator};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Receiving end of the inference process's events.
pub type EventStream = UnboundedReceiver<Event>;

/// Anything that accepts protocol commands.
///
/// The session talks to the inference process only through this trait.
pub trait CommandSink {
    /// Queues a command.
    fn send(&self, command: Command) -> Result<(), InferenceError>;

    /// Asks the generation currently streaming (or queued) to stop early.
    ///
    /// The stream still ends with `done`.
    fn cancel_generation(&self);
}

/// Snapshot of process statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceStats {
    /// Commands handled since startup
    pub commands_processed: u64,
    /// Commands that ended in an `error` event
    pub commands_failed: u64,
    /// Whether both models are loaded
    pub models_loaded: bool,
}

#[derive(Default)]
struct StatsInner {
    commands_processed: AtomicU64,
    commands_failed: AtomicU64,
    models_loaded: AtomicBool,
}

impl StatsInner {
    fn to_stats(&self) -> InferenceStats {
        InferenceStats {
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            models_loaded: self.models_loaded.load(Ordering::Relaxed),
        }
    }
}

/// A command together with the cancel token of the generation it starts.
struct Envelope {
    command: Command,
    cancel: CancelToken,
}

/// Handle to the inference thread.
///
/// Dropping the handle closes the command queue; the thread finishes the
/// command it is working on and exits.
///
/// # Example
///
/// ```ignore
/// let (process, mut events) = InferenceProcess::spawn(FileModelLoader::new(&model_dir))?;
/// process.send(Command::Load)?;
/// while let Some(event) = events.recv().await {
///     if event == Event::Ready {
///         break;
///     }
/// }
/// ```
pub struct InferenceProcess {
    tx: mpsc::Sender<Envelope>,
    /// Token of the most recently queued `generate`
    current_cancel: Mutex<CancelToken>,
    stats: Arc<StatsInner>,
}

impl InferenceProcess {
    /// Spawns the inference thread with default generation options.
    pub fn spawn<L: ModelLoader>(loader: L) -> Result<(Self, EventStream), InferenceError> {
        Self::spawn_with_options(loader, GenerationOptions::default())
    }

    /// Spawns the inference thread.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::ThreadSpawnFailed` if thread creation fails.
    pub fn spawn_with_options<L: ModelLoader>(
        loader: L,
        options: GenerationOptions,
    ) -> Result<(Self, EventStream), InferenceError> {
        let (tx, rx) = mpsc::channel();
        let (events_tx, events_rx) = unbounded_channel();
        let stats = Arc::new(StatsInner::default());

        let worker = Worker {
            loader,
            models: None,
            events: events_tx,
            options,
            stats: stats.clone(),
        };

        thread::Builder::new()
            .name("inference".to_string())
            .spawn(move || worker.run(rx))
            .map_err(|e| InferenceError::ThreadSpawnFailed(e.to_string()))?;

        info!("Inference process started on a dedicated thread");

        Ok((
            Self {
                tx,
                current_cancel: Mutex::new(CancelToken::new()),
                stats,
            },
            events_rx,
        ))
    }

    /// Returns current statistics.
    pub fn stats(&self) -> InferenceStats {
        self.stats.to_stats()
    }
}

impl CommandSink for InferenceProcess {
    fn send(&self, command: Command) -> Result<(), InferenceError> {
        let cancel = CancelToken::new();
        if matches!(command, Command::Generate { .. }) {
            let mut current = self
                .current_cancel
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *current = cancel.clone();
        }

        self.tx
            .send(Envelope { command, cancel })
            .map_err(|_| InferenceError::ChannelDisconnected)
    }

    fn cancel_generation(&self) {
        self.current_cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cancel();
    }
}

struct LoadedModels {
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
}

/// State owned by the inference thread.
struct Worker<L> {
    loader: L,
    models: Option<LoadedModels>,
    events: UnboundedSender<Event>,
    options: GenerationOptions,
    stats: Arc<StatsInner>,
}

impl<L: ModelLoader> Worker<L> {
    fn run(mut self, rx: mpsc::Receiver<Envelope>) {
        info!("Inference thread started");

        while let Ok(Envelope { command, cancel }) = rx.recv() {
            let kind = command.kind();
            debug!("Processing {} command", kind);

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handle(command, &cancel)));
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(payload) => Some(InferenceError::Panicked(panic_message(payload.as_ref()))),
            };

            self.stats.commands_processed.fetch_add(1, Ordering::Relaxed);
            if let Some(e) = failure {
                error!("{} command failed: {}", kind, e);
                self.stats.commands_failed.fetch_add(1, Ordering::Relaxed);
                self.emit(Event::Error {
                    message: e.to_string(),
                });
            }
        }

        info!("Inference command channel disconnected, shutting down");
    }

    fn emit(&self, event: Event) {
        // The session may already be gone; nothing left to report to.
        let _ = self.events.send(event);
    }

    fn handle(&mut self, command: Command, cancel: &CancelToken) -> Result<(), InferenceError> {
        match command {
            Command::Load => self.load(),
            Command::Embed { query } => self.embed(query),
            Command::Generate {
                query,
                chunks,
                persona,
            } => self.generate(&query, &chunks, &persona, cancel),
        }
    }

    fn load(&mut self) -> Result<(), InferenceError> {
        if let Some(models) = &self.models {
            debug!("Models already loaded");
            let name = models.generator.model_id().to_string();
            self.emit(Event::Ready);
            self.emit(Event::ModelInfo { name });
            return Ok(());
        }

        let events = self.events.clone();
        let mut emit = move |event: Event| {
            let _ = events.send(event);
        };

        let embedder = {
            let mut reporter = ProgressReporter::new(ModelKind::Embed, &mut emit);
            let embedder = self.loader.load_embedder(&mut |p| reporter.report(p))?;
            reporter.finish();
            embedder
        };

        let generator = {
            let mut reporter = ProgressReporter::new(ModelKind::Llm, &mut emit);
            let generator = self.loader.load_generator(&mut |p| reporter.report(p))?;
            reporter.finish();
            generator
        };

        let name = generator.model_id().to_string();
        info!(
            "Models loaded: {} ({} dims), {}",
            embedder.model_id(),
            embedder.embedding_dim(),
            name
        );

        self.models = Some(LoadedModels {
            embedder,
            generator,
        });
        self.stats.models_loaded.store(true, Ordering::Relaxed);

        self.emit(Event::Ready);
        self.emit(Event::ModelInfo { name });
        Ok(())
    }

    fn embed(&mut self, query: String) -> Result<(), InferenceError> {
        let models = self.models.as_ref().ok_or(InferenceError::ModelsNotLoaded)?;
        let embedding = models.embedder.embed_text(&query)?;
        self.emit(Event::Embedding { embedding, query });
        Ok(())
    }

    fn generate(
        &mut self,
        query: &str,
        chunks: &[String],
        persona: &str,
        cancel: &CancelToken,
    ) -> Result<(), InferenceError> {
        let models = self.models.as_mut().ok_or(InferenceError::ModelsNotLoaded)?;
        let messages = build_messages(persona, query, chunks);

        let events = &self.events;
        let stats = models.generator.generate(
            &messages,
            &self.options,
            cancel,
            &mut |text: &str| {
                if !text.is_empty() {
                    let _ = events.send(Event::Token {
                        text: text.to_string(),
                    });
                }
            },
        )?;

        if stats.cancelled {
            warn!(
                "Generation cancelled after {} tokens",
                stats.tokens_generated
            );
        }

        self.emit(Event::Done);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
