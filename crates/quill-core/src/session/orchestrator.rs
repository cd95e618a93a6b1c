//! The session orchestrator.
//!
//! Turns the inference event stream into session transitions and view
//! updates, and composes each `generate` from the retrieved context.
//!
//! ```text
//!   Idle ──start──▶ LoadingModels ──ready + KB loaded──▶ Ready
//!                        │                              │   ▲
//!                      error                         submit │
//!                        ▼                              ▼   │ done / error
//!                      Error ◀──dimension mismatch── Embedding ──▶ Generating
//! ```

use super::persona::Persona;
use super::state::{Answer, Session, SessionState, SubmitOutcome};
use super::view::{error_text, SessionView};
use crate::error::SessionError;
use crate::inference::{Command, CommandSink, Event, EventStream};
use crate::knowledge::KnowledgeSource;
use crate::retrieval::{top_k_texts, RetrievalParams};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives one session against an inference process.
pub struct SessionOrchestrator<S, K, V> {
    sink: S,
    source: K,
    view: V,
    session: Session,
    params: RetrievalParams,
    last_answer: Option<Answer>,
    last_error: Option<String>,
}

impl<S, K, V> SessionOrchestrator<S, K, V>
where
    S: CommandSink,
    K: KnowledgeSource,
    V: SessionView,
{
    pub fn new(sink: S, source: K, view: V) -> Self {
        Self {
            sink,
            source,
            view,
            session: Session::new(),
            params: RetrievalParams::default(),
            last_answer: None,
            last_error: None,
        }
    }

    pub fn with_retrieval_params(mut self, params: RetrievalParams) -> Self {
        self.params = params;
        self
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The most recently finished answer of this session.
    pub fn last_answer(&self) -> Option<&Answer> {
        self.last_answer.as_ref()
    }

    /// Why the most recent query failed, if it did.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Starts loading the models.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.session.begin_loading()?;
        if let Err(e) = self.sink.send(Command::Load) {
            return Err(self.fail(e.into()));
        }
        info!("Session started, loading models");
        Ok(())
    }

    /// Submits a query, or drops it if the session cannot take one now.
    ///
    /// The persona is fixed for the whole answer at this point.
    pub fn submit(&mut self, query: &str, persona: &Persona) -> Result<SubmitOutcome, SessionError> {
        let outcome = self.session.begin_query(query, persona.clone());
        match outcome {
            SubmitOutcome::Dropped(reason) => {
                debug!("Dropped submission: {}", reason);
            }
            SubmitOutcome::Accepted => {
                self.last_answer = None;
                self.last_error = None;
                let query = query.trim().to_string();
                debug!("Embedding query ({} chars) as {}", query.len(), persona);
                if let Err(e) = self.sink.send(Command::Embed { query }) {
                    return Err(self.fail(e.into()));
                }
            }
        }
        Ok(outcome)
    }

    /// Cancels the query in flight.
    ///
    /// A streaming answer stops early and still finishes normally; a query
    /// still being embedded is abandoned before anything is generated.
    /// Returns `false` when nothing is in flight.
    pub fn cancel(&mut self) -> bool {
        let generating = self.session.state() == SessionState::Generating;
        if !self.session.cancel() {
            return false;
        }
        if generating {
            self.sink.cancel_generation();
        }
        info!("Cancelled query in flight");
        true
    }

    /// Applies one event from the inference process.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that end the session (model load,
    /// knowledge base, dimension mismatch, channel). The session is in the
    /// `Error` state afterwards.
    pub async fn handle_event(&mut self, event: Event) -> Result<(), SessionError> {
        let state = self.session.state();
        match event {
            Event::Progress { model, progress } => {
                if state == SessionState::LoadingModels {
                    self.view.load_progress(model, progress);
                }
            }
            Event::ModelInfo { name } => {
                self.view.model_info(&name);
                self.session.set_model_name(name);
            }
            Event::Ready => {
                if state == SessionState::LoadingModels {
                    self.load_knowledge().await?;
                } else {
                    debug!("Ignoring ready while {}", state);
                }
            }
            Event::Embedding { embedding, query } => {
                if state == SessionState::Embedding {
                    self.on_embedding(embedding, query)?;
                } else {
                    warn!("Ignoring embedding while {}", state);
                }
            }
            Event::Token { text } => {
                if self.session.push_token(&text).is_ok() {
                    self.view.token(&text);
                } else {
                    warn!("Ignoring token while {}", state);
                }
            }
            Event::Done => {
                if state == SessionState::Generating {
                    let answer = self.session.finish_query()?;
                    debug!("Answer finished ({} chars)", answer.text.len());
                    self.view.answer_finished(&answer);
                    self.last_answer = Some(answer);
                } else {
                    warn!("Ignoring done while {}", state);
                }
            }
            Event::Error { message } => match state {
                SessionState::LoadingModels => {
                    return Err(self.fail(SessionError::ModelLoad(message)));
                }
                SessionState::Embedding | SessionState::Generating => {
                    warn!("Query failed: {}", message);
                    self.session.finish_query()?;
                    self.view.answer_failed(&error_text(&message));
                    self.last_error = Some(message);
                }
                _ => {
                    warn!("Ignoring error while {}: {}", state, message);
                }
            },
        }
        Ok(())
    }

    /// Handles events until models and knowledge base are loaded.
    pub async fn run_until_ready(&mut self, events: &mut EventStream) -> Result<(), SessionError> {
        while self.session.state() == SessionState::LoadingModels {
            let event = self.next_event(events).await?;
            self.handle_event(event).await?;
        }
        match self.session.state() {
            SessionState::Ready => Ok(()),
            state => Err(SessionError::InvalidTransition {
                state,
                action: "become ready",
            }),
        }
    }

    /// Handles events until the query in flight is finished.
    ///
    /// Returns immediately when nothing is in flight.
    pub async fn run_until_idle(&mut self, events: &mut EventStream) -> Result<(), SessionError> {
        while self.session.state().is_busy() {
            let event = self.next_event(events).await?;
            self.handle_event(event).await?;
        }
        Ok(())
    }

    /// Submits a query and waits for its answer.
    ///
    /// Returns `None` if the submission was dropped or the query failed.
    pub async fn ask(
        &mut self,
        events: &mut EventStream,
        query: &str,
        persona: &Persona,
    ) -> Result<Option<Answer>, SessionError> {
        if let SubmitOutcome::Dropped(reason) = self.submit(query, persona)? {
            info!("Query not submitted: {}", reason);
            return Ok(None);
        }
        self.run_until_idle(events).await?;
        Ok(self.last_answer.clone())
    }

    async fn next_event(&mut self, events: &mut EventStream) -> Result<Event, SessionError> {
        match events.recv().await {
            Some(event) => Ok(event),
            None => Err(self.fail(SessionError::EventStreamClosed)),
        }
    }

    async fn load_knowledge(&mut self) -> Result<(), SessionError> {
        match self.source.load().await {
            Ok(kb) => {
                let chunks = kb.len();
                self.session.knowledge_loaded(Arc::new(kb))?;
                info!("Session ready with {} chunks", chunks);
                self.view.ready(chunks);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn on_embedding(&mut self, embedding: Vec<f32>, query: String) -> Result<(), SessionError> {
        let Some(kb) = self.session.knowledge().cloned() else {
            return Err(self.fail(SessionError::InvalidTransition {
                state: self.session.state(),
                action: "retrieve without a knowledge base",
            }));
        };

        if let Err(e) = kb.check_query_dimension(&embedding) {
            return Err(self.fail(e.into()));
        }

        if self.session.is_cancelled() {
            let answer = self.session.finish_query()?;
            debug!("Query cancelled before generation");
            self.view.answer_finished(&answer);
            self.last_answer = Some(answer);
            return Ok(());
        }

        let chunks = top_k_texts(&embedding, &kb, &self.params);
        debug!("Retrieved {} chunks", chunks.len());

        let persona = self
            .session
            .persona()
            .cloned()
            .unwrap_or_default();
        self.session.begin_generation()?;
        self.view.answer_started(&persona.answer_label());

        let command = Command::Generate {
            query,
            chunks,
            persona: persona.as_str().to_string(),
        };
        if let Err(e) = self.sink.send(command) {
            return Err(self.fail(e.into()));
        }
        Ok(())
    }

    /// Ends the session, returning the error for propagation.
    fn fail(&mut self, err: SessionError) -> SessionError {
        error!("Session failed: {}", err);
        let message = err.to_string();
        self.session.fail(message.clone());
        self.view.fatal(&message);
        err
    }
}
