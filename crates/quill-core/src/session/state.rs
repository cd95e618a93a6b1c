//! Session state and the single context object that owns it.

use super::persona::Persona;
use crate::error::SessionError;
use crate::knowledge::KnowledgeBase;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    LoadingModels,
    Ready,
    Embedding,
    Generating,
    /// Terminal; the session cannot recover
    Error,
}

impl SessionState {
    /// Whether a query is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Embedding | SessionState::Generating)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::LoadingModels => "loading models",
            SessionState::Ready => "ready",
            SessionState::Embedding => "embedding",
            SessionState::Generating => "generating",
            SessionState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Why a submission was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The query was empty after trimming
    EmptyQuery,
    /// Models or knowledge base are not loaded yet
    NotReady,
    /// Another query is in flight
    Busy,
    /// The session has failed
    Failed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::EmptyQuery => write!(f, "empty query"),
            DropReason::NotReady => write!(f, "not ready"),
            DropReason::Busy => write!(f, "a query is already in flight"),
            DropReason::Failed => write!(f, "session failed"),
        }
    }
}

/// Result of submitting a query.
///
/// A dropped submission is never queued and nothing is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Dropped(DropReason),
}

/// A finished (or abandoned) answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub query: String,
    pub persona: Persona,
    /// Concatenated tokens in receipt order
    pub text: String,
    pub cancelled: bool,
}

/// The query currently being answered.
#[derive(Debug, Clone)]
struct InFlight {
    query: String,
    persona: Persona,
    text: String,
    cancelled: bool,
}

/// Everything the orchestrator knows about the session.
///
/// State only changes through the transition methods, each of which checks
/// the state it starts from.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    knowledge: Option<Arc<KnowledgeBase>>,
    in_flight: Option<InFlight>,
    model_name: Option<String>,
    failure: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn knowledge(&self) -> Option<&Arc<KnowledgeBase>> {
        self.knowledge.as_ref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    /// Message of the failure that ended the session.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Persona of the query in flight.
    pub fn persona(&self) -> Option<&Persona> {
        self.in_flight.as_ref().map(|q| &q.persona)
    }

    /// Text streamed so far for the query in flight.
    pub fn partial_answer(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|q| q.text.as_str())
    }

    pub fn is_cancelled(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|q| q.cancelled)
    }

    fn expect_state(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    /// `Idle -> LoadingModels`
    pub fn begin_loading(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle, "start")?;
        self.state = SessionState::LoadingModels;
        Ok(())
    }

    pub fn set_model_name(&mut self, name: impl Into<String>) {
        self.model_name = Some(name.into());
    }

    /// `LoadingModels -> Ready`, once the knowledge base is in memory.
    pub fn knowledge_loaded(&mut self, kb: Arc<KnowledgeBase>) -> Result<(), SessionError> {
        self.expect_state(SessionState::LoadingModels, "finish loading")?;
        self.knowledge = Some(kb);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// `Ready -> Embedding`, or a named no-op when a precondition fails.
    pub fn begin_query(&mut self, query: &str, persona: Persona) -> SubmitOutcome {
        let query = query.trim();
        let reason = match self.state {
            SessionState::Error => Some(DropReason::Failed),
            SessionState::Embedding | SessionState::Generating => Some(DropReason::Busy),
            SessionState::Idle | SessionState::LoadingModels => Some(DropReason::NotReady),
            SessionState::Ready if self.knowledge.is_none() => Some(DropReason::NotReady),
            SessionState::Ready if query.is_empty() => Some(DropReason::EmptyQuery),
            SessionState::Ready => None,
        };
        if let Some(reason) = reason {
            return SubmitOutcome::Dropped(reason);
        }

        self.in_flight = Some(InFlight {
            query: query.to_string(),
            persona,
            text: String::new(),
            cancelled: false,
        });
        self.state = SessionState::Embedding;
        SubmitOutcome::Accepted
    }

    /// `Embedding -> Generating`
    pub fn begin_generation(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Embedding, "generate")?;
        self.state = SessionState::Generating;
        Ok(())
    }

    /// Appends a streamed fragment to the answer in flight.
    pub fn push_token(&mut self, text: &str) -> Result<(), SessionError> {
        self.expect_state(SessionState::Generating, "stream tokens")?;
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.text.push_str(text);
        }
        Ok(())
    }

    /// Marks the query in flight as cancelled.
    ///
    /// Returns `false` if nothing is in flight.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.as_mut() {
            Some(in_flight) if self.state.is_busy() => {
                in_flight.cancelled = true;
                true
            }
            _ => false,
        }
    }

    /// `Embedding | Generating -> Ready`, returning the answer.
    pub fn finish_query(&mut self) -> Result<Answer, SessionError> {
        if !self.state.is_busy() {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action: "finish an answer",
            });
        }
        self.state = SessionState::Ready;
        let in_flight = self.in_flight.take().ok_or(SessionError::InvalidTransition {
            state: SessionState::Ready,
            action: "finish an answer",
        })?;
        Ok(Answer {
            query: in_flight.query,
            persona: in_flight.persona,
            text: in_flight.text,
            cancelled: in_flight.cancelled,
        })
    }

    /// Moves to the terminal `Error` state.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.in_flight = None;
        self.failure = Some(message.into());
        self.state = SessionState::Error;
    }
}
