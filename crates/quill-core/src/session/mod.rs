//! Session orchestration.
//!
//! ## Core Types
//!
//! - [`SessionOrchestrator`] - Drives a session from the inference event stream
//! - [`Session`] / [`SessionState`] - The single context object and its states
//! - [`Persona`] - Who the answer is written as
//! - [`SessionView`] - Rendering hooks for a front end
//!
//! At most one query is in flight at a time. Submissions that arrive while
//! the session cannot take them are dropped with a [`DropReason`], never
//! queued.

mod orchestrator;
mod persona;
mod state;
mod view;

pub use orchestrator::SessionOrchestrator;
pub use persona::Persona;
pub use state::{Answer, DropReason, Session, SessionState, SubmitOutcome};
pub use view::{error_text, NullView, SessionView};
