//! The inference process and its message protocol.
//!
//! ## Core Types
//!
//! - [`InferenceProcess`] - Dedicated thread owning both models
//! - [`Command`] / [`Event`] - The typed message vocabulary
//! - [`CommandSink`] - How the session sends commands
//! - [`ModelLoader`] - How the process obtains its models
//!
//! ## Example
//!
//! ```ignore
//! use quill_core::inference::{Command, CommandSink, FileModelLoader, InferenceProcess};
//!
//! let (process, mut events) = InferenceProcess::spawn(FileModelLoader::new(&model_dir))?;
//! process.send(Command::Load)?;
//! process.send(Command::Embed { query: "What did they study?".into() })?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

mod loader;
mod process;
mod progress;
mod protocol;

pub use loader::{read_with_progress, FileModelLoader, ModelFiles, ModelLoader};
pub use process::{CommandSink, EventStream, InferenceProcess, InferenceStats};
pub use progress::ProgressReporter;
pub use protocol::{Command, Event, ModelKind};
