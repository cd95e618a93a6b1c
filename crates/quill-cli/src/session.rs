//! Ask and chat command implementations.
//!
//! Both spawn the inference process, wait for the models and the knowledge
//! base, then drive the session orchestrator from the event stream. Ctrl-C
//! cancels the answer being streamed.

use crate::config;
use crate::output::TerminalView;
use anyhow::{anyhow, bail, Context, Result};
use quill_core::error::SessionError;
use quill_core::generation::GenerationOptions;
use quill_core::inference::{CommandSink, EventStream, FileModelLoader, InferenceProcess};
use quill_core::knowledge::{FileKnowledgeSource, KnowledgeSource};
use quill_core::session::{DropReason, Persona, SessionOrchestrator, SessionView, SubmitOutcome};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

type Session = SessionOrchestrator<InferenceProcess, FileKnowledgeSource, TerminalView>;

/// Where models and the knowledge base come from.
#[derive(Debug, Clone, Default)]
pub struct SessionPaths {
    pub model_dir: Option<PathBuf>,
    pub knowledge: Option<PathBuf>,
}

/// Starts a session and waits until it accepts questions.
async fn start_session(
    paths: &SessionPaths,
    options: GenerationOptions,
) -> Result<(Session, EventStream)> {
    let knowledge = config::knowledge_path(paths.knowledge.as_ref())?;
    if !knowledge.exists() {
        return Err(anyhow!(
            "No knowledge base found at {}.\n\
             Build one first with `quill build <source>`.",
            knowledge.display()
        ));
    }
    let model_dir = config::find_model_dir(paths.model_dir.as_ref())?;
    info!("Using models from {}", model_dir.display());

    let (process, mut events) =
        InferenceProcess::spawn_with_options(FileModelLoader::new(&model_dir), options)
            .context("Failed to start inference process")?;
    let mut session = SessionOrchestrator::new(
        process,
        FileKnowledgeSource::new(knowledge),
        TerminalView::new(),
    );

    session.start()?;
    session
        .run_until_ready(&mut events)
        .await
        .context("Session failed to start")?;

    Ok((session, events))
}

/// Handles events until the query in flight finishes, cancelling on Ctrl-C.
async fn drive_answer<S, K, V>(
    session: &mut SessionOrchestrator<S, K, V>,
    events: &mut EventStream,
) -> Result<()>
where
    S: CommandSink,
    K: KnowledgeSource,
    V: SessionView,
{
    while session.state().is_busy() {
        tokio::select! {
            event = events.recv() => {
                let event = event.ok_or(SessionError::EventStreamClosed)?;
                session.handle_event(event).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                session.cancel();
            }
        }
    }
    Ok(())
}

/// Submits one question and waits for its answer.
///
/// Fails when the question is dropped or the answer ends in an error; the
/// error has already been shown in the answer area by then.
async fn answer_once<S, K, V>(
    session: &mut SessionOrchestrator<S, K, V>,
    events: &mut EventStream,
    query: &str,
    persona: &Persona,
) -> Result<()>
where
    S: CommandSink,
    K: KnowledgeSource,
    V: SessionView,
{
    if let SubmitOutcome::Dropped(reason) = session.submit(query, persona)? {
        bail!("Question not submitted: {}", reason);
    }
    drive_answer(session, events).await?;

    if session.last_answer().is_none() {
        bail!(
            "Answer failed: {}",
            session.last_error().unwrap_or("no answer was produced")
        );
    }
    Ok(())
}

/// Answers a single question.
pub async fn execute_ask(
    query: &str,
    persona: &Persona,
    paths: &SessionPaths,
    options: GenerationOptions,
) -> Result<()> {
    let (mut session, mut events) = start_session(paths, options).await?;
    answer_once(&mut session, &mut events, query, persona).await
}

/// A line typed in chat mode.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Question(String),
    SetPersona(Persona),
    Quit,
}

fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("/persona") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return ChatInput::SetPersona(Persona::parse(rest));
        }
    }
    if line == "/quit" || line == "/exit" {
        return ChatInput::Quit;
    }
    ChatInput::Question(line.to_string())
}

fn prompt() {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "\n> ");
    let _ = stdout.flush();
}

/// Interactive mode: one question per line while answers stream.
///
/// Lines typed while an answer is streaming are dropped, never queued.
/// `/persona <words>` changes the persona for later questions.
pub async fn execute_chat(
    persona: Persona,
    paths: &SessionPaths,
    options: GenerationOptions,
) -> Result<()> {
    let (mut session, mut events) = start_session(paths, options).await?;
    let mut persona = persona;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("Ask a question. /persona <words> to change persona, /quit to leave.");
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    // EOF: let the current answer finish
                    drive_answer(&mut session, &mut events).await?;
                    break;
                };
                match parse_chat_input(&line) {
                    ChatInput::Quit => break,
                    ChatInput::SetPersona(next) => {
                        eprintln!("Persona: {}", next);
                        persona = next;
                        prompt();
                    }
                    ChatInput::Question(query) => match session.submit(&query, &persona)? {
                        SubmitOutcome::Accepted => {}
                        SubmitOutcome::Dropped(DropReason::EmptyQuery) => prompt(),
                        SubmitOutcome::Dropped(reason) => {
                            debug!("Ignored input: {}", reason);
                        }
                    },
                }
            }
            event = events.recv() => {
                let event = event.ok_or(SessionError::EventStreamClosed)?;
                let was_busy = session.state().is_busy();
                session.handle_event(event).await?;
                if was_busy && !session.state().is_busy() {
                    prompt();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if !session.cancel() {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::embedding::Embedder;
    use quill_core::error::{EmbeddingError, GenerationError, InferenceError};
    use quill_core::generation::{CancelToken, ChatMessage, GenerationStats, Generator};
    use quill_core::inference::ModelLoader;
    use quill_core::knowledge::{Chunk, InMemoryKnowledgeSource, KnowledgeBase};
    use quill_core::session::NullView;

    #[test]
    fn test_parse_chat_input() {
        assert_eq!(
            parse_chat_input("  where did they work? "),
            ChatInput::Question("where did they work?".to_string())
        );
        assert_eq!(
            parse_chat_input("/persona grumpy old sea captain"),
            ChatInput::SetPersona(Persona::parse("grumpy old sea"))
        );
        assert_eq!(
            parse_chat_input("/persona"),
            ChatInput::SetPersona(Persona::default())
        );
        assert_eq!(parse_chat_input("/quit"), ChatInput::Quit);
    }

    #[test]
    fn test_persona_command_needs_word_boundary() {
        assert_eq!(
            parse_chat_input("/personality test"),
            ChatInput::Question("/personality test".to_string())
        );
        assert_eq!(
            parse_chat_input("/persona\tpirate"),
            ChatInput::SetPersona(Persona::parse("pirate"))
        );
    }

    struct OfflineEmbedder;

    impl Embedder for OfflineEmbedder {
        fn model_id(&self) -> &str {
            "offline-embedder"
        }

        fn embedding_dim(&self) -> usize {
            2
        }

        fn embed_text(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::InferenceFailed("embedder offline".to_string()))
        }
    }

    struct SilentGenerator;

    impl Generator for SilentGenerator {
        fn model_id(&self) -> &str {
            "silent-llm"
        }

        fn generate(
            &mut self,
            _messages: &[ChatMessage],
            _options: &GenerationOptions,
            _cancel: &CancelToken,
            _on_fragment: &mut dyn FnMut(&str),
        ) -> Result<GenerationStats, GenerationError> {
            Ok(GenerationStats::default())
        }
    }

    struct OfflineLoader;

    impl ModelLoader for OfflineLoader {
        fn load_embedder(
            &mut self,
            _progress: &mut dyn FnMut(f32),
        ) -> Result<Box<dyn Embedder>, InferenceError> {
            Ok(Box::new(OfflineEmbedder))
        }

        fn load_generator(
            &mut self,
            _progress: &mut dyn FnMut(f32),
        ) -> Result<Box<dyn Generator>, InferenceError> {
            Ok(Box::new(SilentGenerator))
        }
    }

    async fn ready_session() -> (
        SessionOrchestrator<InferenceProcess, InMemoryKnowledgeSource, NullView>,
        EventStream,
    ) {
        let (process, mut events) = InferenceProcess::spawn(OfflineLoader).unwrap();
        let kb = KnowledgeBase::new(vec![Chunk::new("Worked at Acme", vec![1.0, 0.0])]).unwrap();
        let mut session =
            SessionOrchestrator::new(process, InMemoryKnowledgeSource::new(kb), NullView);
        session.start().unwrap();
        session.run_until_ready(&mut events).await.unwrap();
        (session, events)
    }

    #[tokio::test]
    async fn test_failed_answer_is_an_error() {
        let (mut session, mut events) = ready_session().await;

        let err = answer_once(&mut session, &mut events, "where?", &Persona::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("embedder offline"));
        assert!(session.last_answer().is_none());
    }

    #[tokio::test]
    async fn test_empty_question_is_an_error() {
        let (mut session, mut events) = ready_session().await;

        let err = answer_once(&mut session, &mut events, "   ", &Persona::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not submitted"));
    }

    #[tokio::test]
    async fn test_missing_knowledge_base_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SessionPaths {
            model_dir: Some(dir.path().to_path_buf()),
            knowledge: Some(dir.path().join("knowledge.json")),
        };
        let err = execute_ask("q", &Persona::default(), &paths, GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No knowledge base found"));
    }
}
