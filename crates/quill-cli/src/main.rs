//! Quill CLI - ask questions about a document with local models.
//!
//! # Usage
//!
//! ```bash
//! # Build the knowledge base from a document
//! quill build resume.md
//! quill build notes.md --policy heading-context --max-chars 400
//!
//! # Ask one question
//! quill ask "Where did they work?"
//! quill ask "What did they study?" --persona "pirate"
//!
//! # Interactive session
//! quill chat
//! ```

mod build;
mod config;
mod output;
mod session;

use anyhow::Result;
use build::PolicyArg;
use clap::{Parser, Subcommand};
use quill_core::config::{DEFAULT_CHUNK_CHARS, DEFAULT_MAX_NEW_TOKENS, DEFAULT_SEED};
use quill_core::generation::GenerationOptions;
use quill_core::session::Persona;
use session::SessionPaths;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quill: retrieval-augmented answers from local models.
///
/// Answers are grounded in a knowledge base built from your own document,
/// and nothing leaves this machine.
#[derive(Parser)]
#[command(name = "quill", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Model directory with `embed/` and `llm/` (default: $QUILL_MODEL_DIR or bundled assets)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Knowledge base file (default: platform data directory)
    #[arg(long, global = true)]
    knowledge: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct AnswerArgs {
    /// Persona to answer as (at most three words)
    #[arg(short, long, default_value = "")]
    persona: String,

    /// Maximum number of tokens to generate
    #[arg(long, default_value_t = DEFAULT_MAX_NEW_TOKENS)]
    max_tokens: usize,

    /// Sample instead of greedy decoding
    #[arg(long)]
    sample: bool,

    /// Sampling temperature (with --sample)
    #[arg(long, default_value_t = 0.7)]
    temperature: f64,

    /// Sampling seed (with --sample)
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

impl AnswerArgs {
    fn options(&self) -> GenerationOptions {
        GenerationOptions {
            max_new_tokens: self.max_tokens,
            greedy: !self.sample,
            temperature: self.temperature,
            seed: self.seed,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the knowledge base from a source document
    Build {
        /// Source document (Markdown or plain text)
        source: PathBuf,

        /// Output path (default: --knowledge or the platform data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chunking policy
        #[arg(long, value_enum, default_value_t = PolicyArg::BlockSplit)]
        policy: PolicyArg,

        /// Character budget per chunk for heading-context
        #[arg(long, default_value_t = DEFAULT_CHUNK_CHARS)]
        max_chars: usize,
    },

    /// Answer one question
    Ask {
        /// The question
        query: String,

        #[command(flatten)]
        args: AnswerArgs,
    },

    /// Ask questions interactively
    Chat {
        #[command(flatten)]
        args: AnswerArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean
    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let paths = SessionPaths {
        model_dir: cli.model_dir,
        knowledge: cli.knowledge,
    };

    match cli.command {
        Command::Build {
            source,
            output,
            policy,
            max_chars,
        } => {
            let output = match output {
                Some(path) => path,
                None => config::knowledge_path(paths.knowledge.as_ref())?,
            };
            let report = build::execute_build(
                &source,
                &output,
                policy.into_policy(max_chars),
                paths.model_dir.as_ref(),
            )?;
            println!("{}", build::format_report(&report, &output));
        }
        Command::Ask { query, args } => {
            let persona = Persona::parse(&args.persona);
            session::execute_ask(&query, &persona, &paths, args.options()).await?;
        }
        Command::Chat { args } => {
            let persona = Persona::parse(&args.persona);
            session::execute_chat(persona, &paths, args.options()).await?;
        }
    }

    Ok(())
}
