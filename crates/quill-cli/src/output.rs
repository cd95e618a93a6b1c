//! Terminal rendering of a session.
//!
//! Load progress and status go to stderr; the streamed answer goes to stdout
//! so it can be piped.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use quill_core::inference::ModelKind;
use quill_core::session::{Answer, SessionView};
use std::io::Write;

const PROGRESS_TEMPLATE: &str = "{msg:>5} [{bar:40}] {pos:>3}%";

/// Renders the session to the terminal.
pub struct TerminalView {
    progress: MultiProgress,
    embed: ProgressBar,
    llm: ProgressBar,
    streamed_any: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        let progress = MultiProgress::new();
        let style = ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let embed = progress.add(ProgressBar::new(100));
        embed.set_style(style.clone());
        embed.set_message(ModelKind::Embed.to_string());

        let llm = progress.add(ProgressBar::new(100));
        llm.set_style(style);
        llm.set_message(ModelKind::Llm.to_string());

        Self {
            progress,
            embed,
            llm,
            streamed_any: false,
        }
    }

    fn bar(&self, model: ModelKind) -> &ProgressBar {
        match model {
            ModelKind::Embed => &self.embed,
            ModelKind::Llm => &self.llm,
        }
    }

    fn clear_progress(&self) {
        self.embed.finish_and_clear();
        self.llm.finish_and_clear();
        let _ = self.progress.clear();
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionView for TerminalView {
    fn load_progress(&mut self, model: ModelKind, progress: f32) {
        self.bar(model).set_position(progress.round() as u64);
    }

    fn model_info(&mut self, name: &str) {
        let _ = self.progress.println(format!("Model: {}", name));
    }

    fn ready(&mut self, chunks: usize) {
        for bar in [&self.embed, &self.llm] {
            bar.set_position(100);
        }
        self.clear_progress();
        eprintln!("Models ready ✓ ({} chunks)", chunks);
    }

    fn answer_started(&mut self, label: &str) {
        self.streamed_any = false;
        println!("\n{}", label);
    }

    fn token(&mut self, text: &str) {
        self.streamed_any = true;
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn answer_finished(&mut self, answer: &Answer) {
        if self.streamed_any {
            println!();
        }
        if answer.cancelled {
            eprintln!("(cancelled)");
        }
    }

    fn answer_failed(&mut self, text: &str) {
        if self.streamed_any {
            println!();
        }
        println!("{}", text);
    }

    fn fatal(&mut self, _message: &str) {
        // The error itself is reported by main
        self.clear_progress();
    }
}
