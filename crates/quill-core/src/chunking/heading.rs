//! Size-bounded chunking that keeps section headings as context.

use super::{heading_text, is_heading, ChunkingStrategy, TextChunk};
use crate::error::ChunkingError;

/// Accumulates non-blank lines into chunks of at most `max_chars` characters.
///
/// A heading closes the current chunk and becomes the section heading; every
/// chunk in that section starts with the heading text (without `#` markers)
/// so a continuation chunk still says what it is about. A line longer than
/// the budget on its own is kept whole in a chunk of its own.
#[derive(Debug, Clone)]
pub struct HeadingContextChunker {
    max_chars: usize,
}

impl HeadingContextChunker {
    /// # Errors
    ///
    /// Returns `ChunkingError::InvalidConfig` if `max_chars` is zero.
    pub fn new(max_chars: usize) -> Result<Self, ChunkingError> {
        if max_chars == 0 {
            return Err(ChunkingError::InvalidConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        Ok(Self { max_chars })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

/// Chunk under construction.
struct Accumulator<'a> {
    heading: Option<&'a str>,
    lines: Vec<&'a str>,
    chars: usize,
    has_body: bool,
}

impl<'a> Accumulator<'a> {
    fn new() -> Self {
        Self {
            heading: None,
            lines: Vec::new(),
            chars: 0,
            has_body: false,
        }
    }

    /// Starts an empty chunk, prefixed with the current heading if any.
    fn restart(&mut self) {
        self.lines.clear();
        self.chars = 0;
        self.has_body = false;
        if let Some(heading) = self.heading.filter(|h| !h.is_empty()) {
            self.push(heading);
        }
    }

    fn push(&mut self, line: &'a str) {
        if !self.lines.is_empty() {
            self.chars += 1;
        }
        self.chars += line.chars().count();
        self.lines.push(line);
    }

    /// Length of the chunk if `line` were appended.
    fn len_with(&self, line: &str) -> usize {
        let separator = usize::from(!self.lines.is_empty());
        self.chars + separator + line.chars().count()
    }

    /// Emits the chunk unless it holds nothing but a heading.
    fn flush(&mut self, chunks: &mut Vec<TextChunk>) {
        if self.has_body {
            chunks.push(TextChunk::new(chunks.len(), self.lines.join("\n")));
        }
        self.restart();
    }
}

impl ChunkingStrategy for HeadingContextChunker {
    fn chunk(&self, text: &str) -> Result<Vec<TextChunk>, ChunkingError> {
        let mut chunks = Vec::new();
        let mut acc = Accumulator::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if is_heading(line) {
                acc.flush(&mut chunks);
                acc.heading = Some(heading_text(line));
                acc.restart();
                continue;
            }

            if acc.has_body && acc.len_with(line) > self.max_chars {
                acc.flush(&mut chunks);
            }
            acc.push(line);
            acc.has_body = true;
        }
        acc.flush(&mut chunks);

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "heading-context"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(max_chars: usize, input: &str) -> Vec<String> {
        HeadingContextChunker::new(max_chars)
            .unwrap()
            .chunk(input)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect()
    }

    #[test]
    fn test_small_sections_fit_in_one_chunk() {
        let chunks = texts(512, "# Experience\nDid X\n\nDid Y\n# Education\nDid Z");
        assert_eq!(chunks, vec!["Experience\nDid X\nDid Y", "Education\nDid Z"]);
    }

    #[test]
    fn test_continuation_chunks_carry_heading() {
        // "Skills\naaaa\nbbbb" is 16 chars; adding "\ncccc" would make 21.
        let chunks = texts(20, "## Skills\naaaa\nbbbb\ncccc\ndddd");
        assert_eq!(chunks, vec!["Skills\naaaa\nbbbb", "Skills\ncccc\ndddd"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
        }
    }

    #[test]
    fn test_text_before_first_heading_has_no_prefix() {
        let chunks = texts(10, "intro one\nintro two");
        assert_eq!(chunks, vec!["intro one", "intro two"]);
    }

    #[test]
    fn test_oversized_line_stands_alone() {
        let long = "x".repeat(30);
        let input = format!("# H\nshort\n{}\nafter", long);
        let chunks = texts(10, &input);
        assert_eq!(
            chunks,
            vec!["H\nshort".to_string(), format!("H\n{}", long), "H\nafter".to_string()]
        );
    }

    #[test]
    fn test_heading_only_sections_discarded() {
        let chunks = texts(100, "# One\n# Two\nbody\n# Three\n");
        assert_eq!(chunks, vec!["Two\nbody"]);
    }

    #[test]
    fn test_budget_counts_characters_not_bytes() {
        // Each line is 3 chars but 6 bytes.
        let chunks = texts(7, "äöü\néèê");
        assert_eq!(chunks, vec!["äöü\néèê"]);
    }

    #[test]
    fn test_zero_budget_rejected() {
        assert!(HeadingContextChunker::new(0).is_err());
    }
}
