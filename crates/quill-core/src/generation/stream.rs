//! Incremental detokenization.
//!
//! Byte-level BPE tokens do not map one-to-one onto characters, so decoding
//! tokens one at a time can split a multi-byte character. [`TokenOutputStream`]
//! re-decodes a sliding window and only releases text once it decodes
//! cleanly.

use crate::error::GenerationError;
use tokenizers::Tokenizer;

const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Turns a stream of token ids into a stream of text fragments.
///
/// Concatenating every fragment returned by [`next_token`](Self::next_token)
/// followed by [`decode_rest`](Self::decode_rest) yields the decoded text of
/// all tokens.
pub struct TokenOutputStream<'a> {
    tokenizer: &'a Tokenizer,
    tokens: Vec<u32>,
    prev_index: usize,
    current_index: usize,
}

impl<'a> TokenOutputStream<'a> {
    pub fn new(tokenizer: &'a Tokenizer) -> Self {
        Self {
            tokenizer,
            tokens: Vec::new(),
            prev_index: 0,
            current_index: 0,
        }
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, GenerationError> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(|e| GenerationError::DecodeFailed(e.to_string()))
    }

    /// Pushes a token and returns the newly completed text, if any.
    pub fn next_token(&mut self, token: u32) -> Result<Option<String>, GenerationError> {
        let prev_text = if self.tokens.is_empty() {
            String::new()
        } else {
            self.decode(&self.tokens[self.prev_index..self.current_index])?
        };
        self.tokens.push(token);
        let text = self.decode(&self.tokens[self.prev_index..])?;

        if text.len() <= prev_text.len() || text.ends_with(REPLACEMENT_CHAR) {
            return Ok(None);
        }

        match text.get(prev_text.len()..) {
            Some(fragment) if text.starts_with(&prev_text) => {
                let fragment = fragment.to_string();
                self.prev_index = self.current_index;
                self.current_index = self.tokens.len();
                Ok(Some(fragment))
            }
            _ => Ok(None),
        }
    }

    /// Returns whatever text is still held back.
    pub fn decode_rest(&self) -> Result<Option<String>, GenerationError> {
        let prev_text = if self.tokens.is_empty() {
            String::new()
        } else {
            self.decode(&self.tokens[self.prev_index..self.current_index])?
        };
        let text = self.decode(&self.tokens[self.prev_index..])?;

        if text.len() > prev_text.len() {
            Ok(text.get(prev_text.len()..).map(str::to_string))
        } else {
            Ok(None)
        }
    }

    /// Number of tokens pushed so far.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::word_level_tokenizer_json;

    fn tokenizer() -> Tokenizer {
        Tokenizer::from_bytes(word_level_tokenizer_json(&["hello", "world", "\u{FFFD}"])).unwrap()
    }

    #[test]
    fn test_fragments_reconstruct_text() {
        let tokenizer = tokenizer();
        let mut stream = TokenOutputStream::new(&tokenizer);

        let mut fragments = Vec::new();
        for token in [1, 2, 1] {
            if let Some(fragment) = stream.next_token(token).unwrap() {
                fragments.push(fragment);
            }
        }
        if let Some(rest) = stream.decode_rest().unwrap() {
            fragments.push(rest);
        }

        assert_eq!(fragments, vec!["hello", " world", " hello"]);
        assert_eq!(fragments.concat(), "hello world hello");
        assert_eq!(stream.len(), 3);
    }

    #[test]
    fn test_incomplete_text_is_held_back_then_flushed() {
        let tokenizer = tokenizer();
        let mut stream = TokenOutputStream::new(&tokenizer);

        assert_eq!(stream.next_token(1).unwrap().as_deref(), Some("hello"));
        assert_eq!(stream.next_token(3).unwrap(), None);
        assert_eq!(
            stream.decode_rest().unwrap().as_deref(),
            Some(" \u{FFFD}")
        );
    }

    #[test]
    fn test_empty_stream_has_nothing_to_flush() {
        let tokenizer = tokenizer();
        let stream = TokenOutputStream::new(&tokenizer);
        assert!(stream.is_empty());
        assert_eq!(stream.decode_rest().unwrap(), None);
    }
}
