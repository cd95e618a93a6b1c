//! Answer personas.

use crate::config::{DEFAULT_PERSONA, MAX_PERSONA_WORDS};
use std::fmt;

/// A short label the system prompt asks the model to answer as.
///
/// At most [`MAX_PERSONA_WORDS`] whitespace-separated words; anything empty
/// falls back to [`DEFAULT_PERSONA`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Persona(String);

impl Persona {
    /// Normalizes free-form input: extra words are dropped and whitespace
    /// runs collapse to single spaces.
    pub fn parse(input: &str) -> Self {
        let words: Vec<&str> = input.split_whitespace().take(MAX_PERSONA_WORDS).collect();
        if words.is_empty() {
            Self::default()
        } else {
            Self(words.join(" "))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_PERSONA
    }

    /// Header shown above an answer.
    pub fn answer_label(&self) -> String {
        if self.is_default() {
            "Answer".to_string()
        } else {
            format!("Answer · as {}", self.0)
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self(DEFAULT_PERSONA.to_string())
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_at_most_three_words() {
        assert_eq!(Persona::parse("grumpy old pirate captain").as_str(), "grumpy old pirate");
        assert_eq!(Persona::parse("  pirate  ").as_str(), "pirate");
        assert_eq!(Persona::parse("a\t b\n c").as_str(), "a b c");
    }

    #[test]
    fn test_blank_input_falls_back_to_default() {
        for input in ["", "   ", "\n\t"] {
            let persona = Persona::parse(input);
            assert!(persona.is_default());
            assert_eq!(persona.as_str(), "helpful assistant");
        }
    }

    #[test]
    fn test_answer_label() {
        assert_eq!(Persona::default().answer_label(), "Answer");
        assert_eq!(Persona::parse("pirate").answer_label(), "Answer · as pirate");
    }
}
