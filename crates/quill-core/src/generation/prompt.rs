//! Prompt composition.
//!
//! An answer is generated from exactly two messages: a system message that
//! sets the persona and restricts the model to the retrieved context, and a
//! user message carrying the numbered context followed by the question.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder context when retrieval returned nothing.
pub const NO_CONTEXT: &str = "(no relevant context found)";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Renders retrieved chunks as a numbered list, `[1] first\n\n[2] second`.
pub fn render_context(chunks: &[String]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {}", i + 1, chunk))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// System prompt asserting the persona.
pub fn system_prompt(persona: &str) -> String {
    format!(
        "You are acting as: {}. Answer only from the provided numbered context. Be concise and accurate.",
        persona
    )
}

/// Builds the system and user messages for one answer.
pub fn build_messages(persona: &str, query: &str, chunks: &[String]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(persona)),
        ChatMessage::user(format!(
            "Context:\n{}\n\nQuestion: {}",
            render_context(chunks),
            query
        )),
    ]
}

/// Frames messages with the ChatML template and opens the assistant turn.
pub fn render_chatml(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str(&format!(
            "<|im_start|>{}\n{}<|im_end|>\n",
            message.role, message.content
        ));
    }
    prompt.push_str("<|im_start|>assistant\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_context_numbers_chunks() {
        let chunks = vec!["Worked at Acme".to_string(), "Studied CS".to_string()];
        assert_eq!(render_context(&chunks), "[1] Worked at Acme\n\n[2] Studied CS");
    }

    #[test]
    fn test_render_context_empty() {
        assert_eq!(render_context(&[]), NO_CONTEXT);
    }

    #[test]
    fn test_build_messages() {
        let messages = build_messages("pirate", "Where did they work?", &["Acme".to_string()]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.starts_with("You are acting as: pirate."));
        assert!(messages[0].content.contains("numbered context"));
        assert_eq!(
            messages[1].content,
            "Context:\n[1] Acme\n\nQuestion: Where did they work?"
        );
    }

    #[test]
    fn test_system_prompt_multi_word_persona() {
        assert!(system_prompt("old sea captain").starts_with("You are acting as: old sea captain."));
    }

    #[test]
    fn test_render_chatml() {
        let prompt = render_chatml(&[ChatMessage::system("sys"), ChatMessage::user("hi")]);
        assert_eq!(
            prompt,
            "<|im_start|>system\nsys<|im_end|>\n<|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\n"
        );
    }
}
