//! Knowledge-base data model.

use crate::error::KnowledgeBaseError;
use serde::{Deserialize, Serialize};

/// A retrievable passage and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            embedding,
        }
    }
}

/// Ordered, read-only collection of chunks sharing one embedding dimension.
///
/// The artifact on disk is a bare JSON array of `{"text", "embedding"}`
/// records. Construction validates that every embedding is non-empty and
/// that all have the same length; an empty knowledge base is valid and has
/// no dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    chunks: Vec<Chunk>,
    dimension: Option<usize>,
}

impl KnowledgeBase {
    /// Validates and wraps `chunks`, preserving their order.
    pub fn new(chunks: Vec<Chunk>) -> Result<Self, KnowledgeBaseError> {
        let mut dimension = None;

        for (index, chunk) in chunks.iter().enumerate() {
            let actual = chunk.embedding.len();
            if actual == 0 {
                return Err(KnowledgeBaseError::EmptyEmbedding { index });
            }
            match dimension {
                None => dimension = Some(actual),
                Some(expected) if expected != actual => {
                    return Err(KnowledgeBaseError::InconsistentDimensions {
                        index,
                        expected,
                        actual,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(Self { chunks, dimension })
    }

    /// Parses and validates an artifact.
    pub fn from_json(bytes: &[u8]) -> Result<Self, KnowledgeBaseError> {
        let chunks: Vec<Chunk> =
            serde_json::from_slice(bytes).map_err(|e| KnowledgeBaseError::Parse(e.to_string()))?;
        Self::new(chunks)
    }

    /// Serializes to the artifact format.
    pub fn to_json(&self) -> Result<Vec<u8>, KnowledgeBaseError> {
        serde_json::to_vec(&self.chunks).map_err(|e| KnowledgeBaseError::Serialize(e.to_string()))
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimension, `None` for an empty knowledge base.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Checks that a query embedding can be compared with the stored ones.
    ///
    /// Any query is compatible with an empty knowledge base.
    pub fn check_query_dimension(&self, query: &[f32]) -> Result<(), KnowledgeBaseError> {
        match self.dimension {
            Some(expected) if expected != query.len() => {
                Err(KnowledgeBaseError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artifact() {
        let json = br#"[
            {"text": "Worked at Acme 2019-2021", "embedding": [1.0, 0.0]},
            {"text": "Studied CS at State U", "embedding": [0, 1]}
        ]"#;
        let kb = KnowledgeBase::from_json(json).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.dimension(), Some(2));
        assert_eq!(kb.chunks()[1].text, "Studied CS at State U");
        assert_eq!(kb.chunks()[1].embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn test_inconsistent_dimensions_rejected() {
        let json = br#"[
            {"text": "a", "embedding": [1.0, 0.0]},
            {"text": "b", "embedding": [1.0, 0.0, 0.0]}
        ]"#;
        let err = KnowledgeBase::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::InconsistentDimensions {
                index: 1,
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_empty_embedding_rejected() {
        let err = KnowledgeBase::new(vec![Chunk::new("a", vec![])]).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::EmptyEmbedding { index: 0 }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            KnowledgeBase::from_json(b"{\"text\": \"a\"}"),
            Err(KnowledgeBaseError::Parse(_))
        ));
        assert!(matches!(
            KnowledgeBase::from_json(br#"[{"text": "a"}]"#),
            Err(KnowledgeBaseError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_knowledge_base() {
        let kb = KnowledgeBase::from_json(b"[]").unwrap();
        assert!(kb.is_empty());
        assert_eq!(kb.dimension(), None);
        assert!(kb.check_query_dimension(&[0.5; 384]).is_ok());
    }

    #[test]
    fn test_query_dimension_check() {
        let kb = KnowledgeBase::new(vec![Chunk::new("a", vec![1.0, 0.0])]).unwrap();
        assert!(kb.check_query_dimension(&[0.3, 0.7]).is_ok());
        assert!(matches!(
            kb.check_query_dimension(&[0.3, 0.7, 0.1]),
            Err(KnowledgeBaseError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_json_preserves_order_and_text() {
        let kb = KnowledgeBase::new(vec![
            Chunk::new("first \"quoted\"", vec![0.25, 0.5]),
            Chunk::new("second\nline", vec![1.0, -1.0]),
        ])
        .unwrap();
        let parsed = KnowledgeBase::from_json(&kb.to_json().unwrap()).unwrap();
        assert_eq!(parsed, kb);
    }
}
