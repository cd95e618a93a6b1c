//! Top-k similarity retrieval.
//!
//! Brute-force cosine similarity over the whole knowledge base. Knowledge
//! bases here are a few hundred chunks at most, so a linear scan is cheaper
//! than maintaining an index.

use crate::config::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};
use crate::knowledge::KnowledgeBase;

/// Retrieval parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// Maximum number of chunks returned
    pub k: usize,
    /// Minimum cosine similarity for a chunk to be returned
    pub min_score: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// A chunk that passed the score threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// Position of the chunk in the knowledge base
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when either vector has zero norm or the lengths differ.
/// The result is clamped to `[-1, 1]` to absorb rounding error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

/// Ranks chunks by similarity to `query`.
///
/// Chunks scoring below `min_score` are dropped, the rest are ordered by
/// descending score with ties kept in knowledge-base order, and at most `k`
/// are returned. The result is never padded.
pub fn rank(query: &[f32], kb: &KnowledgeBase, params: &RetrievalParams) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = kb
        .chunks()
        .iter()
        .enumerate()
        .map(|(index, chunk)| ScoredChunk {
            index,
            text: chunk.text.clone(),
            score: cosine_similarity(query, &chunk.embedding),
        })
        .filter(|c| c.score >= params.min_score)
        .collect();

    // sort_by is stable, so equal scores keep their original order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(params.k);
    scored
}

/// Texts of the top-ranked chunks, best first.
pub fn top_k_texts(query: &[f32], kb: &KnowledgeBase, params: &RetrievalParams) -> Vec<String> {
    rank(query, kb, params)
        .into_iter()
        .map(|c| c.text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Chunk;

    fn kb(chunks: &[(&str, &[f32])]) -> KnowledgeBase {
        KnowledgeBase::new(
            chunks
                .iter()
                .map(|(text, embedding)| Chunk::new(*text, embedding.to_vec()))
                .collect(),
        )
        .unwrap()
    }

    /// Deterministic pseudo-random vectors.
    fn vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                (0..dim)
                    .map(|_| {
                        state = state
                            .wrapping_mul(6364136223846793005)
                            .wrapping_add(1442695040888963407);
                        ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_cosine_known_values() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_symmetric_and_bounded() {
        let vs = vectors(20, 8, 7);
        for a in &vs {
            for b in &vs {
                let ab = cosine_similarity(a, b);
                let ba = cosine_similarity(b, a);
                assert!((ab - ba).abs() < 1e-6);
                assert!((-1.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn test_scenario_single_relevant_chunk() {
        let kb = kb(&[
            ("Worked at Acme 2019-2021", &[1.0, 0.0]),
            ("Studied CS at State U", &[0.0, 1.0]),
        ]);
        let texts = top_k_texts(&[0.9, 0.1], &kb, &RetrievalParams::default());
        assert_eq!(texts, vec!["Worked at Acme 2019-2021"]);
    }

    #[test]
    fn test_results_bounded_thresholded_and_sorted() {
        let vs = vectors(50, 6, 42);
        let chunks: Vec<Chunk> = vs
            .iter()
            .enumerate()
            .map(|(i, v)| Chunk::new(format!("chunk {}", i), v.clone()))
            .collect();
        let kb = KnowledgeBase::new(chunks).unwrap();
        let params = RetrievalParams::default();

        for query in vectors(10, 6, 99) {
            let results = rank(&query, &kb, &params);
            assert!(results.len() <= 4);
            for window in results.windows(2) {
                assert!(window[0].score >= window[1].score);
            }
            for r in &results {
                assert!(r.score >= 0.3);
                assert_eq!(r.text, format!("chunk {}", r.index));
            }
        }
    }

    #[test]
    fn test_ties_keep_original_order() {
        let kb = kb(&[
            ("first", &[1.0, 0.0]),
            ("second", &[2.0, 0.0]),
            ("third", &[0.5, 0.0]),
        ]);
        let params = RetrievalParams { k: 2, min_score: 0.0 };
        let texts = top_k_texts(&[1.0, 0.0], &kb, &params);
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_never_padded() {
        let kb = kb(&[("only", &[1.0, 0.0]), ("other", &[-1.0, 0.0])]);
        let results = rank(&[1.0, 0.0], &kb, &RetrievalParams::default());
        assert_eq!(results.len(), 1);
        assert!(rank(&[0.0, 0.0], &kb, &RetrievalParams::default()).is_empty());
        assert!(rank(&[1.0, 0.0], &KnowledgeBase::default(), &RetrievalParams::default()).is_empty());
    }

    #[test]
    fn test_does_not_mutate_knowledge_base() {
        let kb = kb(&[("b", &[0.0, 1.0]), ("a", &[1.0, 0.0])]);
        let before = kb.clone();
        let _ = rank(&[1.0, 0.0], &kb, &RetrievalParams::default());
        assert_eq!(kb, before);
    }
}
