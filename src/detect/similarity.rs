//! Pluggable comment-to-code similarity measures.

use std::collections::BTreeSet;

use crate::error::{EngineError, EngineResult};

/// Similarity between the content words of a comment and the words of the
/// code it documents, in `[0, 1]`.
pub trait SimilarityScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, comment_words: &BTreeSet<String>, code_words: &BTreeSet<String>) -> f64;
}

/// Share of comment words that also occur in the code.
pub struct TokenOverlap;

impl SimilarityScorer for TokenOverlap {
    fn name(&self) -> &'static str {
        "token_overlap"
    }

    fn score(&self, comment_words: &BTreeSet<String>, code_words: &BTreeSet<String>) -> f64 {
        if comment_words.is_empty() {
            return 0.0;
        }
        let shared = comment_words.intersection(code_words).count();
        shared as f64 / comment_words.len() as f64
    }
}

/// Jaccard index of the two word sets.
pub struct Jaccard;

impl SimilarityScorer for Jaccard {
    fn name(&self) -> &'static str {
        "jaccard"
    }

    fn score(&self, comment_words: &BTreeSet<String>, code_words: &BTreeSet<String>) -> f64 {
        if comment_words.is_empty() {
            return 0.0;
        }
        let shared = comment_words.intersection(code_words).count();
        let union = comment_words.union(code_words).count();
        shared as f64 / union as f64
    }
}

/// Look up a scorer by its configuration name.
pub fn scorer_by_name(name: &str) -> EngineResult<Box<dyn SimilarityScorer>> {
    match name {
        "token_overlap" => Ok(Box::new(TokenOverlap)),
        "jaccard" => Ok(Box::new(Jaccard)),
        other => Err(EngineError::Config(format!(
            "unknown similarity_scorer {:?}, expected \"token_overlap\" or \"jaccard\"",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_token_overlap() {
        let comment = words(&["sum", "item", "price"]);
        let code = words(&["sum", "item", "total", "quantity"]);
        let score = TokenOverlap.score(&comment, &code);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_jaccard() {
        let comment = words(&["sum", "item"]);
        let code = words(&["sum", "total"]);
        assert!((Jaccard.score(&comment, &code) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_comment_scores_zero() {
        let code = words(&["sum"]);
        assert_eq!(TokenOverlap.score(&BTreeSet::new(), &code), 0.0);
        assert_eq!(Jaccard.score(&BTreeSet::new(), &code), 0.0);
    }

    #[test]
    fn test_scorer_by_name() {
        assert_eq!(scorer_by_name("jaccard").unwrap().name(), "jaccard");
        assert!(matches!(scorer_by_name("cosine"), Err(EngineError::Config(_))));
    }
}
