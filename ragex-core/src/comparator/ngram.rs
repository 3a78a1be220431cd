//! Word n-gram overlap comparator.

use std::collections::HashSet;

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use super::{Comparator, Observation, expect_texts};
use crate::error::Result;
use crate::scores::normalize_scores;

/// Jaccard distance between the unique word n-gram sets of two texts.
///
/// Already a distance, so it is never inverted. When either text has no
/// n-grams the distance is 0.
#[derive(Debug, Clone)]
pub struct NGramOverlapComparator {
    n: usize,
}

impl NGramOverlapComparator {
    pub fn new(n: usize) -> Self {
        Self { n: n.max(1) }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Words and punctuation marks; whitespace is dropped.
    fn tokens(text: &str) -> Vec<&str> {
        text.split_word_bounds()
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    pub fn distance(&self, reference: &str, candidate: &str) -> f64 {
        let reference_tokens = Self::tokens(reference);
        let candidate_tokens = Self::tokens(candidate);
        let a: HashSet<&[&str]> = reference_tokens.windows(self.n).collect();
        let b: HashSet<&[&str]> = candidate_tokens.windows(self.n).collect();
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let intersection = a.intersection(&b).count();
        let union = a.union(&b).count();
        1.0 - intersection as f64 / union as f64
    }

    pub fn compare_texts(&self, reference: &str, candidates: &[&str], normalize: bool) -> Vec<f64> {
        let distances: Vec<f64> = candidates
            .iter()
            .map(|c| self.distance(reference, c))
            .collect();
        if normalize {
            normalize_scores(&distances)
        } else {
            distances
        }
    }
}

impl Default for NGramOverlapComparator {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl Comparator for NGramOverlapComparator {
    fn name(&self) -> &str {
        "n_gram_comparator"
    }

    async fn compare(
        &self,
        reference: &Observation,
        candidates: &[Observation],
        normalize: bool,
    ) -> Result<Vec<f64>> {
        let (reference, candidates) = expect_texts(self.name(), reference, candidates)?;
        Ok(self.compare_texts(reference, &candidates, normalize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::round_to;

    #[test]
    fn test_bigram_fixture() {
        let comparator = NGramOverlapComparator::default();
        let scores = comparator.compare_texts("I am a big fan", &["I am a tennis fan"], true);
        assert_eq!(round_to(scores[0], 4), 0.6667);
    }

    #[test]
    fn test_no_ngrams_is_zero_distance() {
        let comparator = NGramOverlapComparator::default();
        assert_eq!(comparator.distance("hello", "hello world"), 0.0);
        assert_eq!(comparator.distance("", ""), 0.0);
    }

    #[test]
    fn test_punctuation_counts_as_token() {
        let comparator = NGramOverlapComparator::new(1);
        assert_eq!(comparator.distance("yes!", "yes"), 0.5);
    }

    #[test]
    fn test_disjoint_texts_are_maximally_distant() {
        let comparator = NGramOverlapComparator::default();
        let scores = comparator.compare_texts("a b c", &["a b c", "x y z"], false);
        assert_eq!(scores, vec![0.0, 1.0]);
    }
}
