//! Character-level edit and similarity metrics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Comparator, Observation, expect_texts};
use crate::error::Result;
use crate::scores::finalize_similarities;

/// Normalized string similarity measures, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexicalMetric {
    Hamming,
    Levenshtein,
    DamerauLevenshtein,
    Jaro,
    JaroWinkler,
    /// Longest common subsequence.
    LcsSeq,
    /// Longest common substring.
    LcsStr,
}

impl LexicalMetric {
    pub const ALL: [LexicalMetric; 7] = [
        LexicalMetric::Hamming,
        LexicalMetric::Levenshtein,
        LexicalMetric::DamerauLevenshtein,
        LexicalMetric::Jaro,
        LexicalMetric::JaroWinkler,
        LexicalMetric::LcsSeq,
        LexicalMetric::LcsStr,
    ];

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        match self {
            LexicalMetric::Hamming => hamming_similarity(a, b),
            LexicalMetric::Levenshtein => strsim::normalized_levenshtein(a, b),
            LexicalMetric::DamerauLevenshtein => strsim::normalized_damerau_levenshtein(a, b),
            LexicalMetric::Jaro => strsim::jaro(a, b),
            LexicalMetric::JaroWinkler => strsim::jaro_winkler(a, b),
            LexicalMetric::LcsSeq => lcs_seq_similarity(a, b),
            LexicalMetric::LcsStr => lcs_str_similarity(a, b),
        }
    }
}

/// Positional mismatches plus the length difference, over the longer length.
fn hamming_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let mismatches = a.iter().zip(&b).filter(|(x, y)| x != y).count() + a.len().abs_diff(b.len());
    1.0 - mismatches as f64 / longest as f64
}

fn lcs_seq_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in &a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()] as f64 / longest as f64
}

fn lcs_str_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    let mut best = 0;
    for x in &a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y { prev[j] + 1 } else { 0 };
            best = best.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best as f64 / longest as f64
}

/// Edit-distance style comparator: `1 - similarity`, optionally normalized first.
#[derive(Debug, Clone)]
pub struct LexicalComparator {
    name: String,
    metric: LexicalMetric,
}

impl LexicalComparator {
    pub fn new(name: impl Into<String>, metric: LexicalMetric) -> Self {
        Self {
            name: name.into(),
            metric,
        }
    }

    pub fn levenshtein() -> Self {
        Self::new("levenshtein_comparator", LexicalMetric::Levenshtein)
    }

    pub fn jaro_winkler() -> Self {
        Self::new("jaro_winkler_comparator", LexicalMetric::JaroWinkler)
    }

    pub fn metric(&self) -> LexicalMetric {
        self.metric
    }

    pub fn compare_texts(&self, reference: &str, candidates: &[&str], normalize: bool) -> Vec<f64> {
        let similarities: Vec<f64> = candidates
            .iter()
            .map(|c| self.metric.similarity(c, reference))
            .collect();
        finalize_similarities(&similarities, normalize)
    }
}

#[async_trait]
impl Comparator for LexicalComparator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn compare(
        &self,
        reference: &Observation,
        candidates: &[Observation],
        normalize: bool,
    ) -> Result<Vec<f64>> {
        let (reference, candidates) = expect_texts(&self.name, reference, candidates)?;
        Ok(self.compare_texts(reference, &candidates, normalize))
    }
}
