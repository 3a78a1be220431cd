//! Relevance-score drops for retriever targets.

use async_trait::async_trait;

use super::{Comparator, Observation, expect_scores};
use crate::error::Result;
use crate::scores::normalize_scores;

/// Drop in relevance score: `reference - candidate`.
///
/// A perturbation that lowers the retrieval score a lot gets a high score.
/// The delta already points the right way, so it is not inverted.
#[derive(Debug, Clone, Default)]
pub struct ScoreComparator;

impl ScoreComparator {
    pub fn new() -> Self {
        Self
    }

    pub fn compare_scores(&self, reference: f64, candidates: &[f64], normalize: bool) -> Vec<f64> {
        let deltas: Vec<f64> = candidates.iter().map(|c| reference - c).collect();
        if normalize {
            normalize_scores(&deltas)
        } else {
            deltas
        }
    }
}

#[async_trait]
impl Comparator for ScoreComparator {
    fn name(&self) -> &str {
        "score_comparator"
    }

    fn observation_kind(&self) -> &'static str {
        "score"
    }

    async fn compare(
        &self,
        reference: &Observation,
        candidates: &[Observation],
        normalize: bool,
    ) -> Result<Vec<f64>> {
        let (reference, candidates) = expect_scores(self.name(), reference, candidates)?;
        Ok(self.compare_scores(reference, &candidates, normalize))
    }
}
