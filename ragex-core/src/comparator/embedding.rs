//! Cosine distance between embedded responses.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Comparator, Observation, expect_texts};
use crate::backend::Encoder;
use crate::error::{BackendError, Result};
use crate::retriever::cosine_similarity;
use crate::scores::finalize_similarities;

/// Cosine distance between candidate and reference embeddings.
///
/// Candidates and reference are encoded in one batch, reference last.
pub struct EmbeddingComparator {
    name: String,
    encoder: Arc<dyn Encoder>,
}

impl EmbeddingComparator {
    pub fn new(name: impl Into<String>, encoder: Arc<dyn Encoder>) -> Self {
        Self {
            name: name.into(),
            encoder,
        }
    }
}

impl std::fmt::Debug for EmbeddingComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingComparator")
            .field("name", &self.name)
            .field("encoder", &self.encoder.model_name())
            .finish()
    }
}

#[async_trait]
impl Comparator for EmbeddingComparator {
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

        let mut batch: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
        batch.push(reference.to_string());
        debug!(
            encoder = %self.encoder.model_name(),
            texts = batch.len(),
            "Embedding candidates and reference"
        );

        let mut vectors = self.encoder.encode(&batch).await?;
        if vectors.len() != batch.len() {
            return Err(BackendError::ShapeMismatch {
                operation: "encode",
                expected: batch.len(),
                actual: vectors.len(),
            }
            .into());
        }
        let Some(reference_vector) = vectors.pop() else {
            return Ok(Vec::new());
        };

        let similarities: Vec<f64> = vectors
            .iter()
            .map(|v| cosine_similarity(v, &reference_vector) as f64)
            .collect();
        Ok(finalize_similarities(&similarities, normalize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HashingEncoder;
    use crate::scores::round_to;

    #[tokio::test]
    async fn test_identical_text_scores_zero() {
        let comparator = EmbeddingComparator::new("embedding", Arc::new(HashingEncoder::new(64)));
        let scores = comparator
            .compare(
                &"Berlin is the capital".into(),
                &["Berlin is the capital".into(), "Paris is lovely".into()],
                false,
            )
            .await
            .unwrap();
        assert_eq!(round_to(scores[0], 6), 0.0);
        assert!(scores[1] > scores[0]);
    }

    #[tokio::test]
    async fn test_normalized_scores_in_unit_interval() {
        let comparator = EmbeddingComparator::new("embedding", Arc::new(HashingEncoder::new(64)));
        let scores = comparator
            .compare(
                &"the cat sat on the mat".into(),
                &[
                    "the cat sat on the mat".into(),
                    "the cat sat".into(),
                    "dogs bark loudly".into(),
                ],
                true,
            )
            .await
            .unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[2], 1.0);
    }

    #[tokio::test]
    async fn test_scores_rejected() {
        let comparator = EmbeddingComparator::new("embedding", Arc::new(HashingEncoder::new(8)));
        assert!(comparator.compare(&0.5.into(), &[0.1.into()], true).await.is_err());
    }
}
