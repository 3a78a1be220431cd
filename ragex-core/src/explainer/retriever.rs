//! Retriever explanations over the top retrieved document.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::ExplanationSteps;
use crate::comparator::{Comparator, Observation};
use crate::error::{BackendError, ExplanationError, Result};
use crate::perturber::Perturber;
use crate::retriever::Retriever;
use crate::tokenizer::Tokenizer;
use crate::types::{ExplanationRequest, Granularity};

/// Top document of the baseline retrieval and its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieverReference {
    pub document: String,
    pub score: f64,
}

/// Explains a retriever.
///
/// Features come from the top retrieved document. The perturbed variants of
/// that document form a replacement corpus; the query is re-scored against
/// it and each score is compared with the baseline score.
pub struct RetrieverExplainer {
    tokenizer: Arc<dyn Tokenizer>,
    perturber: Arc<dyn Perturber>,
    comparator: Arc<dyn Comparator>,
    retriever: Arc<dyn Retriever>,
    reference_top_k: usize,
}

impl RetrieverExplainer {
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        perturber: Arc<dyn Perturber>,
        comparator: Arc<dyn Comparator>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        Self {
            tokenizer,
            perturber,
            comparator,
            retriever,
            reference_top_k: 3,
        }
    }

    pub fn with_reference_top_k(mut self, top_k: usize) -> Self {
        self.reference_top_k = top_k.max(1);
        self
    }
}

impl std::fmt::Debug for RetrieverExplainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverExplainer")
            .field("tokenizer", &self.tokenizer.name())
            .field("perturber", &self.perturber.name())
            .field("comparator", &self.comparator.name())
            .field("retriever", &self.retriever.model_name())
            .field("reference_top_k", &self.reference_top_k)
            .finish()
    }
}

#[async_trait]
impl ExplanationSteps for RetrieverExplainer {
    type Reference = RetrieverReference;

    fn name(&self) -> &str {
        "generic_retriever_explainer"
    }

    async fn get_reference(&self, request: &ExplanationRequest) -> Result<RetrieverReference> {
        let retrieved = self
            .retriever
            .retrieve(&request.user_input, self.reference_top_k)
            .await?;
        let top = retrieved
            .into_iter()
            .next()
            .ok_or_else(|| ExplanationError::NoReference {
                reason: "retriever corpus is empty".to_string(),
            })?;
        debug!(corpus_index = top.corpus_index, score = top.score, "Baseline document retrieved");
        Ok(RetrieverReference {
            document: top.document,
            score: top.score as f64,
        })
    }

    fn get_features(
        &self,
        _input_text: &str,
        reference: &RetrieverReference,
        granularity: Granularity,
    ) -> Vec<String> {
        self.tokenizer.tokenize(&reference.document, granularity)
    }

    async fn get_perturbations(
        &self,
        _input_text: &str,
        reference: &RetrieverReference,
        features: &[String],
    ) -> Result<Vec<String>> {
        self.perturber.perturb(&reference.document, features).await
    }

    /// Scores of the query against the perturbed documents, in perturbation order.
    async fn get_post_perturbation_results(
        &self,
        input_text: &str,
        perturbations: &[String],
    ) -> Result<Vec<Observation>> {
        let corpus = self.retriever.encode_corpus(perturbations.to_vec()).await?;
        let hits = self.retriever.search(input_text, &corpus, corpus.len()).await?;

        let mut aligned: Vec<Option<f64>> = vec![None; corpus.len()];
        for hit in &hits {
            if let Some(slot) = aligned.get_mut(hit.corpus_index) {
                *slot = Some(hit.score as f64);
            }
        }
        let scores = aligned
            .into_iter()
            .collect::<Option<Vec<f64>>>()
            .ok_or(BackendError::ShapeMismatch {
                operation: "search",
                expected: corpus.len(),
                actual: hits.len(),
            })?;
        Ok(scores.into_iter().map(Observation::Score).collect())
    }

    async fn get_comparator_scores(
        &self,
        reference: &RetrieverReference,
        results: &[Observation],
        normalize: bool,
    ) -> Result<Vec<f64>> {
        debug!(comparator = %self.comparator.name(), "Scoring retrieval deltas");
        self.comparator
            .compare(&Observation::Score(reference.score), results, normalize)
            .await
    }

    fn output_text(&self, reference: &RetrieverReference) -> Option<String> {
        Some(reference.document.clone())
    }
}
