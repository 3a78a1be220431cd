//! Explanation pipeline shared by the generator and retriever targets.
//!
//! A run is always the same five steps: establish the reference, extract
//! features, perturb, re-invoke the target, score. Each target supplies the
//! steps through [`ExplanationSteps`]; [`run_explanation`] drives them and
//! assembles the ranked result.

mod generator;
mod retriever;

pub use generator::GeneratorExplainer;
pub use retriever::{RetrieverExplainer, RetrieverReference};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::comparator::Observation;
use crate::error::{ExplanationError, Result};
use crate::scores::rank_features;
use crate::types::{ExplanationRequest, ExplanationResult, Granularity};

/// The target-specific steps of an explanation run.
#[async_trait]
pub trait ExplanationSteps: Send + Sync {
    /// Baseline the perturbed results are compared against.
    type Reference: Send + Sync;

    /// Registry name of this explainer.
    fn name(&self) -> &str;

    async fn get_reference(&self, request: &ExplanationRequest) -> Result<Self::Reference>;

    fn get_features(
        &self,
        input_text: &str,
        reference: &Self::Reference,
        granularity: Granularity,
    ) -> Vec<String>;

    async fn get_perturbations(
        &self,
        input_text: &str,
        reference: &Self::Reference,
        features: &[String],
    ) -> Result<Vec<String>>;

    async fn get_post_perturbation_results(
        &self,
        input_text: &str,
        perturbations: &[String],
    ) -> Result<Vec<Observation>>;

    async fn get_comparator_scores(
        &self,
        reference: &Self::Reference,
        results: &[Observation],
        normalize: bool,
    ) -> Result<Vec<f64>>;

    /// Text reported as the system output for this reference.
    fn output_text(&self, reference: &Self::Reference) -> Option<String>;
}

/// Run every step in order and rank the features.
///
/// Any failing step aborts the run; no partial result is returned.
pub async fn run_explanation<S>(
    steps: &S,
    request: &ExplanationRequest,
) -> Result<ExplanationResult>
where
    S: ExplanationSteps + ?Sized,
{
    let input_text = request.user_input.as_str();
    info!(
        explainer = %steps.name(),
        granularity = %request.granularity,
        normalize = request.normalize_scores,
        "Starting explanation"
    );

    let reference = steps.get_reference(request).await?;
    let output_text = steps.output_text(&reference);

    let features = steps.get_features(input_text, &reference, request.granularity);
    debug!(features = features.len(), "Extracted features");
    if features.is_empty() {
        info!(explainer = %steps.name(), "No features extracted, nothing to explain");
        return Ok(ExplanationResult {
            explanations: Vec::new(),
            input_text: input_text.to_string(),
            output_text,
        });
    }

    let perturbations = steps
        .get_perturbations(input_text, &reference, &features)
        .await?;
    if perturbations.len() != features.len() {
        return Err(ExplanationError::PerturbationCountMismatch {
            features: features.len(),
            perturbations: perturbations.len(),
        }
        .into());
    }
    debug!(perturbations = perturbations.len(), "Built perturbations");

    let results = steps
        .get_post_perturbation_results(input_text, &perturbations)
        .await?;

    let scores = steps
        .get_comparator_scores(&reference, &results, request.normalize_scores)
        .await?;
    if scores.len() != features.len() {
        return Err(ExplanationError::ScoreCountMismatch {
            features: features.len(),
            scores: scores.len(),
        }
        .into());
    }

    let explanations = rank_features(&features, &scores);
    info!(
        explainer = %steps.name(),
        features = explanations.len(),
        top_feature = explanations.last().map(|e| e.feature.as_str()).unwrap_or(""),
        "Explanation complete"
    );

    Ok(ExplanationResult {
        explanations,
        input_text: input_text.to_string(),
        output_text,
    })
}

/// Anything that can explain a request.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, request: &ExplanationRequest) -> Result<ExplanationResult>;
}

#[async_trait]
impl<T: ExplanationSteps> Explainer for T {
    async fn explain(&self, request: &ExplanationRequest) -> Result<ExplanationResult> {
        run_explanation(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagexError;

    /// Scores each feature by its length; can be told to drop a score.
    struct LengthSteps {
        drop_score: bool,
    }

    #[async_trait]
    impl ExplanationSteps for LengthSteps {
        type Reference = String;

        fn name(&self) -> &str {
            "length"
        }

        async fn get_reference(&self, request: &ExplanationRequest) -> Result<String> {
            Ok(request.user_input.to_uppercase())
        }

        fn get_features(&self, input_text: &str, _: &String, _: Granularity) -> Vec<String> {
            input_text.split_whitespace().map(str::to_string).collect()
        }

        async fn get_perturbations(
            &self,
            _: &str,
            _: &String,
            features: &[String],
        ) -> Result<Vec<String>> {
            Ok(features.to_vec())
        }

        async fn get_post_perturbation_results(
            &self,
            _: &str,
            perturbations: &[String],
        ) -> Result<Vec<Observation>> {
            Ok(perturbations
                .iter()
                .map(|p| Observation::Score(p.len() as f64))
                .collect())
        }

        async fn get_comparator_scores(
            &self,
            _: &String,
            results: &[Observation],
            _: bool,
        ) -> Result<Vec<f64>> {
            let mut scores: Vec<f64> = results.iter().filter_map(Observation::as_score).collect();
            if self.drop_score {
                scores.pop();
            }
            Ok(scores)
        }

        fn output_text(&self, reference: &String) -> Option<String> {
            Some(reference.clone())
        }
    }

    #[tokio::test]
    async fn test_pipeline_ranks_ascending() {
        let request = ExplanationRequest::new("ccc a bb", Granularity::Word);
        let result = LengthSteps { drop_score: false }.explain(&request).await.unwrap();
        let features: Vec<&str> = result.explanations.iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(features, vec!["a", "bb", "ccc"]);
        assert_eq!(result.input_text, "ccc a bb");
        assert_eq!(result.output_text.as_deref(), Some("CCC A BB"));
    }

    #[tokio::test]
    async fn test_pipeline_rejects_score_count_mismatch() {
        let request = ExplanationRequest::new("a bb", Granularity::Word);
        let err = LengthSteps { drop_score: true }.explain(&request).await.unwrap_err();
        assert!(matches!(
            err,
            RagexError::Explanation(ExplanationError::ScoreCountMismatch { features: 2, scores: 1 })
        ));
    }

    #[tokio::test]
    async fn test_pipeline_without_features() {
        let request = ExplanationRequest::new("   ", Granularity::Word);
        let result = run_explanation(&LengthSteps { drop_score: false }, &request)
            .await
            .unwrap();
        assert!(result.explanations.is_empty());
    }
}
