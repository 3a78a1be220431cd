//! Generator explanations over the user input.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::ExplanationSteps;
use crate::backend::Generator;
use crate::comparator::{Comparator, Observation};
use crate::error::{ExplanationError, Result};
use crate::perturber::Perturber;
use crate::tokenizer::Tokenizer;
use crate::types::{ExplanationRequest, Granularity};

/// Explains a text generator.
///
/// Features come from the user input; each perturbed input is sent to the
/// generator and its response is compared with the unperturbed response.
pub struct GeneratorExplainer {
    tokenizer: Arc<dyn Tokenizer>,
    perturber: Arc<dyn Perturber>,
    comparator: Arc<dyn Comparator>,
    generator: Arc<dyn Generator>,
}

impl GeneratorExplainer {
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        perturber: Arc<dyn Perturber>,
        comparator: Arc<dyn Comparator>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            tokenizer,
            perturber,
            comparator,
            generator,
        }
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }
}

impl std::fmt::Debug for GeneratorExplainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorExplainer")
            .field("tokenizer", &self.tokenizer.name())
            .field("perturber", &self.perturber.name())
            .field("comparator", &self.comparator.name())
            .field("generator", &self.generator.model_name())
            .finish()
    }
}

#[async_trait]
impl ExplanationSteps for GeneratorExplainer {
    type Reference = String;

    fn name(&self) -> &str {
        "generic_generator_explainer"
    }

    async fn get_reference(&self, request: &ExplanationRequest) -> Result<String> {
        if let Some(response) = &request.system_response {
            return Ok(response.clone());
        }
        let responses = self
            .generator
            .generate(std::slice::from_ref(&request.user_input))
            .await?;
        responses.into_iter().next().ok_or_else(|| {
            ExplanationError::NoReference {
                reason: "generator returned no response for the input".to_string(),
            }
            .into()
        })
    }

    fn get_features(
        &self,
        input_text: &str,
        _reference: &String,
        granularity: Granularity,
    ) -> Vec<String> {
        self.tokenizer.tokenize(input_text, granularity)
    }

    async fn get_perturbations(
        &self,
        input_text: &str,
        _reference: &String,
        features: &[String],
    ) -> Result<Vec<String>> {
        self.perturber.perturb(input_text, features).await
    }

    async fn get_post_perturbation_results(
        &self,
        _input_text: &str,
        perturbations: &[String],
    ) -> Result<Vec<Observation>> {
        debug!(
            model = %self.generator.model_name(),
            perturbations = perturbations.len(),
            "Generating responses for perturbed inputs"
        );
        let responses = self.generator.generate(perturbations).await?;
        Ok(responses.into_iter().map(Observation::Text).collect())
    }

    async fn get_comparator_scores(
        &self,
        reference: &String,
        results: &[Observation],
        normalize: bool,
    ) -> Result<Vec<f64>> {
        debug!(comparator = %self.comparator.name(), "Scoring responses");
        self.comparator
            .compare(&Observation::Text(reference.clone()), results, normalize)
            .await
    }

    fn output_text(&self, reference: &String) -> Option<String> {
        Some(reference.clone())
    }
}
