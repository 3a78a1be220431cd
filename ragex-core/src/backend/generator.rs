//! Text generator backed by the serving backend's `/generate` endpoint.

use async_trait::async_trait;
use tracing::debug;

use super::client::{GenerationParams, LmsClient};
use super::pool::run_indexed;
use super::Generator;
use crate::config::BackendConfig;
use crate::error::BackendError;

/// Generator backed by the serving backend's `/generate` endpoint.
///
/// Each text is one request; requests run on a pool of `num_threads` workers.
#[derive(Debug, Clone)]
pub struct LlmGenerator {
    client: LmsClient,
    params: GenerationParams,
    num_threads: usize,
}

impl LlmGenerator {
    pub fn new(client: LmsClient, params: GenerationParams, num_threads: usize) -> Self {
        Self {
            client,
            params,
            num_threads,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self::new(
            LmsClient::from_config(config)?,
            GenerationParams::from_config(config),
            config.num_threads,
        ))
    }

    /// Same client and settings, different model.
    pub fn with_model(&self, model_name: impl Into<String>) -> Self {
        let mut generator = self.clone();
        generator.params.model_name = model_name.into();
        generator
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    fn model_name(&self) -> &str {
        &self.params.model_name
    }

    async fn generate(&self, texts: &[String]) -> Result<Vec<String>, BackendError> {
        debug!(
            model = %self.params.model_name,
            texts = texts.len(),
            workers = self.num_threads,
            "Generating responses"
        );
        let client = self.client.clone();
        let params = self.params.clone();
        run_indexed(texts.to_vec(), self.num_threads, move |text| {
            let client = client.clone();
            let params = params.clone();
            async move { client.generate_one(&text, &params).await }
        })
        .await
    }
}
