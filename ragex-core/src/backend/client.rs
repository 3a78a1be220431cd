//! HTTP client for the model-serving backend.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::BackendError;

/// Query parameters of a `/generate` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub model_name: String,
    pub max_new_tokens: u32,
    pub split_lines: bool,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl GenerationParams {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            model_name: config.generator_model.clone(),
            max_new_tokens: config.max_new_tokens,
            split_lines: config.split_lines,
            temperature: config.temperature,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }
}

/// Entry of the `/available_models` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_provider: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const EMBEDDING_PROVIDER: &str = "SentenceTransformers";

/// Client for the `/generate`, `/vectorize` and `/available_models` endpoints.
#[derive(Debug, Clone)]
pub struct LmsClient {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ModelQuery<'a> {
    model_name: &'a str,
}

impl LmsClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| BackendError::ApiRequest {
            message: format!("Failed to build HTTP client: {}", e),
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            config.endpoint.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Generate a single response for `text`.
    pub async fn generate_one(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let url = format!("{}/generate", self.endpoint);
        debug!(url = %url, model = %params.model_name, "Sending generation request");

        let request = self.client.post(&url).query(params).json(&[text]);
        let responses: Vec<String> = Self::send_json(request).await?;
        responses
            .into_iter()
            .next()
            .ok_or(BackendError::ShapeMismatch {
                operation: "generate",
                expected: 1,
                actual: 0,
            })
    }

    /// Vectorize `texts` in one batched call.
    pub async fn vectorize(
        &self,
        model_name: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, BackendError> {
        let url = format!("{}/vectorize", self.endpoint);
        debug!(url = %url, model = %model_name, texts = texts.len(), "Sending vectorize request");

        let request = self
            .client
            .post(&url)
            .query(&ModelQuery { model_name })
            .json(texts);
        let vectors: Vec<Vec<f32>> = Self::send_json(request).await?;
        if vectors.len() != texts.len() {
            return Err(BackendError::ShapeMismatch {
                operation: "vectorize",
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }

    /// Every model the backend serves, keyed by name.
    pub async fn available_models(&self) -> Result<BTreeMap<String, ModelInfo>, BackendError> {
        let url = format!("{}/available_models", self.endpoint);
        debug!(url = %url, "Listing available models");
        Self::send_json(self.client.get(&url)).await
    }

    /// Names of the models that generate text (embedding models excluded).
    pub async fn generator_models(&self) -> Result<Vec<String>, BackendError> {
        Ok(self
            .available_models()
            .await?
            .into_iter()
            .filter(|(_, info)| info.model_provider != EMBEDDING_PROVIDER)
            .map(|(name, _)| name)
            .collect())
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await.map_err(|e| BackendError::ApiRequest {
            message: format!("Request failed: {}", e),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| BackendError::ApiRequest {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            debug!(status = status.as_u16(), body = %body, "Backend returned an error");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::ResponseParse {
            message: format!("Invalid JSON: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = LmsClient::new("http://localhost:9985/", None).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9985");
    }

    #[test]
    fn test_generation_params_from_config() {
        let params = GenerationParams::from_config(&BackendConfig::default());
        assert_eq!(params.model_name, "mistral-7b");
        assert_eq!(params.max_new_tokens, 100);
        assert!(params.split_lines);
        assert_eq!(params.frequency_penalty, 2.0);
    }

    #[test]
    fn test_model_info_keeps_extra_fields() {
        let info: ModelInfo = serde_json::from_str(
            r#"{"model_provider": "HuggingFace", "context_length": 4096}"#,
        )
        .unwrap();
        assert_eq!(info.model_provider, "HuggingFace");
        assert_eq!(info.extra["context_length"], 4096);
    }
}
