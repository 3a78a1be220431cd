//! Embedding encoders: the serving backend and an offline hashing fallback.

use std::collections::HashMap;

use async_trait::async_trait;

use super::client::LmsClient;
use super::Encoder;
use crate::config::BackendConfig;
use crate::error::BackendError;

/// Encoder backed by the serving backend's `/vectorize` endpoint.
#[derive(Debug, Clone)]
pub struct LmsEncoder {
    client: LmsClient,
    model_name: String,
}

impl LmsEncoder {
    pub fn new(client: LmsClient, model_name: impl Into<String>) -> Self {
        Self {
            client,
            model_name: model_name.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self::new(
            LmsClient::from_config(config)?,
            config.encoder_model.clone(),
        ))
    }
}

#[async_trait]
impl Encoder for LmsEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        self.client.vectorize(&self.model_name, texts).await
    }
}

/// Offline bag-of-words encoder: term counts hashed into a fixed number of
/// dimensions, then L2-normalized.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimensions: usize,
}

impl HashingEncoder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            *tf.entry(word).or_insert(0) += 1;
        }

        for (term, count) in &tf {
            vector[djb2(term) % self.dimensions] += *count as f32;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(384)
    }
}

fn djb2(s: &str) -> usize {
    let mut hash: usize = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as usize);
    }
    hash
}

#[async_trait]
impl Encoder for HashingEncoder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}
