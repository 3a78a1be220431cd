//! Target-system boundary: text generation and vectorization.
//!
//! The traits here are what the explainers depend on. `LmsClient` talks to
//! the model-serving backend over HTTP; `HashingEncoder` works offline.

mod client;
mod encoder;
mod generator;
pub mod pool;

pub use client::{GenerationParams, LmsClient, ModelInfo};
pub use encoder::{HashingEncoder, LmsEncoder};
pub use generator::LlmGenerator;

use async_trait::async_trait;

use crate::error::BackendError;

/// A black-box text generator.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    /// One response per input text, in input order.
    async fn generate(&self, texts: &[String]) -> Result<Vec<String>, BackendError>;
}

/// Turns texts into dense vectors.
#[async_trait]
pub trait Encoder: Send + Sync {
    fn model_name(&self) -> &str;

    /// One vector per input text, in input order.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError>;
}
