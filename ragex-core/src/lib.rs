//! # RAG-Ex Core
//!
//! Perturbation-based feature attribution for black-box text generators and
//! retrievers. An input is split into features, each feature is perturbed,
//! the target system is re-invoked on the perturbed inputs, and the change
//! in its output ranks the features by importance.

pub mod backend;
pub mod categorizer;
pub mod comparator;
pub mod config;
pub mod error;
pub mod explainer;
pub mod perturber;
pub mod rag;
pub mod registry;
pub mod retriever;
pub mod scores;
pub mod tokenizer;
pub mod types;

// Re-export commonly used types at the crate root.
pub use backend::{Encoder, Generator, HashingEncoder, LlmGenerator, LmsClient, LmsEncoder};
pub use categorizer::{Categories, Categorizer, PercentileCategorizer};
pub use comparator::{Comparator, Observation};
pub use config::{RagexConfig, load_config};
pub use error::{BackendError, ConfigError, ExplanationError, RagexError, Result};
pub use explainer::{Explainer, ExplanationSteps, GeneratorExplainer, RetrieverExplainer};
pub use perturber::Perturber;
pub use rag::{RagOutput, RagSystem};
pub use registry::Registry;
pub use retriever::{Corpus, Retriever, SemanticRetriever};
pub use scores::normalize_scores;
pub use tokenizer::Tokenizer;
pub use types::{ExplanationRequest, ExplanationResult, FeatureImportance, Granularity};
