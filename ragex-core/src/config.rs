//! Configuration system for RAG-Ex.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/ragex/config.toml` and/or `.ragex/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::Granularity;

/// Top-level configuration for an explanation session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagexConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub explainer: ExplainerConfig,
    #[serde(default)]
    pub retriever: RetrieverConfig,
    #[serde(default)]
    pub perturbation: PerturbationConfig,
    #[serde(default)]
    pub categorizer: CategorizerConfig,
    #[serde(default)]
    pub rag: RagConfig,
}

/// Connection and generation settings for the model-serving backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the serving backend.
    pub endpoint: String,
    /// Model used for text generation.
    pub generator_model: String,
    /// Model used for vectorization.
    pub encoder_model: String,
    pub max_new_tokens: u32,
    /// Ask the backend to cut the generation at the first line break.
    pub split_lines: bool,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Width of the generation worker pool. 1 means sequential.
    pub num_threads: usize,
    /// Per-request timeout in seconds. None leaves it to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9985".to_string(),
            generator_model: "mistral-7b".to_string(),
            encoder_model: "sentence-transformers".to_string(),
            max_new_tokens: 100,
            split_lines: true,
            temperature: 0.0,
            frequency_penalty: 2.0,
            presence_penalty: 2.0,
            num_threads: 10,
            timeout_secs: None,
        }
    }
}

/// Strategy selection for explanation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainerConfig {
    pub explainer: String,
    pub tokenizer: String,
    pub perturber: String,
    pub comparator: String,
    pub granularity: Granularity,
    pub normalize: bool,
    /// n-gram size for the n-gram overlap comparator.
    #[serde(default = "default_ngram_size")]
    pub ngram_size: usize,
}

fn default_ngram_size() -> usize {
    2
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            explainer: "generic_generator_explainer".to_string(),
            tokenizer: "custom_tokenizer".to_string(),
            perturber: "leave_one_out".to_string(),
            comparator: "sentence_transformers_based_comparator".to_string(),
            granularity: Granularity::Sentence,
            normalize: true,
            ngram_size: default_ngram_size(),
        }
    }
}

/// Settings for retriever-target explanations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// How many documents the baseline retrieval fetches.
    pub reference_top_k: usize,
    /// Comparator used on retrieval scores.
    pub comparator: String,
    /// One document per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            reference_top_k: 3,
            comparator: "score_comparator".to_string(),
            corpus_path: None,
        }
    }
}

/// Settings shared by the perturbation strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationConfig {
    /// Directory holding `llm_based_{antonym,synonym,entity}_perturber_template.txt`.
    /// Bundled templates are used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    /// Word list for random insertion, one word per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<PathBuf>,
    pub inserted_words: usize,
    pub seed: u64,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            template_dir: None,
            dictionary_path: None,
            inserted_words: 2,
            seed: 42,
        }
    }
}

/// Percentile thresholds for bucketing scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizerConfig {
    pub upper_percentile: f64,
    pub middle_percentile: f64,
    pub lower_percentile: f64,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            upper_percentile: 85.0,
            middle_percentile: 75.0,
            lower_percentile: 10.0,
        }
    }
}

/// Settings for the retrieve-then-generate pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Prompt with `{context}` and `{question}` placeholders.
    pub prompt_template: String,
    pub top_k: usize,
}

pub const DEFAULT_RAG_TEMPLATE: &str = "Context: {context}\nQuestion: {question}\n\nAnswer:";

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            prompt_template: DEFAULT_RAG_TEMPLATE.to_string(),
            top_k: 1,
        }
    }
}

impl RagexConfig {
    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.num_threads == 0 {
            return Err(invalid("backend.num_threads must be at least 1"));
        }
        if self.explainer.ngram_size == 0 {
            return Err(invalid("explainer.ngram_size must be at least 1"));
        }
        if self.retriever.reference_top_k == 0 {
            return Err(invalid("retriever.reference_top_k must be at least 1"));
        }
        if self.rag.top_k == 0 {
            return Err(invalid("rag.top_k must be at least 1"));
        }

        let c = &self.categorizer;
        for (name, value) in [
            ("upper_percentile", c.upper_percentile),
            ("middle_percentile", c.middle_percentile),
            ("lower_percentile", c.lower_percentile),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(&format!(
                    "categorizer.{name} must be within [0, 100], got {value}"
                )));
            }
        }
        if !(c.lower_percentile <= c.middle_percentile && c.middle_percentile <= c.upper_percentile)
        {
            return Err(invalid(
                "categorizer percentiles must satisfy lower <= middle <= upper",
            ));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_string(),
    }
}

/// Load configuration from all sources, merging in order:
/// defaults -> user config -> workspace config -> environment -> overrides.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RagexConfig>,
) -> Result<RagexConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(RagexConfig::default()));

    // User-level config
    if let Some(path) = user_config_path()
        && path.exists()
    {
        figment = figment.merge(Toml::file(&path));
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".ragex").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (RAGEX_BACKEND__ENDPOINT, RAGEX_EXPLAINER__PERTURBER, etc.)
    figment = figment.merge(Env::prefixed("RAGEX_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// `~/.config/ragex/config.toml` on Linux, platform equivalents elsewhere.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "ragex", "ragex")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = RagexConfig::default();
        assert_eq!(config.backend.endpoint, "http://localhost:9985");
        assert_eq!(config.backend.num_threads, 10);
        assert_eq!(config.explainer.perturber, "leave_one_out");
        assert_eq!(config.retriever.reference_top_k, 3);
        assert_eq!(config.perturbation.inserted_words, 2);
        assert_eq!(config.categorizer.upper_percentile, 85.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = RagexConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: RagexConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RagexConfig = toml::from_str(
            r#"
            [explainer]
            explainer = "generic_retriever_explainer"
            tokenizer = "custom_tokenizer"
            perturber = "reorder_perturber"
            comparator = "n_gram_comparator"
            granularity = "word"
            normalize = false
            "#,
        )
        .unwrap();
        assert_eq!(config.explainer.perturber, "reorder_perturber");
        assert_eq!(config.explainer.granularity, Granularity::Word);
        assert_eq!(config.explainer.ngram_size, 2);
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let mut config = RagexConfig::default();
        config.backend.num_threads = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("num_threads"));
    }

    #[test]
    fn test_validate_rejects_unordered_percentiles() {
        let mut config = RagexConfig::default();
        config.categorizer.middle_percentile = 90.0;
        assert!(config.validate().is_err());

        let mut config = RagexConfig::default();
        config.categorizer.upper_percentile = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_workspace_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_dir(".ragex")?;
            jail.create_file(
                ".ragex/config.toml",
                r#"
                [backend]
                endpoint = "http://models.internal:8080"
                generator_model = "llama-3"
                encoder_model = "sentence-transformers"
                max_new_tokens = 50
                split_lines = true
                temperature = 0.0
                frequency_penalty = 2.0
                presence_penalty = 2.0
                num_threads = 4
                "#,
            )?;
            jail.set_env("RAGEX_BACKEND__NUM_THREADS", "2");

            let config = load_config(Some(jail.directory()), None).map_err(|e| *e)?;
            assert_eq!(config.backend.endpoint, "http://models.internal:8080");
            assert_eq!(config.backend.generator_model, "llama-3");
            assert_eq!(config.backend.num_threads, 2);
            assert_eq!(config.explainer, ExplainerConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_config_overrides_win() {
        Jail::expect_with(|jail| {
            jail.set_env("RAGEX_EXPLAINER__PERTURBER", "reorder_perturber");
            let mut overrides = RagexConfig::default();
            overrides.explainer.perturber = "antonym_perturber".into();
            let config = load_config(None, Some(&overrides)).map_err(|e| *e)?;
            assert_eq!(config.explainer.perturber, "antonym_perturber");
            Ok(())
        });
    }
}
