//! Strategy registry: builds tokenizers, perturbers, comparators and
//! explainers by name from closed sets.
//!
//! The registry owns the backend clients and is created once, either from
//! configuration or with injected generator and encoder instances.

use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::{Encoder, Generator, GenerationParams, LlmGenerator, LmsClient, LmsEncoder};
use crate::comparator::{
    Comparator, EmbeddingComparator, LexicalComparator, NGramOverlapComparator, ScoreComparator,
};
use crate::config::RagexConfig;
use crate::error::{ConfigError, Result};
use crate::explainer::{Explainer, GeneratorExplainer, RetrieverExplainer};
use crate::perturber::{
    Dictionary, GenerativeKind, GenerativePerturber, LeaveOneOutPerturber, Perturber,
    RandomWordPerturber, ReorderPerturber,
};
use crate::retriever::{Retriever, SemanticRetriever};
use crate::tokenizer::{CustomTokenizer, Tokenizer};

pub const TOKENIZERS: &[&str] = &["custom_tokenizer"];

pub const PERTURBERS: &[&str] = &[
    "leave_one_out",
    "random_word_perturber",
    "reorder_perturber",
    "antonym_perturber",
    "synonym_perturber",
    "entity_perturber",
];

pub const COMPARATORS: &[&str] = &[
    "sentence_transformers_based_comparator",
    "base_llm_based_comparator",
    "levenshtein_comparator",
    "jaro_winkler_comparator",
    "n_gram_comparator",
    "score_comparator",
];

pub const EXPLAINERS: &[&str] = &["generic_generator_explainer", "generic_retriever_explainer"];

/// Every registry kind with its valid names.
pub fn strategy_names() -> [(&'static str, &'static [&'static str]); 4] {
    [
        ("tokenizer", TOKENIZERS),
        ("perturber", PERTURBERS),
        ("comparator", COMPARATORS),
        ("explainer", EXPLAINERS),
    ]
}

pub struct Registry {
    config: RagexConfig,
    generator: Arc<dyn Generator>,
    encoder: Arc<dyn Encoder>,
    /// Embeds with the generator's own model.
    generator_encoder: Arc<dyn Encoder>,
}

impl Registry {
    /// Validate `config` and open the backend clients it describes.
    pub fn from_config(config: RagexConfig) -> Result<Self> {
        config.validate()?;
        let backend = &config.backend;
        let client = LmsClient::from_config(backend)?;
        info!(
            endpoint = %client.endpoint(),
            generator = %backend.generator_model,
            encoder = %backend.encoder_model,
            "Connecting registry to serving backend"
        );

        let generator = Arc::new(LlmGenerator::new(
            client.clone(),
            GenerationParams::from_config(backend),
            backend.num_threads,
        ));
        let encoder = Arc::new(LmsEncoder::new(client.clone(), backend.encoder_model.clone()));
        let generator_encoder = Arc::new(LmsEncoder::new(client, backend.generator_model.clone()));

        Ok(Self {
            config,
            generator,
            encoder,
            generator_encoder,
        })
    }

    /// Use caller-supplied backends. The encoder also serves the
    /// generator-embedding comparator.
    pub fn new(
        config: RagexConfig,
        generator: Arc<dyn Generator>,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        Self {
            config,
            generator,
            generator_encoder: Arc::clone(&encoder),
            encoder,
        }
    }

    pub fn with_generator_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.generator_encoder = encoder;
        self
    }

    pub fn config(&self) -> &RagexConfig {
        &self.config
    }

    pub fn generator(&self) -> Arc<dyn Generator> {
        Arc::clone(&self.generator)
    }

    pub fn encoder(&self) -> Arc<dyn Encoder> {
        Arc::clone(&self.encoder)
    }

    pub fn tokenizer(&self, name: &str) -> std::result::Result<Arc<dyn Tokenizer>, ConfigError> {
        match name {
            "custom_tokenizer" => Ok(Arc::new(CustomTokenizer::new())),
            _ => Err(ConfigError::invalid_selection("tokenizer", name, TOKENIZERS)),
        }
    }

    pub fn perturber(&self, name: &str) -> Result<Arc<dyn Perturber>> {
        let settings = &self.config.perturbation;
        let perturber: Arc<dyn Perturber> = match name {
            "leave_one_out" => Arc::new(LeaveOneOutPerturber::new()),
            "random_word_perturber" => {
                let dictionary = match &settings.dictionary_path {
                    Some(path) => Dictionary::load(path)?,
                    None => Dictionary::bundled(),
                };
                Arc::new(RandomWordPerturber::new(
                    dictionary,
                    settings.inserted_words,
                    settings.seed,
                ))
            }
            "reorder_perturber" => Arc::new(ReorderPerturber::new(settings.seed)),
            _ => match GenerativeKind::from_perturber_name(name) {
                Some(kind) => Arc::new(GenerativePerturber::from_kind(
                    kind,
                    settings.template_dir.as_deref(),
                    self.generator(),
                )?),
                None => {
                    return Err(
                        ConfigError::invalid_selection("perturber", name, PERTURBERS).into(),
                    );
                }
            },
        };
        debug!(perturber = %name, "Perturber selected");
        Ok(perturber)
    }

    pub fn comparator(&self, name: &str) -> std::result::Result<Arc<dyn Comparator>, ConfigError> {
        let comparator: Arc<dyn Comparator> = match name {
            "sentence_transformers_based_comparator" => {
                Arc::new(EmbeddingComparator::new(name, self.encoder()))
            }
            "base_llm_based_comparator" => Arc::new(EmbeddingComparator::new(
                name,
                Arc::clone(&self.generator_encoder),
            )),
            "levenshtein_comparator" => Arc::new(LexicalComparator::levenshtein()),
            "jaro_winkler_comparator" => Arc::new(LexicalComparator::jaro_winkler()),
            "n_gram_comparator" => {
                Arc::new(NGramOverlapComparator::new(self.config.explainer.ngram_size))
            }
            "score_comparator" => Arc::new(ScoreComparator::new()),
            _ => return Err(ConfigError::invalid_selection("comparator", name, COMPARATORS)),
        };
        debug!(comparator = %name, "Comparator selected");
        Ok(comparator)
    }

    /// Comparator `name`, rejected before any backend call unless it reads
    /// `observed` observations.
    fn comparator_for(
        &self,
        name: &str,
        observed: &'static str,
    ) -> std::result::Result<Arc<dyn Comparator>, ConfigError> {
        let comparator = self.comparator(name)?;
        if comparator.observation_kind() != observed {
            return Err(ConfigError::IncompatibleObservation {
                comparator: name.to_string(),
                observed,
            });
        }
        Ok(comparator)
    }

    /// Generator explainer with the configured strategies.
    pub fn generator_explainer(&self) -> Result<GeneratorExplainer> {
        let names = &self.config.explainer;
        Ok(GeneratorExplainer::new(
            self.tokenizer(&names.tokenizer)?,
            self.perturber(&names.perturber)?,
            self.comparator_for(&names.comparator, "text")?,
            self.generator(),
        ))
    }

    /// Retriever explainer over an existing retriever.
    pub fn retriever_explainer_with(
        &self,
        retriever: Arc<dyn Retriever>,
    ) -> Result<RetrieverExplainer> {
        let names = &self.config.explainer;
        Ok(RetrieverExplainer::new(
            self.tokenizer(&names.tokenizer)?,
            self.perturber(&names.perturber)?,
            self.comparator_for(&self.config.retriever.comparator, "score")?,
            retriever,
        )
        .with_reference_top_k(self.config.retriever.reference_top_k))
    }

    /// Retriever explainer over `documents`, embedded with the registry's encoder.
    pub async fn retriever_explainer(&self, documents: Vec<String>) -> Result<RetrieverExplainer> {
        let retriever = SemanticRetriever::from_documents(self.encoder(), documents).await?;
        self.retriever_explainer_with(Arc::new(retriever))
    }

    /// The explainer named in the configuration. The retriever explainer
    /// needs a corpus.
    pub async fn explainer(&self, corpus: Option<Vec<String>>) -> Result<Box<dyn Explainer>> {
        let name = self.config.explainer.explainer.as_str();
        match name {
            "generic_generator_explainer" => Ok(Box::new(self.generator_explainer()?)),
            "generic_retriever_explainer" => {
                let documents = corpus.ok_or_else(|| ConfigError::Invalid {
                    message: "generic_retriever_explainer requires a corpus".to_string(),
                })?;
                Ok(Box::new(self.retriever_explainer(documents).await?))
            }
            _ => Err(ConfigError::invalid_selection("explainer", name, EXPLAINERS).into()),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("generator", &self.generator.model_name())
            .field("encoder", &self.encoder.model_name())
            .field("generator_encoder", &self.generator_encoder.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HashingEncoder;
    use crate::error::{BackendError, RagexError};
    use async_trait::async_trait;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<String>, BackendError> {
            Ok(texts.to_vec())
        }
    }

    fn registry() -> Registry {
        Registry::new(
            RagexConfig::default(),
            Arc::new(EchoGenerator),
            Arc::new(HashingEncoder::new(64)),
        )
    }

    #[test]
    fn test_every_registered_name_resolves() {
        let registry = registry();
        for name in TOKENIZERS {
            assert_eq!(registry.tokenizer(name).unwrap().name(), *name);
        }
        for name in PERTURBERS {
            assert_eq!(registry.perturber(name).unwrap().name(), *name);
        }
        for name in COMPARATORS {
            assert_eq!(registry.comparator(name).unwrap().name(), *name);
        }
    }

    #[test]
    fn test_unknown_names_list_choices() {
        let registry = registry();
        let err = registry.comparator("cosine").err().unwrap();
        assert!(err.to_string().contains("levenshtein_comparator"));

        let err = registry.perturber("shuffle").err().unwrap();
        assert!(matches!(
            err,
            RagexError::Config(ConfigError::InvalidSelection { kind: "perturber", .. })
        ));
        assert!(registry.tokenizer("spacy").is_err());
    }

    #[tokio::test]
    async fn test_explainer_selection() {
        let mut config = RagexConfig::default();
        config.explainer.explainer = "generic_retriever_explainer".into();
        let registry = Registry::new(
            config,
            Arc::new(EchoGenerator),
            Arc::new(HashingEncoder::new(64)),
        );
        assert!(registry.explainer(None).await.is_err());
        assert!(registry.explainer(Some(vec!["doc".into()])).await.is_ok());

        let mut config = RagexConfig::default();
        config.explainer.explainer = "aleph_alpha_explainer".into();
        let registry = Registry::new(
            config,
            Arc::new(EchoGenerator),
            Arc::new(HashingEncoder::new(64)),
        );
        assert!(registry.explainer(None).await.is_err());
    }

    #[tokio::test]
    async fn test_comparator_must_match_target_output() {
        let mut config = RagexConfig::default();
        config.retriever.comparator = "levenshtein_comparator".into();
        config.explainer.comparator = "score_comparator".into();
        let registry = Registry::new(
            config,
            Arc::new(EchoGenerator),
            Arc::new(HashingEncoder::new(64)),
        );

        let err = registry
            .retriever_explainer(vec!["doc".into()])
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RagexError::Config(ConfigError::IncompatibleObservation { observed: "score", .. })
        ));
        assert!(err.to_string().contains("cannot compare score observations"));

        let err = registry.generator_explainer().err().unwrap();
        assert!(matches!(
            err,
            RagexError::Config(ConfigError::IncompatibleObservation { observed: "text", .. })
        ));
    }

    #[test]
    fn test_observation_kinds() {
        let registry = registry();
        for name in COMPARATORS {
            let expected = if *name == "score_comparator" {
                "score"
            } else {
                "text"
            };
            assert_eq!(registry.comparator(name).unwrap().observation_kind(), expected);
        }
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = RagexConfig::default();
        config.backend.num_threads = 0;
        assert!(Registry::from_config(config).is_err());
    }

    #[test]
    fn test_from_config_builds_clients() {
        let registry = Registry::from_config(RagexConfig::default()).unwrap();
        assert_eq!(registry.generator().model_name(), "mistral-7b");
        assert_eq!(registry.encoder().model_name(), "sentence-transformers");
    }
}
