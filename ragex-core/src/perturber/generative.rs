//! Generator-backed perturbations.
//!
//! Each feature is sent to the generator through a prompt template asking
//! for an antonym, a synonym or a replacement entity. The rewrite takes the
//! feature's place in the text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Perturber, replace_first};
use crate::backend::Generator;
use crate::error::{BackendError, ConfigError, Result};

const PLACEHOLDERS: [&str; 2] = ["{feature}", "{sentence}"];

/// Instruction template with a single feature placeholder.
///
/// `{feature}` is preferred; `{sentence}` is accepted for older template files.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    text: String,
    placeholder: &'static str,
}

impl PromptTemplate {
    pub fn parse(raw: &str, source: &Path) -> std::result::Result<Self, ConfigError> {
        let text = raw.trim().to_string();
        let placeholder = PLACEHOLDERS
            .into_iter()
            .find(|p| text.contains(p))
            .ok_or_else(|| ConfigError::InvalidTemplate {
                path: source.to_path_buf(),
                message: "missing {feature} placeholder".to_string(),
            })?;
        Ok(Self { text, placeholder })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::parse(&raw, path)?)
    }

    pub fn render(&self, feature: &str) -> String {
        self.text.replace(self.placeholder, feature)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// The rewrite instructions available out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerativeKind {
    Antonym,
    Synonym,
    Entity,
}

impl GenerativeKind {
    pub const ALL: [GenerativeKind; 3] = [
        GenerativeKind::Antonym,
        GenerativeKind::Synonym,
        GenerativeKind::Entity,
    ];

    pub fn perturber_name(&self) -> &'static str {
        match self {
            GenerativeKind::Antonym => "antonym_perturber",
            GenerativeKind::Synonym => "synonym_perturber",
            GenerativeKind::Entity => "entity_perturber",
        }
    }

    pub fn from_perturber_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.perturber_name() == name)
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            GenerativeKind::Antonym => "llm_based_antonym_perturber_template.txt",
            GenerativeKind::Synonym => "llm_based_synonym_perturber_template.txt",
            GenerativeKind::Entity => "llm_based_entity_perturber_template.txt",
        }
    }

    fn bundled_source(&self) -> &'static str {
        match self {
            GenerativeKind::Antonym => include_str!(
                "../../assets/prompt_templates/llm_based_antonym_perturber_template.txt"
            ),
            GenerativeKind::Synonym => include_str!(
                "../../assets/prompt_templates/llm_based_synonym_perturber_template.txt"
            ),
            GenerativeKind::Entity => include_str!(
                "../../assets/prompt_templates/llm_based_entity_perturber_template.txt"
            ),
        }
    }

    /// Template shipped with the crate.
    pub fn bundled_template(&self) -> std::result::Result<PromptTemplate, ConfigError> {
        let source = PathBuf::from("assets/prompt_templates").join(self.file_name());
        PromptTemplate::parse(self.bundled_source(), &source)
    }

    /// Template from `template_dir` when given, otherwise the bundled one.
    pub fn template(&self, template_dir: Option<&Path>) -> Result<PromptTemplate> {
        match template_dir {
            Some(dir) => PromptTemplate::load(&dir.join(self.file_name())),
            None => Ok(self.bundled_template()?),
        }
    }
}

/// Asks the target generator to rewrite each feature, then splices the
/// rewrite back into the text.
pub struct GenerativePerturber {
    name: String,
    template: PromptTemplate,
    generator: Arc<dyn Generator>,
}

impl GenerativePerturber {
    pub fn new(
        name: impl Into<String>,
        template: PromptTemplate,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            generator,
        }
    }

    pub fn from_kind(
        kind: GenerativeKind,
        template_dir: Option<&Path>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        Ok(Self::new(
            kind.perturber_name(),
            kind.template(template_dir)?,
            generator,
        ))
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

impl std::fmt::Debug for GenerativePerturber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativePerturber")
            .field("name", &self.name)
            .field("model", &self.generator.model_name())
            .finish()
    }
}

#[async_trait]
impl Perturber for GenerativePerturber {
    fn name(&self) -> &str {
        &self.name
    }

    async fn perturb(&self, text: &str, features: &[String]) -> Result<Vec<String>> {
        let prompts: Vec<String> = features.iter().map(|f| self.template.render(f)).collect();
        debug!(
            perturber = %self.name,
            model = %self.generator.model_name(),
            prompts = prompts.len(),
            "Requesting generative rewrites"
        );

        let rewrites = self.generator.generate(&prompts).await?;
        if rewrites.len() != features.len() {
            return Err(BackendError::ShapeMismatch {
                operation: "generate",
                expected: features.len(),
                actual: rewrites.len(),
            }
            .into());
        }

        Ok(features
            .iter()
            .zip(&rewrites)
            .map(|(feature, rewrite)| {
                replace_first(text, feature, rewrite.trim())
                    .trim()
                    .to_string()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagexError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers every prompt with a canned rewrite and records the prompts.
    struct ScriptedGenerator {
        rewrite: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<String>, BackendError> {
            self.prompts.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts.iter().map(|_| format!("  {}  ", self.rewrite)).collect())
        }
    }

    #[test]
    fn test_bundled_templates_parse() {
        for kind in GenerativeKind::ALL {
            let template = kind.bundled_template().unwrap();
            assert!(template.render("X").contains("X"));
            assert!(!template.render("X").contains("{feature}"));
        }
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let err = PromptTemplate::parse("no placeholder here", Path::new("t.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_legacy_sentence_placeholder() {
        let template =
            PromptTemplate::parse("\n Give an antonym of: {sentence}\n", Path::new("t")).unwrap();
        assert_eq!(template.render("hot"), "Give an antonym of: hot");
    }

    #[test]
    fn test_template_dir_overrides_bundled() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(GenerativeKind::Synonym.file_name()),
            "Synonym for {feature}?\n",
        )
        .unwrap();
        let template = GenerativeKind::Synonym.template(Some(dir.path())).unwrap();
        assert_eq!(template.as_str(), "Synonym for {feature}?");

        let missing = GenerativeKind::Entity.template(Some(dir.path())).unwrap_err();
        assert!(matches!(missing, RagexError::Config(ConfigError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_rewrite_spliced_into_first_occurrence() {
        let generator = Arc::new(ScriptedGenerator {
            rewrite: "cold".into(),
            prompts: Mutex::new(Vec::new()),
        });
        let template = PromptTemplate::parse("Antonym of: {feature}", Path::new("t")).unwrap();
        let perturber = GenerativePerturber::new("antonym_perturber", template, generator.clone());

        let out = perturber
            .perturb("hot tea and hot soup", &["hot".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec!["cold tea and hot soup"]);
        assert_eq!(*generator.prompts.lock().unwrap(), vec!["Antonym of: hot"]);
    }
}
