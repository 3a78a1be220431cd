//! Retrieval-augmented generation over a [`Retriever`] and a [`Generator`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::Generator;
use crate::config::{DEFAULT_RAG_TEMPLATE, RagConfig};
use crate::error::{ConfigError, Result};
use crate::retriever::Retriever;

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagMetadata {
    pub retriever_model: String,
    pub top_k: usize,
    pub generator_model: String,
    pub template: String,
}

/// Everything one RAG run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagOutput {
    pub retrieved_documents: Vec<String>,
    pub retriever_scores: Vec<f32>,
    pub prompt: String,
    pub generated_responses: Vec<String>,
    pub metadata: RagMetadata,
}

pub struct RagSystem {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    template: String,
    top_k: usize,
}

impl RagSystem {
    /// Build with the default template and a top-k of 1.
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
            template: DEFAULT_RAG_TEMPLATE.to_string(),
            top_k: 1,
        }
    }

    pub fn from_config(
        config: &RagConfig,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        Self::new(retriever, generator)
            .with_template(config.prompt_template.clone())
            .map(|rag| rag.with_top_k(config.top_k))
    }

    /// Replace the prompt template. It must contain `{question}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(QUESTION_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                message: format!("RAG prompt template has no {QUESTION_PLACEHOLDER} placeholder"),
            }
            .into());
        }
        self.template = template;
        Ok(self)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Fill the template with the retrieved documents and the question.
    pub fn build_prompt(&self, documents: &[String], question: &str) -> String {
        self.template
            .replace(CONTEXT_PLACEHOLDER, &documents.join("\n"))
            .replace(QUESTION_PLACEHOLDER, question)
    }

    pub async fn run(&self, user_input: &str) -> Result<RagOutput> {
        info!(
            retriever = %self.retriever.model_name(),
            generator = %self.generator.model_name(),
            top_k = self.top_k,
            "Running RAG"
        );

        let retrieved = self.retriever.retrieve(user_input, self.top_k).await?;
        let (retrieved_documents, retriever_scores): (Vec<String>, Vec<f32>) = retrieved
            .into_iter()
            .map(|doc| (doc.document, doc.score))
            .unzip();
        debug!(documents = retrieved_documents.len(), "Retrieved context");

        let prompt = self.build_prompt(&retrieved_documents, user_input);
        let generated_responses = self.generator.generate(std::slice::from_ref(&prompt)).await?;

        Ok(RagOutput {
            retrieved_documents,
            retriever_scores,
            prompt,
            generated_responses,
            metadata: RagMetadata {
                retriever_model: self.retriever.model_name().to_string(),
                top_k: self.top_k,
                generator_model: self.generator.model_name().to_string(),
                template: self.template.clone(),
            },
        })
    }
}

impl std::fmt::Debug for RagSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagSystem")
            .field("retriever", &self.retriever.model_name())
            .field("generator", &self.generator.model_name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HashingEncoder;
    use crate::error::BackendError;
    use crate::retriever::SemanticRetriever;
    use async_trait::async_trait;

    struct PromptEcho;

    #[async_trait]
    impl Generator for PromptEcho {
        fn model_name(&self) -> &str {
            "prompt-echo"
        }

        async fn generate(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<String>, BackendError> {
            Ok(texts.iter().map(|t| format!("answer to: {t}")).collect())
        }
    }

    async fn retriever() -> Arc<dyn Retriever> {
        let documents = vec![
            "Berlin is the capital of Germany".to_string(),
            "Paris is the capital of France".to_string(),
        ];
        Arc::new(
            SemanticRetriever::from_documents(Arc::new(HashingEncoder::default()), documents)
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_run_fills_template() {
        let rag = RagSystem::new(retriever().await, Arc::new(PromptEcho));
        let output = rag.run("capital of Germany").await.unwrap();

        assert_eq!(output.retrieved_documents, vec!["Berlin is the capital of Germany"]);
        assert_eq!(output.retriever_scores.len(), 1);
        assert_eq!(
            output.prompt,
            "Context: Berlin is the capital of Germany\nQuestion: capital of Germany\n\nAnswer:"
        );
        assert_eq!(output.generated_responses.len(), 1);
        assert!(output.generated_responses[0].starts_with("answer to: Context:"));
        assert_eq!(output.metadata.top_k, 1);
        assert_eq!(output.metadata.generator_model, "prompt-echo");
        assert_eq!(output.metadata.retriever_model, "hashing");
    }

    #[tokio::test]
    async fn test_context_joins_documents_by_newline() {
        let rag = RagSystem::new(retriever().await, Arc::new(PromptEcho))
            .with_template("{context}|{question}")
            .unwrap()
            .with_top_k(2);
        let output = rag.run("capital").await.unwrap();
        assert_eq!(output.retrieved_documents.len(), 2);
        assert_eq!(
            output.prompt,
            format!("{}|capital", output.retrieved_documents.join("\n"))
        );
    }

    #[tokio::test]
    async fn test_template_requires_question() {
        let rag = RagSystem::new(retriever().await, Arc::new(PromptEcho));
        assert!(rag.with_template("Context: {context}").is_err());
    }
}
