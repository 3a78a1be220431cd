//! Dense retrieval over an in-memory corpus.
//!
//! Search takes the corpus as an argument, so an explanation can score a
//! replacement corpus without touching the retriever's own documents.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::Encoder;
use crate::error::{BackendError, ConfigError, Result};

/// Documents and their embeddings, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl Corpus {
    pub fn new(
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> std::result::Result<Self, BackendError> {
        if documents.len() != embeddings.len() {
            return Err(BackendError::ShapeMismatch {
                operation: "encode",
                expected: documents.len(),
                actual: embeddings.len(),
            });
        }
        Ok(Self {
            documents,
            embeddings,
        })
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A ranked match: position in the searched corpus and its cosine score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub corpus_index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub corpus_index: usize,
    pub document: String,
    pub score: f32,
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rank `corpus_embeddings` by cosine similarity to `query`, best first.
///
/// `top_k` is clamped to the corpus size; equal scores keep corpus order.
pub fn semantic_search(
    query: &[f32],
    corpus_embeddings: &[Vec<f32>],
    top_k: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = corpus_embeddings
        .iter()
        .enumerate()
        .map(|(corpus_index, embedding)| SearchHit {
            corpus_index,
            score: cosine_similarity(query, embedding),
        })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(top_k.min(corpus_embeddings.len()));
    hits
}

/// A retriever that ranks corpus documents against a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn model_name(&self) -> &str;

    /// The retriever's own corpus.
    fn corpus(&self) -> &Corpus;

    /// Embed `documents` into a corpus this retriever can search.
    async fn encode_corpus(
        &self,
        documents: Vec<String>,
    ) -> std::result::Result<Corpus, BackendError>;

    /// Rank `corpus` against `query`.
    async fn search(
        &self,
        query: &str,
        corpus: &Corpus,
        top_k: usize,
    ) -> std::result::Result<Vec<SearchHit>, BackendError>;

    /// Top documents from the retriever's own corpus.
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<RetrievedDocument>, BackendError> {
        let corpus = self.corpus();
        let hits = self.search(query, corpus, top_k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| RetrievedDocument {
                corpus_index: hit.corpus_index,
                document: corpus.documents[hit.corpus_index].clone(),
                score: hit.score,
            })
            .collect())
    }
}

/// Bi-encoder retriever: query and documents embedded by the same encoder.
pub struct SemanticRetriever {
    encoder: Arc<dyn Encoder>,
    corpus: Corpus,
}

impl SemanticRetriever {
    /// Encode `documents` and use them as the corpus.
    pub async fn from_documents(
        encoder: Arc<dyn Encoder>,
        documents: Vec<String>,
    ) -> std::result::Result<Self, BackendError> {
        let embeddings = encoder.encode(&documents).await?;
        let corpus = Corpus::new(documents, embeddings)?;
        debug!(
            encoder = %encoder.model_name(),
            documents = corpus.len(),
            "Encoded retrieval corpus"
        );
        Ok(Self { encoder, corpus })
    }

    pub fn with_corpus(encoder: Arc<dyn Encoder>, corpus: Corpus) -> Self {
        Self { encoder, corpus }
    }
}

impl std::fmt::Debug for SemanticRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticRetriever")
            .field("encoder", &self.encoder.model_name())
            .field("documents", &self.corpus.len())
            .finish()
    }
}

#[async_trait]
impl Retriever for SemanticRetriever {
    fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    async fn encode_corpus(
        &self,
        documents: Vec<String>,
    ) -> std::result::Result<Corpus, BackendError> {
        let embeddings = self.encoder.encode(&documents).await?;
        Corpus::new(documents, embeddings)
    }

    async fn search(
        &self,
        query: &str,
        corpus: &Corpus,
        top_k: usize,
    ) -> std::result::Result<Vec<SearchHit>, BackendError> {
        let mut vectors = self.encoder.encode(&[query.to_string()]).await?;
        let query_vector = vectors.pop().ok_or(BackendError::ShapeMismatch {
            operation: "encode",
            expected: 1,
            actual: 0,
        })?;
        Ok(semantic_search(&query_vector, corpus.embeddings(), top_k))
    }
}

/// Read a corpus file: one document per non-blank line, trimmed.
pub fn load_corpus_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
