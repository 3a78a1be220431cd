//! Comparator strategies: divergence of each candidate from the reference.
//!
//! Every comparator returns one score per candidate, in candidate order,
//! where a larger score means "further from the reference".

mod embedding;
mod lexical;
mod ngram;
mod score_delta;

pub use embedding::EmbeddingComparator;
pub use lexical::{LexicalComparator, LexicalMetric};
pub use ngram::NGramOverlapComparator;
pub use score_delta::ScoreComparator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Output of the target system for one input: generated text or a relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    Text(String),
    Score(f64),
}

impl Observation {
    pub fn kind(&self) -> &'static str {
        match self {
            Observation::Text(_) => "text",
            Observation::Score(_) => "score",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Observation::Text(t) => Some(t),
            Observation::Score(_) => None,
        }
    }

    pub fn as_score(&self) -> Option<f64> {
        match self {
            Observation::Score(s) => Some(*s),
            Observation::Text(_) => None,
        }
    }
}

impl From<String> for Observation {
    fn from(text: String) -> Self {
        Observation::Text(text)
    }
}

impl From<&str> for Observation {
    fn from(text: &str) -> Self {
        Observation::Text(text.to_string())
    }
}

impl From<f64> for Observation {
    fn from(score: f64) -> Self {
        Observation::Score(score)
    }
}

/// Scores how far each candidate diverges from the reference.
#[async_trait]
pub trait Comparator: Send + Sync {
    /// Registry name of this strategy.
    fn name(&self) -> &str;

    /// Observation kind this comparator reads, as in [`Observation::kind`].
    fn observation_kind(&self) -> &'static str {
        "text"
    }

    async fn compare(
        &self,
        reference: &Observation,
        candidates: &[Observation],
        normalize: bool,
    ) -> Result<Vec<f64>>;
}

/// Unwrap text observations or fail with the offending kind.
pub(crate) fn expect_texts<'a>(
    comparator: &str,
    reference: &'a Observation,
    candidates: &'a [Observation],
) -> std::result::Result<(&'a str, Vec<&'a str>), ConfigError> {
    let mismatch = |o: &Observation| ConfigError::IncompatibleObservation {
        comparator: comparator.to_string(),
        observed: o.kind(),
    };
    let reference = reference.as_text().ok_or_else(|| mismatch(reference))?;
    let candidates = candidates
        .iter()
        .map(|c| c.as_text().ok_or_else(|| mismatch(c)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((reference, candidates))
}

/// Unwrap score observations or fail with the offending kind.
pub(crate) fn expect_scores(
    comparator: &str,
    reference: &Observation,
    candidates: &[Observation],
) -> std::result::Result<(f64, Vec<f64>), ConfigError> {
    let mismatch = |o: &Observation| ConfigError::IncompatibleObservation {
        comparator: comparator.to_string(),
        observed: o.kind(),
    };
    let reference = reference.as_score().ok_or_else(|| mismatch(reference))?;
    let candidates = candidates
        .iter()
        .map(|c| c.as_score().ok_or_else(|| mismatch(c)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((reference, candidates))
}
