//! Error types for the RAG-Ex attribution engine.
//!
//! Uses `thiserror` for public API error types. Configuration mistakes and
//! target-system failures are separate domains; degenerate inputs (zero
//! n-grams, zero score variance) are not errors and never reach this module.

use std::path::PathBuf;

/// Top-level error type for the ragex core library.
#[derive(Debug, thiserror::Error)]
pub enum RagexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Explanation error: {0}")]
    Explanation(#[from] ExplanationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while selecting or constructing strategies.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown {kind} '{name}'. Available {kind}s are: {}", .available.join(", "))]
    InvalidSelection {
        kind: &'static str,
        name: String,
        available: Vec<String>,
    },

    #[error("Invalid granularity '{value}'. Expected one of: word, sentence, paragraph, phrase")]
    InvalidGranularity { value: String },

    #[error("Invalid prompt template {path}: {message}")]
    InvalidTemplate { path: PathBuf, message: String },

    #[error("Comparator '{comparator}' cannot compare {observed} observations")]
    IncompatibleObservation {
        comparator: String,
        observed: &'static str,
    },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors from the target system (generation, vectorization, retrieval).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Expected {expected} results from {operation}, got {actual}")]
    ShapeMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Worker failed: {message}")]
    Worker { message: String },
}

/// Errors from the explanation pipeline itself.
#[derive(Debug, thiserror::Error)]
pub enum ExplanationError {
    #[error("No reference could be established: {reason}")]
    NoReference { reason: String },

    #[error("Got {perturbations} perturbations for {features} features")]
    PerturbationCountMismatch { features: usize, perturbations: usize },

    #[error("Got {scores} scores for {features} features")]
    ScoreCountMismatch { features: usize, scores: usize },
}

impl ConfigError {
    /// Build an `InvalidSelection` from a static name table.
    pub fn invalid_selection(kind: &'static str, name: &str, available: &[&str]) -> Self {
        Self::InvalidSelection {
            kind,
            name: name.to_string(),
            available: available.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A type alias for results using the top-level `RagexError`.
pub type Result<T> = std::result::Result<T, RagexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selection_lists_choices() {
        let err = ConfigError::invalid_selection(
            "perturber",
            "shuffle",
            &["leave_one_out", "reorder_perturber"],
        );
        assert_eq!(
            err.to_string(),
            "Unknown perturber 'shuffle'. Available perturbers are: leave_one_out, reorder_perturber"
        );
    }

    #[test]
    fn test_error_display_backend_status() {
        let err = RagexError::Backend(BackendError::Status {
            status: 503,
            body: "{\"detail\":\"model not loaded\"}".into(),
        });
        assert_eq!(
            err.to_string(),
            "Backend error: Backend returned status 503: {\"detail\":\"model not loaded\"}"
        );
    }

    #[test]
    fn test_error_display_shape_mismatch() {
        let err = BackendError::ShapeMismatch {
            operation: "vectorize",
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Expected 3 results from vectorize, got 2");
    }

    #[test]
    fn test_error_from_config() {
        let err: RagexError = ConfigError::InvalidGranularity {
            value: "token".into(),
        }
        .into();
        assert!(matches!(err, RagexError::Config(_)));
        assert!(err.to_string().contains("'token'"));
    }

    #[test]
    fn test_error_display_score_mismatch() {
        let err = RagexError::Explanation(ExplanationError::ScoreCountMismatch {
            features: 4,
            scores: 3,
        });
        assert_eq!(
            err.to_string(),
            "Explanation error: Got 3 scores for 4 features"
        );
    }
}
