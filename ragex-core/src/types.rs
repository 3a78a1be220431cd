//! Core data types shared by every stage of an explanation run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Unit of text decomposition used when extracting features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Word,
    Sentence,
    Paragraph,
    Phrase,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Word,
        Granularity::Sentence,
        Granularity::Paragraph,
        Granularity::Phrase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Word => "word",
            Granularity::Sentence => "sentence",
            Granularity::Paragraph => "paragraph",
            Granularity::Phrase => "phrase",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ConfigError;

    /// Accepts the short name as well as the `_level` and
    /// `_level_granularity` spellings used by older configs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let base = normalized
            .strip_suffix("_level_granularity")
            .or_else(|| normalized.strip_suffix("_level"))
            .unwrap_or(&normalized);
        match base {
            "word" => Ok(Granularity::Word),
            "sentence" => Ok(Granularity::Sentence),
            "paragraph" => Ok(Granularity::Paragraph),
            "phrase" => Ok(Granularity::Phrase),
            _ => Err(ConfigError::InvalidGranularity {
                value: s.to_string(),
            }),
        }
    }
}

/// One attributed feature and its importance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub score: f64,
}

impl FeatureImportance {
    pub fn new(feature: impl Into<String>, score: f64) -> Self {
        Self {
            feature: feature.into(),
            score,
        }
    }
}

/// Result of one explanation run.
///
/// `explanations` holds one entry per extracted feature, sorted ascending by
/// score (least to most important).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResult {
    pub explanations: Vec<FeatureImportance>,
    pub input_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,
}

impl ExplanationResult {
    pub fn scores(&self) -> Vec<f64> {
        self.explanations.iter().map(|e| e.score).collect()
    }

    pub fn most_important(&self) -> Option<&FeatureImportance> {
        self.explanations.last()
    }
}

/// Caller-supplied parameters for a single explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub user_input: String,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default = "default_normalize")]
    pub normalize_scores: bool,
    /// Response already produced for `user_input`. Skips the reference
    /// generation call when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_response: Option<String>,
}

fn default_normalize() -> bool {
    true
}

impl ExplanationRequest {
    pub fn new(user_input: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            user_input: user_input.into(),
            granularity,
            normalize_scores: true,
            system_response: None,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize_scores = normalize;
        self
    }

    pub fn with_system_response(mut self, response: impl Into<String>) -> Self {
        self.system_response = Some(response.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_from_str_variants() {
        assert_eq!("word".parse::<Granularity>().unwrap(), Granularity::Word);
        assert_eq!(
            "sentence_level".parse::<Granularity>().unwrap(),
            Granularity::Sentence
        );
        assert_eq!(
            "Paragraph_Level_Granularity".parse::<Granularity>().unwrap(),
            Granularity::Paragraph
        );
        assert_eq!(" phrase ".parse::<Granularity>().unwrap(), Granularity::Phrase);
    }

    #[test]
    fn test_granularity_rejects_unknown() {
        let err = "token".parse::<Granularity>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGranularity { ref value } if value == "token"));
    }

    #[test]
    fn test_granularity_display_roundtrip() {
        for g in Granularity::ALL {
            assert_eq!(g.to_string().parse::<Granularity>().unwrap(), g);
        }
    }

    #[test]
    fn test_explanation_result_serialization() {
        let result = ExplanationResult {
            explanations: vec![
                FeatureImportance::new("Berlin", 0.2),
                FeatureImportance::new("capital", 0.9),
            ],
            input_text: "What is the capital of Germany?".into(),
            output_text: Some("Berlin".into()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["explanations"][1]["feature"], "capital");
        assert_eq!(json["output_text"], "Berlin");
        assert_eq!(result.most_important().unwrap().feature, "capital");
    }

    #[test]
    fn test_request_defaults_normalize() {
        let req: ExplanationRequest =
            serde_json::from_str(r#"{"user_input": "hello"}"#).unwrap();
        assert!(req.normalize_scores);
        assert_eq!(req.granularity, Granularity::Word);
    }
}
