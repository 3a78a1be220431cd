//! Buckets a finished explanation into high, medium and low importance.

use serde::{Deserialize, Serialize};

use crate::config::CategorizerConfig;
use crate::types::ExplanationResult;

/// Features per importance bucket, each in explanation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Categories {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

pub trait Categorizer: Send + Sync {
    fn categorize(&self, explanation: &ExplanationResult) -> Categories;
}

/// Thresholds at percentiles of the explanation's own score distribution.
///
/// Zero scores never land in a bucket, and the medium and low buckets stay
/// empty when their lower threshold is not positive.
#[derive(Debug, Clone)]
pub struct PercentileCategorizer {
    upper: f64,
    middle: f64,
    lower: f64,
}

impl PercentileCategorizer {
    pub fn new(upper: f64, middle: f64, lower: f64) -> Self {
        Self {
            upper,
            middle,
            lower,
        }
    }

    pub fn from_config(config: &CategorizerConfig) -> Self {
        Self::new(
            config.upper_percentile,
            config.middle_percentile,
            config.lower_percentile,
        )
    }
}

impl Default for PercentileCategorizer {
    fn default() -> Self {
        Self::new(85.0, 75.0, 10.0)
    }
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let fraction = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}

impl Categorizer for PercentileCategorizer {
    fn categorize(&self, explanation: &ExplanationResult) -> Categories {
        let scores = explanation.scores();
        let (Some(upper), Some(middle), Some(lower)) = (
            percentile(&scores, self.upper),
            percentile(&scores, self.middle),
            percentile(&scores, self.lower),
        ) else {
            return Categories::default();
        };

        let mut categories = Categories::default();
        for item in &explanation.explanations {
            let score = item.score;
            if score == 0.0 {
                continue;
            }
            if score >= upper {
                categories.high.push(item.feature.clone());
            } else if score >= middle && middle > 0.0 {
                categories.medium.push(item.feature.clone());
            } else if score < middle && score >= lower && lower > 0.0 {
                categories.low.push(item.feature.clone());
            }
        }
        categories
    }
}
