//! Score utilities: min-max normalization, similarity inversion and ranking.

use crate::types::FeatureImportance;

/// Min-max scale `scores` into `[0, 1]`.
///
/// A batch without variance (including empty and single-element batches) is
/// returned unchanged.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    let (min, max) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });
    let range = max - min;
    if scores.is_empty() || range == 0.0 || !range.is_finite() {
        return scores.to_vec();
    }
    scores.iter().map(|s| (s - min) / range).collect()
}

/// Turn similarities into dissimilarities (`1 - s`).
pub fn reverse_scores(scores: &[f64]) -> Vec<f64> {
    scores.iter().map(|s| 1.0 - s).collect()
}

/// Optionally normalize, then invert.
pub fn finalize_similarities(similarities: &[f64], normalize: bool) -> Vec<f64> {
    if normalize {
        reverse_scores(&normalize_scores(similarities))
    } else {
        reverse_scores(similarities)
    }
}

/// Stable ascending sort by score. Equal scores keep feature order.
pub fn sort_by_score(mut explanations: Vec<FeatureImportance>) -> Vec<FeatureImportance> {
    explanations.sort_by(|a, b| a.score.total_cmp(&b.score));
    explanations
}

/// Pair features with their scores, then rank them.
pub fn rank_features(features: &[String], scores: &[f64]) -> Vec<FeatureImportance> {
    let pairs = features
        .iter()
        .zip(scores)
        .map(|(f, &s)| FeatureImportance::new(f.clone(), s))
        .collect();
    sort_by_score(pairs)
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
