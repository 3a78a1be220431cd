//! Perturbation strategies: one altered copy of the text per feature.
//!
//! Every strategy rewrites only the first occurrence of a feature, so a
//! feature repeated in the text is perturbed at exactly one place. A
//! perturbation identical to the original text is kept and scored.

mod generative;
mod leave_one_out;
mod random_word;
mod reorder;

pub use generative::{GenerativeKind, GenerativePerturber, PromptTemplate};
pub use leave_one_out::LeaveOneOutPerturber;
pub use random_word::{Dictionary, RandomWordPerturber};
pub use reorder::ReorderPerturber;

use async_trait::async_trait;

use crate::error::Result;

/// Produces one perturbed text per feature, in feature order.
#[async_trait]
pub trait Perturber: Send + Sync {
    /// Registry name of this strategy.
    fn name(&self) -> &str;

    async fn perturb(&self, text: &str, features: &[String]) -> Result<Vec<String>>;
}

/// Replace the first occurrence of `feature` in `text`.
///
/// An empty feature leaves the text untouched.
pub fn replace_first(text: &str, feature: &str, replacement: &str) -> String {
    if feature.is_empty() {
        return text.to_string();
    }
    text.replacen(feature, replacement, 1)
}
