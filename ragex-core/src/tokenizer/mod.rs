//! Feature extraction: splits text into attributable units at a granularity.

mod custom;
mod language;

pub use custom::CustomTokenizer;
pub use language::Language;

use crate::types::Granularity;

/// Splits raw text into an ordered sequence of non-empty features.
pub trait Tokenizer: Send + Sync {
    /// Registry name of this tokenizer.
    fn name(&self) -> &str;

    fn tokenize(&self, text: &str, granularity: Granularity) -> Vec<String>;
}
