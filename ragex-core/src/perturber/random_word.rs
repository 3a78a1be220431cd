//! Random word insertion from a dictionary, seeded per call.

use std::path::Path;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{Perturber, replace_first};
use crate::error::{ConfigError, Result};

const BUNDLED_DICTIONARY: &str = include_str!("../../assets/dictionary.txt");

/// Word list random insertions draw from.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: Vec<String>,
}

impl Dictionary {
    /// The word list shipped with the crate.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_DICTIONARY)
    }

    /// One word per line; blank lines are skipped.
    pub fn parse(raw: &str) -> Self {
        Self {
            words: raw
                .lines()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let dictionary = Self::parse(&std::fs::read_to_string(path)?);
        if dictionary.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("dictionary {} contains no words", path.display()),
            }
            .into());
        }
        Ok(dictionary)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Draws tried before falling back to a fixed placement.
const MAX_DRAWS: usize = 16;

/// Inserts random dictionary words into each feature.
///
/// The generator is reseeded on every call, so the same input always yields
/// the same perturbations. For multi-word features the first insertion lands
/// between two words. A draw that still spells out the feature, as `zebra`
/// before `b` does for `a b`, is redrawn. After [`MAX_DRAWS`] misses, each
/// dictionary word is tried right after the feature's first word, with the
/// remaining insertions in front. Only a dictionary with no such word leaves
/// the feature intact.
#[derive(Debug, Clone)]
pub struct RandomWordPerturber {
    dictionary: Dictionary,
    inserted_words: usize,
    seed: u64,
}

impl RandomWordPerturber {
    pub fn new(dictionary: Dictionary, inserted_words: usize, seed: u64) -> Self {
        Self {
            dictionary,
            inserted_words,
            seed,
        }
    }

    pub fn perturb_sync(&self, text: &str, features: &[String]) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        features
            .iter()
            .map(|feature| replace_first(text, feature, &self.perturb_feature(feature, &mut rng)))
            .collect()
    }

    fn perturb_feature(&self, feature: &str, rng: &mut StdRng) -> String {
        let words: Vec<&str> = feature.split_whitespace().collect();
        if words.len() < 2 || self.inserted_words == 0 || self.dictionary.is_empty() {
            return self.draw(&words, rng);
        }

        let mut span = String::new();
        for _ in 0..MAX_DRAWS {
            span = self.draw(&words, rng);
            if !span.contains(feature) {
                return span;
            }
        }
        for safe in &self.dictionary.words {
            let candidate = self.insert_after_first(&words, safe, rng);
            if !candidate.contains(feature) {
                return candidate;
            }
        }
        span
    }

    fn draw(&self, feature_words: &[&str], rng: &mut StdRng) -> String {
        let mut words: Vec<&str> = feature_words.to_vec();
        for i in 0..self.inserted_words {
            let Some(word) = self.dictionary.words.choose(rng) else {
                break;
            };
            let position = if i == 0 && words.len() >= 2 {
                rng.gen_range(1..words.len())
            } else {
                rng.gen_range(0..=words.len())
            };
            words.insert(position, word.as_str());
        }
        words.join(" ")
    }

    fn insert_after_first(&self, feature_words: &[&str], safe: &str, rng: &mut StdRng) -> String {
        let mut words: Vec<&str> = feature_words.to_vec();
        words.insert(1, safe);
        for _ in 1..self.inserted_words {
            if let Some(word) = self.dictionary.words.choose(rng) {
                words.insert(0, word.as_str());
            }
        }
        words.join(" ")
    }
}

impl Default for RandomWordPerturber {
    fn default() -> Self {
        Self::new(Dictionary::bundled(), 2, 42)
    }
}

#[async_trait]
impl Perturber for RandomWordPerturber {
    fn name(&self) -> &str {
        "random_word_perturber"
    }

    async fn perturb(&self, text: &str, features: &[String]) -> Result<Vec<String>> {
        Ok(self.perturb_sync(text, features))
    }
}
