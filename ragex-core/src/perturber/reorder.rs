//! Word reordering within a feature.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Perturber, replace_first};
use crate::error::Result;

/// Shuffles word order inside each feature.
///
/// Every word is swapped with a random neighbour. If the swaps happen to
/// restore the original order the words are rotated by one instead, so a
/// feature with at least two distinct words always changes.
#[derive(Debug, Clone)]
pub struct ReorderPerturber {
    seed: u64,
}

impl ReorderPerturber {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn reorder(words: &mut [&str], rng: &mut StdRng) {
        let n = words.len();
        if n < 2 {
            return;
        }
        let original = words.to_vec();
        for i in 0..n {
            let j = if i == 0 {
                1
            } else if i == n - 1 {
                n - 2
            } else if rng.gen_bool(0.5) {
                i - 1
            } else {
                i + 1
            };
            words.swap(i, j);
        }
        if *words == original[..] {
            words.rotate_left(1);
        }
    }

    pub fn perturb_sync(&self, text: &str, features: &[String]) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        features
            .iter()
            .map(|feature| {
                let mut words: Vec<&str> = feature.split_whitespace().collect();
                Self::reorder(&mut words, &mut rng);
                replace_first(text, feature, &words.join(" "))
            })
            .collect()
    }
}

impl Default for ReorderPerturber {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl Perturber for ReorderPerturber {
    fn name(&self) -> &str {
        "reorder_perturber"
    }

    async fn perturb(&self, text: &str, features: &[String]) -> Result<Vec<String>> {
        Ok(self.perturb_sync(text, features))
    }
}
