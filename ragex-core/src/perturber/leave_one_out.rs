//! Leave-one-out perturbation: drop the feature from the text.

use async_trait::async_trait;

use super::{Perturber, replace_first};
use crate::error::Result;

/// Removes the feature from the text.
#[derive(Debug, Clone, Default)]
pub struct LeaveOneOutPerturber;

impl LeaveOneOutPerturber {
    pub fn new() -> Self {
        Self
    }

    pub fn perturb_sync(&self, text: &str, features: &[String]) -> Vec<String> {
        features
            .iter()
            .map(|feature| replace_first(text, feature, "").trim().to_string())
            .collect()
    }
}

#[async_trait]
impl Perturber for LeaveOneOutPerturber {
    fn name(&self) -> &str {
        "leave_one_out"
    }

    async fn perturb(&self, text: &str, features: &[String]) -> Result<Vec<String>> {
        Ok(self.perturb_sync(text, features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn features(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_removes_each_feature() {
        let text = "Berlin is the capital of Germany.";
        let out = LeaveOneOutPerturber::new().perturb_sync(text, &features(&["Berlin", "Germany"]));
        assert_eq!(out, vec!["is the capital of Germany.", "Berlin is the capital of ."]);
    }

    #[test]
    fn test_duplicate_feature_removes_first_occurrence() {
        let out = LeaveOneOutPerturber::new().perturb_sync("go go home", &features(&["go"]));
        assert_eq!(out, vec!["go home"]);
    }

    #[test]
    fn test_absent_feature_keeps_text() {
        let out = LeaveOneOutPerturber::new().perturb_sync(" hello ", &features(&["moon"]));
        assert_eq!(out, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_trait_dispatch() {
        let perturber: Box<dyn Perturber> = Box::new(LeaveOneOutPerturber::new());
        let out = perturber
            .perturb("a b c", &features(&["b"]))
            .await
            .unwrap();
        assert_eq!(out, vec!["a  c"]);
        assert_eq!(perturber.name(), "leave_one_out");
    }
}
