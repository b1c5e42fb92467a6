//! Lazy vs. eager fetch classification
//!
//! Most repositories in a large workspace are cloned only when first needed.
//! Meta-repositories (monorepos, workspace repos) are the exception: they are
//! fetched eagerly because they usually describe more structure. A node's
//! explicit `fetch` mode always wins; under `auto` the decision is made by
//! matching suffix patterns against the node name and the repo name in its
//! url.

use crate::config::{FetchMode, NodeDefinition};
use crate::path::repo_name_from_url;

/// Decides whether a node is lazy.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    patterns: Vec<String>,
}

impl Classifier {
    /// Build a classifier from suffix patterns. Patterns are matched
    /// case-insensitively; blank patterns are ignored.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    /// A classifier with this one's patterns plus `extra`.
    pub fn extended<S: AsRef<str>>(&self, extra: &[S]) -> Self {
        let mut patterns = self.patterns.clone();
        patterns.extend(Self::new(extra).patterns);
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `candidate` ends with any eager pattern.
    pub fn matches_eager(&self, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        self.patterns.iter().any(|p| candidate.ends_with(p.as_str()))
    }

    /// Effective lazy flag of a node.
    pub fn effective_lazy(&self, node: &NodeDefinition) -> bool {
        match node.fetch {
            FetchMode::Eager => false,
            FetchMode::Lazy => true,
            FetchMode::Auto | FetchMode::Other(_) => {
                if self.matches_eager(&node.name) {
                    return false;
                }
                if let Some(url) = node.url() {
                    if self.matches_eager(&repo_name_from_url(url)) {
                        return false;
                    }
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::EmbeddedDefaults;

    fn classifier() -> Classifier {
        let defaults = EmbeddedDefaults::builtin().unwrap();
        Classifier::new(&defaults.detection.eager_patterns)
    }

    #[test]
    fn test_monorepo_name_is_eager() {
        let node = NodeDefinition::repo("backend-monorepo", "https://example.com/backend.git");
        assert!(!classifier().effective_lazy(&node));
    }

    #[test]
    fn test_url_derived_name_is_eager() {
        let node = NodeDefinition::repo(
            "fulfillment",
            "https://github.com/acme/fulfillment-munorepo.git",
        );
        assert!(!classifier().effective_lazy(&node));
    }

    #[test]
    fn test_plain_repo_is_lazy() {
        let node = NodeDefinition::repo("payments", "https://github.com/acme/payments.git");
        assert!(classifier().effective_lazy(&node));
    }

    #[test]
    fn test_suffix_only_not_substring() {
        let node = NodeDefinition::repo(
            "some-repo-service",
            "https://github.com/acme/some-repo-service.git",
        );
        assert!(classifier().effective_lazy(&node));
    }

    #[test]
    fn test_case_insensitive() {
        let node = NodeDefinition::repo("Backend-MONOREPO", "https://example.com/x.git");
        assert!(!classifier().effective_lazy(&node));

        let upper = Classifier::new(["-META"]);
        assert!(upper.matches_eager("platform-meta"));
    }

    #[test]
    fn test_explicit_modes_win() {
        let c = classifier();
        let lazy_monorepo = NodeDefinition::repo("backend-monorepo", "https://example.com/b.git")
            .with_fetch(FetchMode::Lazy);
        assert!(c.effective_lazy(&lazy_monorepo));

        let eager_plain = NodeDefinition::repo("payments", "https://example.com/payments.git")
            .with_fetch(FetchMode::Eager);
        assert!(!c.effective_lazy(&eager_plain));
    }

    #[test]
    fn test_unknown_fetch_behaves_like_auto() {
        let c = classifier();
        let odd_plain = NodeDefinition::repo("payments", "https://example.com/payments.git")
            .with_fetch(FetchMode::Other("sometimes".to_string()));
        assert!(c.effective_lazy(&odd_plain));

        let odd_meta = NodeDefinition::repo("platform-meta", "https://example.com/p.git")
            .with_fetch(FetchMode::Other("sometimes".to_string()));
        assert!(!c.effective_lazy(&odd_meta));
    }

    #[test]
    fn test_config_node_without_url_uses_name_only() {
        let c = classifier();
        assert!(c.effective_lazy(&NodeDefinition::config_ref("team", "team/muno.yaml")));
        assert!(!c.effective_lazy(&NodeDefinition::config_ref(
            "team-workspace",
            "team/muno.yaml"
        )));
    }

    #[test]
    fn test_extended_patterns() {
        let c = classifier().extended(&["-platform"]);
        let node = NodeDefinition::repo("core-platform", "https://example.com/core.git");
        assert!(!c.effective_lazy(&node));
        assert!(classifier().effective_lazy(&node));
    }

    #[test]
    fn test_blank_patterns_are_ignored() {
        let c = Classifier::new(["", "  "]);
        assert!(c.patterns().is_empty());
        assert!(!c.matches_eager("anything"));
    }
}
