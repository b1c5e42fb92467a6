//! # Configuration Tree Model
//!
//! This module defines the data structures that represent a `muno.yaml` file
//! and the logic to load, validate, and save it.
//!
//! A single file describes one *level* of the workspace tree: the workspace
//! settings and the flat list of that level's direct children. A child is
//! either a repository (`url`) or a delegation to another configuration file
//! (`config`), whose nodes become the child's own children. The full tree is
//! therefore a forest of independently owned files that the navigator stitches
//! together at traversal time.
//!
//! ```yaml
//! workspace:
//!   name: platform
//!   repos_dir: .nodes
//! defaults:
//!   ssh_preference: true
//! overrides:
//!   git:
//!     default_branch: develop
//! nodes:
//!   - name: backend-monorepo
//!     url: https://github.com/acme/backend-monorepo.git
//!   - name: payments
//!     url: https://github.com/acme/payments.git
//!     fetch: lazy
//!     default_branch: trunk
//!   - name: team
//!     config: ../team/muno.yaml
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::EmbeddedDefaults;
use crate::error::{Error, Result};

/// Free-form nested map used for override layers and metadata.
pub type ConfigMap = serde_yaml::Mapping;

/// Workspace settings for one configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Workspace name. Required.
    #[serde(default)]
    pub name: String,
    /// Set when the directory holding this file is itself a git repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_repo: Option<String>,
    /// Subdirectory where this level's children are materialized.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repos_dir: String,
}

/// Per-level defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDefaults {
    /// Rewrite https clone urls to SSH before cloning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_preference: Option<bool>,
    /// Extra eager-fetch suffixes for nodes declared in this file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eager_patterns: Vec<String>,
}

/// Fetch policy of a node.
///
/// Values other than `auto`, `lazy`, and `eager` are kept verbatim so that
/// saving a file does not rewrite them, and are classified exactly like
/// `auto`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchMode {
    #[default]
    Auto,
    Lazy,
    Eager,
    Other(String),
}

impl FetchMode {
    pub fn is_auto(&self) -> bool {
        matches!(self, FetchMode::Auto)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FetchMode::Auto => "auto",
            FetchMode::Lazy => "lazy",
            FetchMode::Eager => "eager",
            FetchMode::Other(s) => s,
        }
    }
}

impl From<String> for FetchMode {
    fn from(value: String) -> Self {
        let mode = match value.trim() {
            "" | "auto" => Some(FetchMode::Auto),
            "lazy" => Some(FetchMode::Lazy),
            "eager" => Some(FetchMode::Eager),
            _ => None,
        };
        mode.unwrap_or(FetchMode::Other(value))
    }
}

impl From<FetchMode> for String {
    fn from(value: FetchMode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FetchMode {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FetchMode {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map(FetchMode::from).unwrap_or_default())
    }
}

/// One entry of a configuration file's `nodes` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Name, unique among siblings (not enforced).
    #[serde(default)]
    pub name: String,
    /// Git remote for repository nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path to another configuration file for delegation nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(default, skip_serializing_if = "FetchMode::is_auto")]
    pub fetch: FetchMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConfigMap>,
}

impl NodeDefinition {
    /// Create a repository node.
    pub fn repo(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Create a configuration delegation node.
    pub fn config_ref(name: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Some(config.into()),
            ..Default::default()
        }
    }

    pub fn with_fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = fetch;
        self
    }

    /// The url, treating an empty string as unset.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// The config reference, treating an empty string as unset.
    pub fn config_ref_path(&self) -> Option<&str> {
        self.config.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn is_config(&self) -> bool {
        self.config_ref_path().is_some()
    }

    /// Explicit default branch, treating an empty string as unset.
    pub fn default_branch(&self) -> Option<&str> {
        self.default_branch
            .as_deref()
            .filter(|b| !b.trim().is_empty())
    }
}

/// One level of the workspace tree, loaded from exactly one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigTree {
    pub workspace: WorkspaceSettings,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<TreeDefaults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigMap>,
    /// Directory of the file this tree was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl ConfigTree {
    /// Create an empty tree for a new workspace.
    pub fn new(name: impl Into<String>, defaults: &EmbeddedDefaults) -> Self {
        Self {
            workspace: WorkspaceSettings {
                name: name.into(),
                root_repo: None,
                repos_dir: defaults.workspace.repos_dir.clone(),
            },
            ..Default::default()
        }
    }

    /// Parse YAML content without applying defaults or validating.
    ///
    /// `source` is only used for error messages.
    pub fn parse(yaml_content: &str, source: &Path) -> Result<Self> {
        serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
            path: source.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load, merge onto the embedded defaults, and validate a config file.
    pub fn load(path: &Path, defaults: &EmbeddedDefaults) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut tree = Self::parse(&content, path)?;
        tree.apply_defaults(defaults);
        tree.path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tree.validate()?;
        Ok(tree)
    }

    /// Fill empty fields from the embedded defaults. Explicit values win.
    pub fn apply_defaults(&mut self, defaults: &EmbeddedDefaults) {
        if self.workspace.repos_dir.trim().is_empty() {
            self.workspace.repos_dir = defaults.workspace.repos_dir.clone();
        }
    }

    /// Check the structural rules of this level.
    pub fn validate(&self) -> Result<()> {
        if self.workspace.name.trim().is_empty() {
            return Err(Error::Validation {
                message: "workspace name is required".to_string(),
            });
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.name.trim().is_empty() {
                return Err(Error::Validation {
                    message: format!("node at index {} has no name", index),
                });
            }
            match (node.url(), node.config_ref_path()) {
                (Some(_), Some(_)) => {
                    return Err(Error::Validation {
                        message: format!("node '{}' cannot have both url and config", node.name),
                    });
                }
                (None, None) => {
                    return Err(Error::Validation {
                        message: format!("node '{}' must have either url or config", node.name),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Serialize to YAML and write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })?;
        fs::write(path, yaml).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    /// First node with the given name. Duplicate names are not rejected, so
    /// later duplicates are unreachable by name.
    pub fn find_node(&self, name: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Remove the first node with the given name.
    pub fn remove_node(&mut self, name: &str) -> Option<NodeDefinition> {
        let index = self.nodes.iter().position(|n| n.name == name)?;
        Some(self.nodes.remove(index))
    }

    /// SSH preference of this level, falling back to the embedded default.
    pub fn ssh_preference(&self, defaults: &EmbeddedDefaults) -> bool {
        self.defaults
            .as_ref()
            .and_then(|d| d.ssh_preference)
            .unwrap_or(defaults.workspace.ssh_preference)
    }

    /// Level-specific eager patterns (in addition to the embedded ones).
    pub fn extra_eager_patterns(&self) -> &[String] {
        self.defaults
            .as_ref()
            .map(|d| d.eager_patterns.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> EmbeddedDefaults {
        EmbeddedDefaults::builtin().unwrap()
    }

    #[test]
    fn test_parse_simple_config() {
        let yaml = r#"
workspace:
  name: platform
nodes:
  - name: backend-monorepo
    url: https://github.com/acme/backend-monorepo.git
  - name: payments
    url: git@github.com:acme/payments.git
    fetch: lazy
    default_branch: trunk
  - name: team
    config: ../team/muno.yaml
"#;
        let tree = ConfigTree::parse(yaml, Path::new("muno.yaml")).unwrap();
        assert_eq!(tree.workspace.name, "platform");
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[0].fetch, FetchMode::Auto);
        assert_eq!(tree.nodes[1].fetch, FetchMode::Lazy);
        assert_eq!(tree.nodes[1].default_branch(), Some("trunk"));
        assert!(tree.nodes[2].is_config());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_unknown_fetch_mode_is_preserved() {
        let yaml = r#"
workspace:
  name: ws
nodes:
  - name: odd
    url: https://example.com/odd.git
    fetch: sometimes
"#;
        let tree = ConfigTree::parse(yaml, Path::new("muno.yaml")).unwrap();
        assert_eq!(tree.nodes[0].fetch, FetchMode::Other("sometimes".to_string()));

        let out = serde_yaml::to_string(&tree).unwrap();
        assert!(out.contains("fetch: sometimes"));
    }

    #[test]
    fn test_empty_fetch_is_auto() {
        assert_eq!(FetchMode::from(String::new()), FetchMode::Auto);
        assert_eq!(FetchMode::from("auto".to_string()), FetchMode::Auto);
        assert_eq!(FetchMode::from("eager".to_string()), FetchMode::Eager);
    }

    #[test]
    fn test_validate_rejects_empty_workspace_name() {
        let tree = ConfigTree::default();
        let err = tree.validate().unwrap_err();
        assert!(err.to_string().contains("workspace name is required"));
    }

    #[test]
    fn test_validate_rejects_both_url_and_config() {
        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(NodeDefinition {
            name: "both".to_string(),
            url: Some("https://example.com/both.git".to_string()),
            config: Some("both/muno.yaml".to_string()),
            ..Default::default()
        });
        let err = tree.validate().unwrap_err();
        assert!(err.to_string().contains("cannot have both"));
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_validate_rejects_neither_url_nor_config() {
        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(NodeDefinition {
            name: "empty".to_string(),
            url: Some("   ".to_string()),
            ..Default::default()
        });
        let err = tree.validate().unwrap_err();
        assert!(err.to_string().contains("must have either"));
    }

    #[test]
    fn test_validate_rejects_nameless_node() {
        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(NodeDefinition::repo("", "https://example.com/x.git"));
        let err = tree.validate().unwrap_err();
        assert!(err.to_string().contains("has no name"));
    }

    #[test]
    fn test_validate_accepts_exactly_one_target() {
        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(NodeDefinition::repo("a", "https://example.com/a.git"));
        tree.nodes.push(NodeDefinition::config_ref("b", "b/muno.yaml"));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_duplicate_names_are_not_rejected() {
        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(NodeDefinition::repo("dup", "https://example.com/one.git"));
        tree.nodes.push(NodeDefinition::repo("dup", "https://example.com/two.git"));
        assert!(tree.validate().is_ok());
        assert_eq!(
            tree.find_node("dup").unwrap().url(),
            Some("https://example.com/one.git")
        );
    }

    #[test]
    fn test_load_applies_defaults_and_stamps_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("muno.yaml");
        fs::write(&path, "workspace:\n  name: ws\nnodes: []\n").unwrap();

        let tree = ConfigTree::load(&path, &defaults()).unwrap();
        assert_eq!(tree.workspace.repos_dir, ".nodes");
        assert_eq!(tree.path, temp.path());
    }

    #[test]
    fn test_load_keeps_explicit_repos_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("muno.yaml");
        fs::write(&path, "workspace:\n  name: ws\n  repos_dir: repos\n").unwrap();

        let tree = ConfigTree::load(&path, &defaults()).unwrap();
        assert_eq!(tree.workspace.repos_dir, "repos");
    }

    #[test]
    fn test_load_error_kinds_are_distinct() {
        let temp = TempDir::new().unwrap();

        let missing = ConfigTree::load(&temp.path().join("nope.yaml"), &defaults());
        assert!(matches!(missing, Err(Error::ConfigRead { .. })));

        let bad = temp.path().join("bad.yaml");
        fs::write(&bad, "workspace: [unclosed").unwrap();
        assert!(matches!(
            ConfigTree::load(&bad, &defaults()),
            Err(Error::ConfigParse { .. })
        ));

        let invalid = temp.path().join("invalid.yaml");
        fs::write(&invalid, "workspace:\n  name: \"\"\n").unwrap();
        assert!(matches!(
            ConfigTree::load(&invalid, &defaults()),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_save_creates_parent_and_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deep/nested/muno.yaml");

        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(
            NodeDefinition::repo("payments", "https://example.com/payments.git")
                .with_fetch(FetchMode::Lazy),
        );
        tree.save(&path).unwrap();

        let loaded = ConfigTree::load(&path, &defaults()).unwrap();
        assert_eq!(loaded.nodes, tree.nodes);
        assert_eq!(loaded.workspace.name, "ws");
    }

    #[test]
    fn test_save_omits_auto_fetch() {
        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(NodeDefinition::repo("a", "https://example.com/a.git"));
        let yaml = serde_yaml::to_string(&tree).unwrap();
        assert!(!yaml.contains("fetch"));
    }

    #[test]
    fn test_remove_node() {
        let mut tree = ConfigTree::new("ws", &defaults());
        tree.nodes.push(NodeDefinition::repo("a", "https://example.com/a.git"));
        tree.nodes.push(NodeDefinition::repo("b", "https://example.com/b.git"));
        assert!(tree.remove_node("a").is_some());
        assert!(tree.remove_node("a").is_none());
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_ssh_preference_falls_back_to_default() {
        let d = defaults();
        let mut tree = ConfigTree::new("ws", &d);
        assert!(!tree.ssh_preference(&d));
        tree.defaults = Some(TreeDefaults {
            ssh_preference: Some(true),
            eager_patterns: vec![],
        });
        assert!(tree.ssh_preference(&d));
    }
}
