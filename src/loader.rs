//! Recursive configuration loading
//!
//! The workspace tree is spread over many configuration files. This module
//! turns one file into a [`Level`]: the parsed tree plus everything needed to
//! interpret its nodes (where children live on disk, which eager patterns and
//! config overrides apply, which files were visited on the way here).
//!
//! A node contributes a new level in two ways:
//!
//! - **Delegation**: a `config:` node points at another file, resolved
//!   relative to the file that declares the node. Its children are
//!   materialized in the node's own directory, which also receives a marker
//!   (a symlink named like a config file) pointing at the real definition.
//! - **Hosted config**: a cloned repository that carries a configuration file
//!   at its root. Its children are materialized under the repository's
//!   `repos_dir`.
//!
//! Loaded levels are never cached: navigating again reloads and revalidates
//! the files.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::classifier::Classifier;
use crate::config::{ConfigTree, NodeDefinition};
use crate::defaults::EmbeddedDefaults;
use crate::error::{Error, Result};
use crate::resolver::ConfigResolver;

/// Return the first accepted configuration file in `dir`.
///
/// Names are tried in the order of the embedded defaults, which lists the
/// non-hidden names before the dotted ones.
pub fn auto_discover_config(dir: &Path, defaults: &EmbeddedDefaults) -> Option<PathBuf> {
    defaults
        .files
        .config_names
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// One loaded level of the tree.
#[derive(Debug, Clone)]
pub struct Level {
    pub tree: ConfigTree,
    /// The file `tree` was loaded from.
    pub config_file: PathBuf,
    /// Directory where this level's nodes are materialized.
    pub children_dir: PathBuf,
    /// Eager patterns in effect for this level's nodes.
    pub classifier: Classifier,
    /// Config values in effect for this level's nodes.
    pub resolver: ConfigResolver,
    /// Canonical config files from the root down to this one.
    chain: Vec<PathBuf>,
}

impl Level {
    /// Directory where the child `name` is materialized.
    pub fn node_dir(&self, name: &str) -> PathBuf {
        self.children_dir.join(name)
    }

    /// Absolute location of the file a delegation node points at.
    pub fn delegated_config_path(&self, node: &NodeDefinition) -> Option<PathBuf> {
        let reference = Path::new(node.config_ref_path()?);
        if reference.is_absolute() {
            Some(reference.to_path_buf())
        } else {
            Some(self.tree.path.join(reference))
        }
    }
}

/// Loads levels for a workspace.
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader<'a> {
    defaults: &'a EmbeddedDefaults,
    write_markers: bool,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(defaults: &'a EmbeddedDefaults) -> Self {
        Self {
            defaults,
            write_markers: true,
        }
    }

    /// Loader that never writes to disk, for read-only views.
    pub fn read_only(defaults: &'a EmbeddedDefaults) -> Self {
        Self {
            defaults,
            write_markers: false,
        }
    }

    /// Load the workspace root file.
    pub fn load_root(&self, config_file: &Path, resolver: ConfigResolver) -> Result<Level> {
        let tree = ConfigTree::load(config_file, self.defaults)?;
        let children_dir = tree.path.join(&tree.workspace.repos_dir);
        let resolver = resolver.with_workspace(tree.overrides.as_ref());
        let classifier = self.base_classifier().extended(tree.extra_eager_patterns());
        Ok(Level {
            chain: vec![canonical(config_file)],
            config_file: config_file.to_path_buf(),
            children_dir,
            classifier,
            resolver,
            tree,
        })
    }

    /// Load the level a `config:` node delegates to.
    ///
    /// `node_dir` is the node's materialized directory; it becomes the
    /// children directory of the new level and receives the marker.
    pub fn load_delegated(
        &self,
        parent: &Level,
        node: &NodeDefinition,
        node_path: &str,
        node_dir: &Path,
    ) -> Result<Level> {
        let config_file =
            parent
                .delegated_config_path(node)
                .ok_or_else(|| Error::InvalidOperation {
                    message: format!("node {} does not delegate to a config file", node_path),
                })?;

        if !config_file.is_file() {
            return Err(Error::ConfigNotFound {
                path: config_file,
                node_path: node_path.to_string(),
            });
        }

        let level = self.load_child(parent, &config_file, node_path, node_dir.to_path_buf())?;
        if self.write_markers {
            self.write_marker(node_dir, &config_file)?;
        }
        Ok(level)
    }

    /// Load the config hosted at the root of a cloned repository, if any.
    pub fn load_hosted(
        &self,
        parent: &Level,
        node_path: &str,
        repo_dir: &Path,
    ) -> Result<Option<Level>> {
        let Some(config_file) = auto_discover_config(repo_dir, self.defaults) else {
            return Ok(None);
        };
        let mut level = self.load_child(parent, &config_file, node_path, PathBuf::new())?;
        level.children_dir = repo_dir.join(&level.tree.workspace.repos_dir);
        Ok(Some(level))
    }

    fn load_child(
        &self,
        parent: &Level,
        config_file: &Path,
        node_path: &str,
        children_dir: PathBuf,
    ) -> Result<Level> {
        let key = canonical(config_file);
        if parent.chain.contains(&key) {
            let mut chain: Vec<String> = parent
                .chain
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            chain.push(key.display().to_string());
            return Err(Error::CircularReference {
                chain: chain.join(" -> "),
            });
        }

        debug!("loading config for {} from {}", node_path, config_file.display());
        let tree = ConfigTree::load(config_file, self.defaults).map_err(|e| Error::ConfigLoad {
            node_path: node_path.to_string(),
            source: Box::new(e),
        })?;

        let mut chain = parent.chain.clone();
        chain.push(key);

        Ok(Level {
            classifier: self.base_classifier().extended(tree.extra_eager_patterns()),
            resolver: parent
                .resolver
                .clone()
                .with_workspace(tree.overrides.as_ref()),
            config_file: config_file.to_path_buf(),
            children_dir,
            chain,
            tree,
        })
    }

    fn base_classifier(&self) -> Classifier {
        Classifier::new(&self.defaults.detection.eager_patterns)
    }

    /// Place a marker in `node_dir` pointing at `target`.
    ///
    /// An existing regular file of the same name is left alone.
    fn write_marker(&self, node_dir: &Path, target: &Path) -> Result<()> {
        fs::create_dir_all(node_dir).map_err(|e| Error::io(node_dir, e))?;
        let marker = node_dir.join(self.defaults.primary_config_name());
        let target = canonical(target);

        if let Ok(meta) = marker.symlink_metadata() {
            if !meta.file_type().is_symlink() {
                return Ok(());
            }
            if fs::read_link(&marker).ok().as_deref() == Some(target.as_path()) {
                return Ok(());
            }
            fs::remove_file(&marker).map_err(|e| Error::io(&marker, e))?;
        }

        if canonical(&marker) == target {
            return Ok(());
        }
        create_marker(&target, &marker)
    }
}

#[cfg(unix)]
fn create_marker(target: &Path, marker: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, marker).map_err(|e| Error::io(marker, e))
}

#[cfg(not(unix))]
fn create_marker(target: &Path, marker: &Path) -> Result<()> {
    let note = format!("# muno config delegation\n# see: {}\n", target.display());
    fs::write(marker, note).map_err(|e| Error::io(marker, e))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> EmbeddedDefaults {
        EmbeddedDefaults::builtin().unwrap()
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn root_level(d: &EmbeddedDefaults, file: &Path) -> Level {
        ConfigLoader::new(d)
            .load_root(file, ConfigResolver::new(d))
            .unwrap()
    }

    #[test]
    fn test_auto_discover_prefers_non_hidden() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        assert_eq!(auto_discover_config(temp.path(), &d), None);

        write(&temp.path().join(".muno.yaml"), "");
        assert_eq!(
            auto_discover_config(temp.path(), &d),
            Some(temp.path().join(".muno.yaml"))
        );

        write(&temp.path().join("muno.yml"), "");
        assert_eq!(
            auto_discover_config(temp.path(), &d),
            Some(temp.path().join("muno.yml"))
        );

        write(&temp.path().join("muno.yaml"), "");
        assert_eq!(
            auto_discover_config(temp.path(), &d),
            Some(temp.path().join("muno.yaml"))
        );
    }

    #[test]
    fn test_load_root_children_dir() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let file = temp.path().join("muno.yaml");
        write(&file, "workspace:\n  name: ws\n");

        let level = root_level(&d, &file);
        assert_eq!(level.children_dir, temp.path().join(".nodes"));
        assert_eq!(level.node_dir("api"), temp.path().join(".nodes/api"));
    }

    #[test]
    fn test_load_delegated_relative_to_referencing_file() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let root = temp.path().join("ws/muno.yaml");
        write(
            &root,
            "workspace:\n  name: ws\nnodes:\n  - name: team\n    config: ../team/muno.yaml\n",
        );
        write(
            &temp.path().join("team/muno.yaml"),
            "workspace:\n  name: team\nnodes:\n  \
             - name: repo1\n    url: https://example.com/repo1.git\n",
        );

        let parent = root_level(&d, &root);
        let node = parent.tree.find_node("team").unwrap().clone();
        let node_dir = parent.node_dir("team");
        let level = ConfigLoader::new(&d)
            .load_delegated(&parent, &node, "/team", &node_dir)
            .unwrap();

        assert_eq!(level.tree.workspace.name, "team");
        assert_eq!(level.children_dir, node_dir);
        assert!(node_dir.join("muno.yaml").symlink_metadata().is_ok());
        assert_eq!(auto_discover_config(&node_dir, &d), Some(node_dir.join("muno.yaml")));
    }

    #[cfg(unix)]
    #[test]
    fn test_marker_is_symlink_to_real_file() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let root = temp.path().join("muno.yaml");
        write(
            &root,
            "workspace:\n  name: ws\nnodes:\n  - name: team\n    config: defs/team.yaml\n",
        );
        write(&temp.path().join("defs/team.yaml"), "workspace:\n  name: team\n");

        let parent = root_level(&d, &root);
        let node = parent.tree.find_node("team").unwrap().clone();
        let node_dir = parent.node_dir("team");
        let loader = ConfigLoader::new(&d);
        loader.load_delegated(&parent, &node, "/team", &node_dir).unwrap();
        // Loading twice is idempotent.
        loader.load_delegated(&parent, &node, "/team", &node_dir).unwrap();

        let link = fs::read_link(node_dir.join("muno.yaml")).unwrap();
        assert_eq!(
            link,
            fs::canonicalize(temp.path().join("defs/team.yaml")).unwrap()
        );
    }

    #[test]
    fn test_read_only_loader_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let root = temp.path().join("muno.yaml");
        write(
            &root,
            "workspace:\n  name: ws\nnodes:\n  - name: team\n    config: team.yaml\n",
        );
        write(&temp.path().join("team.yaml"), "workspace:\n  name: team\n");

        let parent = root_level(&d, &root);
        let node = parent.tree.find_node("team").unwrap().clone();
        let node_dir = parent.node_dir("team");
        ConfigLoader::read_only(&d)
            .load_delegated(&parent, &node, "/team", &node_dir)
            .unwrap();
        assert!(!node_dir.exists());
    }

    #[test]
    fn test_missing_delegated_file() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let root = temp.path().join("muno.yaml");
        write(
            &root,
            "workspace:\n  name: ws\nnodes:\n  - name: team\n    config: nowhere.yaml\n",
        );
        let parent = root_level(&d, &root);
        let node = parent.tree.find_node("team").unwrap().clone();
        let err = ConfigLoader::new(&d)
            .load_delegated(&parent, &node, "/team", &parent.node_dir("team"))
            .unwrap_err();
        match err {
            Error::ConfigNotFound { node_path, .. } => assert_eq!(node_path, "/team"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_delegated_file_names_node() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let root = temp.path().join("muno.yaml");
        write(
            &root,
            "workspace:\n  name: ws\nnodes:\n  - name: team\n    config: team.yaml\n",
        );
        write(
            &temp.path().join("team.yaml"),
            "workspace:\n  name: team\nnodes:\n  - name: broken\n",
        );
        let parent = root_level(&d, &root);
        let node = parent.tree.find_node("team").unwrap().clone();
        let err = ConfigLoader::new(&d)
            .load_delegated(&parent, &node, "/team", &parent.node_dir("team"))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/team"));
        assert!(message.contains("must have either url or config"));
    }

    #[test]
    fn test_cycle_is_detected() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let a = temp.path().join("a/muno.yaml");
        let b = temp.path().join("b/muno.yaml");
        write(
            &a,
            "workspace:\n  name: a\nnodes:\n  - name: b\n    config: ../b/muno.yaml\n",
        );
        write(
            &b,
            "workspace:\n  name: b\nnodes:\n  - name: a\n    config: ../a/muno.yaml\n",
        );

        let loader = ConfigLoader::read_only(&d);
        let level_a = root_level(&d, &a);
        let node_b = level_a.tree.find_node("b").unwrap().clone();
        let level_b = loader
            .load_delegated(&level_a, &node_b, "/b", &level_a.node_dir("b"))
            .unwrap();
        let node_a = level_b.tree.find_node("a").unwrap().clone();
        let err = loader
            .load_delegated(&level_b, &node_a, "/b/a", &level_b.node_dir("a"))
            .unwrap_err();
        assert!(matches!(err, Error::CircularReference { .. }));
        assert!(err.to_string().contains(" -> "));
    }

    #[test]
    fn test_hosted_config_children_dir() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let root = temp.path().join("muno.yaml");
        write(
            &root,
            "workspace:\n  name: ws\nnodes:\n  \
             - name: platform-monorepo\n    url: https://example.com/p.git\n",
        );
        let parent = root_level(&d, &root);
        let repo_dir = parent.node_dir("platform-monorepo");
        let loader = ConfigLoader::new(&d);

        fs::create_dir_all(repo_dir.join(".git")).unwrap();
        assert!(loader
            .load_hosted(&parent, "/platform-monorepo", &repo_dir)
            .unwrap()
            .is_none());

        write(
            &repo_dir.join("muno.yaml"),
            "workspace:\n  name: platform\n  repos_dir: services\n",
        );
        let level = loader
            .load_hosted(&parent, "/platform-monorepo", &repo_dir)
            .unwrap()
            .unwrap();
        assert_eq!(level.children_dir, repo_dir.join("services"));
    }

    #[test]
    fn test_level_overrides_layer_over_parent() {
        let temp = TempDir::new().unwrap();
        let d = defaults();
        let root = temp.path().join("muno.yaml");
        write(
            &root,
            "workspace:\n  name: ws\noverrides:\n  git:\n    clone_timeout: 100\n    \
             default_remote: upstream\nnodes:\n  - name: team\n    config: team.yaml\n",
        );
        write(
            &temp.path().join("team.yaml"),
            "workspace:\n  name: team\noverrides:\n  git:\n    clone_timeout: 50\n",
        );
        let parent = root_level(&d, &root);
        let node = parent.tree.find_node("team").unwrap().clone();
        let level = ConfigLoader::read_only(&d)
            .load_delegated(&parent, &node, "/team", &parent.node_dir("team"))
            .unwrap();
        assert_eq!(level.resolver.clone_timeout(None).as_secs(), 50);
        assert_eq!(level.resolver.default_remote(None), "upstream");
        assert_eq!(parent.resolver.clone_timeout(None).as_secs(), 100);
    }
}
