//! # Tree Navigator
//!
//! Resolves slash-separated tree paths to nodes across the distributed tree
//! and materializes repositories on demand.
//!
//! No tree is kept in memory between calls. Every request starts from the
//! workspace root file, walks the path segment by segment, loads delegated or
//! hosted configuration files as it crosses them, and asks the filesystem for
//! the state of each repository it touches.
//!
//! ## Materialization
//!
//! [`Navigator::resolve`] clones every missing repository on the path,
//! including the target: explicit navigation overrides laziness.
//! [`Navigator::inspect`] performs the same walk without cloning or writing
//! anything; a missing repository then behaves as a leaf.
//!
//! ## Bulk operations
//!
//! [`Navigator::clone_lazy_repos`], [`Navigator::pull`], [`Navigator::push`]
//! and [`Navigator::commit`] work level by level. All jobs of one level run on
//! a bounded thread pool (`git.max_parallel`), and a level's clones finish
//! before the configs they host are read. A failing repository never stops
//! its siblings; failures are collected into a [`BulkReport`].

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde_yaml::Mapping;

use crate::config::{ConfigTree, FetchMode, NodeDefinition};
use crate::defaults::EmbeddedDefaults;
use crate::error::{Error, Result};
use crate::git::{CloneOptions, GitOperations, PullOptions};
use crate::loader::{auto_discover_config, ConfigLoader, Level};
use crate::path::{join_tree_path, normalize_tree_path, split_parent, split_segments, to_ssh_url};
use crate::resolver::ConfigResolver;
use crate::session::SessionState;
use crate::state::{is_dirty, live_state, repo_state, RepoState};
use crate::tree::{ChildInfo, NodeStatus, NodeType, TreeNode, TreeView};

/// Find the workspace configuration for `start`.
///
/// Walks from `start` up to the filesystem root and returns the nearest
/// configuration file. Delegation markers are skipped, so a directory that
/// only mirrors a delegated file is never mistaken for a workspace.
pub fn find_workspace_config(start: &Path, defaults: &EmbeddedDefaults) -> Result<PathBuf> {
    start
        .ancestors()
        .filter_map(|dir| auto_discover_config(dir, defaults))
        .find(|candidate| !is_symlink(candidate))
        .ok_or_else(|| Error::WorkspaceNotFound {
            start: start.to_path_buf(),
        })
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Materialize {
    /// Read-only: nothing is cloned or written.
    Never,
    /// Clone whatever is missing along the path.
    OnPath,
}

/// Result of walking a path.
struct Walk {
    node: TreeNode,
    definition: Option<NodeDefinition>,
    /// Level declaring the node's children, when it could be loaded.
    children: Option<Level>,
    /// Level declaring the node itself; `None` for the root.
    parent: Option<Level>,
}

/// A repository reached by a bulk traversal.
struct RepoTarget {
    path: String,
    dir: PathBuf,
    node_type: NodeType,
    definition: Option<NodeDefinition>,
    resolver: ConfigResolver,
}

impl RepoTarget {
    fn state(&self) -> RepoState {
        repo_state(&self.dir)
    }
}

struct CloneJob {
    url: String,
    dest: PathBuf,
    options: CloneOptions,
}

/// Outcome of a bulk operation.
#[derive(Debug)]
pub struct BulkReport {
    pub operation: String,
    /// Tree paths the operation succeeded for.
    pub succeeded: Vec<String>,
    /// Tree paths left alone by policy (lazy, clean, not cloned).
    pub skipped: Vec<String>,
    pub failures: Vec<(String, Error)>,
}

impl BulkReport {
    fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn collected failures into a single [`Error::BulkOperation`].
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        Err(Error::BulkOperation {
            operation: self.operation,
            failures: self
                .failures
                .iter()
                .map(|(path, e)| format!("  {}: {}", path, e))
                .collect(),
        })
    }

    fn record(&mut self, path: String, result: Result<()>) {
        match result {
            Ok(()) => self.succeeded.push(path),
            Err(e) => {
                warn!("{} failed for {}: {}", self.operation, path, e);
                self.failures.push((path, e));
            }
        }
    }
}

/// Entry point to a workspace.
pub struct Navigator {
    root_dir: PathBuf,
    config_file: PathBuf,
    defaults: EmbeddedDefaults,
    git: Box<dyn GitOperations>,
    cli_overrides: Mapping,
}

impl Navigator {
    /// Open the workspace whose root file is `config_file`.
    pub fn new(
        config_file: impl Into<PathBuf>,
        defaults: EmbeddedDefaults,
        git: Box<dyn GitOperations>,
    ) -> Result<Self> {
        let config_file = config_file.into();
        if !config_file.is_file() {
            return Err(Error::WorkspaceNotFound { start: config_file });
        }
        let root_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            root_dir,
            config_file,
            defaults,
            git,
            cli_overrides: Mapping::new(),
        })
    }

    /// Open the workspace containing `start`.
    pub fn discover(
        start: &Path,
        defaults: EmbeddedDefaults,
        git: Box<dyn GitOperations>,
    ) -> Result<Self> {
        let config_file = find_workspace_config(start, &defaults)?;
        Self::new(config_file, defaults, git)
    }

    /// Config values given on the command line; they win over every file.
    pub fn with_cli_overrides(mut self, overrides: Mapping) -> Self {
        self.cli_overrides = overrides;
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn defaults(&self) -> &EmbeddedDefaults {
        &self.defaults
    }

    /// Location of the session/position file.
    pub fn state_path(&self) -> PathBuf {
        self.root_dir.join(&self.defaults.files.state_file)
    }

    /// The root configuration file, loaded and validated.
    pub fn root_tree(&self) -> Result<ConfigTree> {
        ConfigTree::load(&self.config_file, &self.defaults)
    }

    /// Resolver for workspace-wide values (no node layer).
    pub fn resolver(&self) -> Result<ConfigResolver> {
        Ok(self.root_level(&self.read_only_loader())?.resolver)
    }

    /// Merged config values in effect for the node at `path`.
    pub fn effective_config(&self, path: &str) -> Result<Mapping> {
        let walk = self.walk(path, Materialize::Never)?;
        let level = walk
            .parent
            .as_ref()
            .or(walk.children.as_ref())
            .ok_or_else(|| Error::InvalidOperation {
                message: format!("no configuration level for {}", walk.node.path),
            })?;
        Ok(level.resolver.resolve(walk.definition.as_ref()))
    }

    // ------------------------------------------------------------------
    // Path resolution
    // ------------------------------------------------------------------

    /// Resolve an absolute path, cloning missing repositories on the way.
    ///
    /// Segments that run past a leaf are dropped and the leaf is returned.
    pub fn resolve(&self, path: &str) -> Result<TreeNode> {
        Ok(self.walk(path, Materialize::OnPath)?.node)
    }

    /// Resolve an absolute path without cloning or writing anything.
    pub fn inspect(&self, path: &str) -> Result<TreeNode> {
        Ok(self.walk(path, Materialize::Never)?.node)
    }

    /// Declared children of the node at `path`, with live state.
    ///
    /// Read-only: a repository that is not cloned lists no children.
    pub fn list_children(&self, path: &str) -> Result<Vec<ChildInfo>> {
        let walk = self.walk(path, Materialize::Never)?;
        Ok(walk
            .children
            .map(|level| {
                level
                    .tree
                    .nodes
                    .iter()
                    .map(|def| self.child_info(&level, def))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Read-only recursive view of the subtree at `path`.
    ///
    /// `depth` limits how many levels below `path` are included; `None`
    /// shows everything that can be seen without cloning.
    pub fn tree(&self, path: &str, depth: Option<usize>) -> Result<TreeView> {
        let loader = self.read_only_loader();
        let walk = self.walk(path, Materialize::Never)?;
        let children = match (&walk.children, depth) {
            (Some(_), Some(0)) | (None, _) => Vec::new(),
            (Some(level), depth) => {
                self.view_children(&loader, level, &walk.node.path, depth.map(|d| d - 1))?
            }
        };
        Ok(TreeView {
            node: walk.node,
            children,
        })
    }

    fn view_children(
        &self,
        loader: &ConfigLoader<'_>,
        level: &Level,
        owner: &str,
        depth: Option<usize>,
    ) -> Result<Vec<TreeView>> {
        level
            .tree
            .nodes
            .iter()
            .map(|def| {
                let node_path = join_tree_path(owner, &def.name);
                let (node, child) =
                    self.materialize(loader, level, def, &node_path, Materialize::Never)?;
                let children = match (child, depth) {
                    (Some(_), Some(0)) | (None, _) => Vec::new(),
                    (Some(child), depth) => {
                        self.view_children(loader, &child, &node_path, depth.map(|d| d - 1))?
                    }
                };
                Ok(TreeView { node, children })
            })
            .collect()
    }

    fn walk(&self, path: &str, mode: Materialize) -> Result<Walk> {
        let loader = match mode {
            Materialize::Never => self.read_only_loader(),
            Materialize::OnPath => ConfigLoader::new(&self.defaults),
        };
        let target = normalize_tree_path("/", path);
        let root = self.root_level(&loader)?;
        let mut walk = Walk {
            node: self.root_node(&root),
            definition: None,
            children: Some(root),
            parent: None,
        };

        for segment in split_segments(&target) {
            let Some(level) = walk.children.take() else {
                debug!(
                    "path {} runs past leaf {}; resolving to the leaf",
                    target, walk.node.path
                );
                break;
            };
            let definition = level.tree.find_node(segment).cloned().ok_or_else(|| {
                Error::NodeNotFound {
                    path: target.clone(),
                    parent: walk.node.path.clone(),
                    segment: segment.to_string(),
                }
            })?;
            let node_path = join_tree_path(&walk.node.path, segment);
            let (node, children) =
                self.materialize(&loader, &level, &definition, &node_path, mode)?;
            walk = Walk {
                node,
                definition: Some(definition),
                children,
                parent: Some(level),
            };
        }

        Ok(walk)
    }

    /// Build the runtime node for `def` and load the level of its children.
    fn materialize(
        &self,
        loader: &ConfigLoader<'_>,
        level: &Level,
        def: &NodeDefinition,
        node_path: &str,
        mode: Materialize,
    ) -> Result<(TreeNode, Option<Level>)> {
        let fs_path = level.node_dir(&def.name);

        if def.is_config() {
            let child = loader.load_delegated(level, def, node_path, &fs_path)?;
            let node = TreeNode {
                name: def.name.clone(),
                path: node_path.to_string(),
                node_type: NodeType::Config,
                url: None,
                lazy: false,
                state: self.config_state(level, def),
                children: child_names(&child),
                fs_path,
            };
            return Ok((node, Some(child)));
        }

        let lazy = level.classifier.effective_lazy(def);
        if mode == Materialize::OnPath && repo_state(&fs_path) == RepoState::Missing {
            let job = self.clone_job(level, def)?;
            info!("Materializing {}", node_path);
            self.run_clone(&job)?;
        }

        let state = repo_state(&fs_path);
        let child = match state {
            RepoState::Missing => None,
            _ => loader.load_hosted(level, node_path, &fs_path)?,
        };
        let node = TreeNode {
            name: def.name.clone(),
            path: node_path.to_string(),
            node_type: NodeType::Repo,
            url: def.url().map(str::to_string),
            lazy,
            state,
            children: child.as_ref().map(child_names).unwrap_or_default(),
            fs_path,
        };
        Ok((node, child))
    }

    fn root_level(&self, loader: &ConfigLoader<'_>) -> Result<Level> {
        let resolver = ConfigResolver::new(&self.defaults).with_cli(self.cli_overrides.clone());
        loader.load_root(&self.config_file, resolver)
    }

    fn root_node(&self, level: &Level) -> TreeNode {
        TreeNode {
            name: level.tree.workspace.name.clone(),
            path: "/".to_string(),
            node_type: NodeType::Root,
            url: level.tree.workspace.root_repo.clone(),
            lazy: false,
            state: repo_state(&self.root_dir),
            children: child_names(level),
            fs_path: self.root_dir.clone(),
        }
    }

    fn child_info(&self, level: &Level, def: &NodeDefinition) -> ChildInfo {
        if def.is_config() {
            return ChildInfo {
                name: def.name.clone(),
                node_type: NodeType::Config,
                lazy: false,
                state: self.config_state(level, def),
            };
        }
        ChildInfo {
            name: def.name.clone(),
            node_type: NodeType::Repo,
            lazy: level.classifier.effective_lazy(def),
            state: repo_state(&level.node_dir(&def.name)),
        }
    }

    /// A delegation is `Cloned` when the file it points at is reachable.
    fn config_state(&self, level: &Level, def: &NodeDefinition) -> RepoState {
        match level.delegated_config_path(def) {
            Some(file) if file.is_file() => RepoState::Cloned,
            _ => RepoState::Missing,
        }
    }

    fn read_only_loader(&self) -> ConfigLoader<'_> {
        ConfigLoader::read_only(&self.defaults)
    }

    // ------------------------------------------------------------------
    // Position
    // ------------------------------------------------------------------

    /// Current position, `/` when none was recorded.
    pub fn current_position(&self) -> Result<String> {
        Ok(SessionState::load(&self.state_path())?.current().to_string())
    }

    /// Interpret `input` against the current position.
    pub fn absolute_path(&self, input: &str) -> Result<String> {
        Ok(normalize_tree_path(&self.current_position()?, input))
    }

    /// Move to `path` (relative to the current position), materializing it.
    pub fn use_node(&self, path: &str) -> Result<TreeNode> {
        let state_path = self.state_path();
        let mut session = SessionState::load(&state_path)?;
        let target = normalize_tree_path(session.current(), path);
        let node = self.resolve(&target)?;
        session.set_current(node.path.clone());
        session.save(&state_path)?;
        info!("Current position is now {}", node.path);
        Ok(node)
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Declare a new repository under `parent` and persist the owning file.
    ///
    /// A non-lazy repository is cloned right away.
    pub fn add_repo(&self, parent: &str, name: &str, url: &str, lazy: bool) -> Result<TreeNode> {
        let name = name.trim();
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(Error::InvalidOperation {
                message: format!("'{}' is not a valid node name", name),
            });
        }

        let walk = self.walk(parent, Materialize::OnPath)?;
        let level = walk.children.ok_or_else(|| Error::InvalidOperation {
            message: format!("{} cannot hold children", walk.node.path),
        })?;
        if level.tree.find_node(name).is_some() {
            return Err(Error::InvalidOperation {
                message: format!("node '{}' already exists under {}", name, walk.node.path),
            });
        }

        let fetch = if lazy {
            FetchMode::Lazy
        } else {
            FetchMode::Eager
        };
        edit_level_file(&level.config_file, |tree| {
            tree.nodes
                .push(NodeDefinition::repo(name, url).with_fetch(fetch));
            Ok(())
        })?;
        info!("Added {} under {}", name, walk.node.path);

        let node_path = join_tree_path(&walk.node.path, name);
        if lazy {
            self.inspect(&node_path)
        } else {
            self.resolve(&node_path)
        }
    }

    /// Remove the node at `path` from its parent's file and delete its
    /// materialized directory.
    pub fn remove_node(&self, path: &str) -> Result<NodeDefinition> {
        let state_path = self.state_path();
        let mut session = SessionState::load(&state_path)?;
        let target = normalize_tree_path(session.current(), path);
        let (parent_path, name) = split_parent(&target).ok_or_else(|| Error::InvalidOperation {
            message: "the workspace root cannot be removed".to_string(),
        })?;

        let walk = self.walk(&parent_path, Materialize::Never)?;
        let not_found = || Error::NodeNotFound {
            path: target.clone(),
            parent: parent_path.clone(),
            segment: name.clone(),
        };
        let level = walk.children.ok_or_else(not_found)?;
        if level.tree.find_node(&name).is_none() {
            return Err(not_found());
        }

        let mut removed = None;
        edit_level_file(&level.config_file, |tree| {
            removed = tree.remove_node(&name);
            Ok(())
        })?;
        let removed = removed.ok_or_else(not_found)?;

        remove_materialized(&level.node_dir(&name))?;

        session.forget_subtree(&target);
        let current = session.current().to_string();
        if current == target || current.starts_with(&format!("{}/", target)) {
            session.set_current(parent_path);
        }
        session.save(&state_path)?;
        info!("Removed {}", target);
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// Clone what the fetch policy asks for below `start`.
    ///
    /// `start` itself is materialized first. Its direct children follow:
    /// eager repositories always, lazy ones only with `include_lazy`. With
    /// `recursive`, the same is applied to every delegated level and every
    /// cloned repository hosting a config.
    pub fn clone_lazy_repos(
        &self,
        start: &str,
        recursive: bool,
        include_lazy: bool,
    ) -> Result<BulkReport> {
        let loader = ConfigLoader::new(&self.defaults);
        let walk = self.walk(start, Materialize::OnPath)?;
        let pool = self.thread_pool()?;
        let mut report = BulkReport::new("clone");

        let mut current_level: Vec<(String, Level)> = walk
            .children
            .map(|level| vec![(walk.node.path.clone(), level)])
            .unwrap_or_default();

        while !current_level.is_empty() {
            let mut jobs = Vec::new();
            let mut expand = Vec::new();

            for (index, (owner, level)) in current_level.iter().enumerate() {
                let mut seen = HashSet::new();
                for def in &level.tree.nodes {
                    let node_path = join_tree_path(owner, &def.name);
                    if !seen.insert(def.name.as_str()) {
                        debug!("skipping duplicate node {}", node_path);
                        continue;
                    }
                    let missing = repo_state(&level.node_dir(&def.name)) == RepoState::Missing;
                    if !def.is_config() && missing {
                        if level.classifier.effective_lazy(def) && !include_lazy {
                            report.skipped.push(node_path);
                            continue;
                        }
                        match self.clone_job(level, def) {
                            Ok(job) => jobs.push((node_path.clone(), job)),
                            Err(e) => {
                                report.record(node_path, Err(e));
                                continue;
                            }
                        }
                    }
                    expand.push((index, def, node_path));
                }
            }

            debug!("cloning {} repositories at this level", jobs.len());
            self.run_jobs(&pool, &jobs, &mut report, |job| self.run_clone(job));

            if !recursive {
                break;
            }

            let mut next_level = Vec::new();
            for (index, def, node_path) in expand {
                let level = &current_level[index].1;
                let dir = level.node_dir(&def.name);
                let loaded = if def.is_config() {
                    loader.load_delegated(level, def, &node_path, &dir).map(Some)
                } else if repo_state(&dir) == RepoState::Cloned {
                    loader.load_hosted(level, &node_path, &dir)
                } else {
                    Ok(None)
                };
                match loaded {
                    Ok(Some(child)) => next_level.push((node_path, child)),
                    Ok(None) => {}
                    Err(e) => report.record(node_path, Err(e)),
                }
            }
            current_level = next_level;
        }

        info!(
            "clone: {} cloned, {} left lazy, {} failed",
            report.succeeded.len(),
            report.skipped.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Pull every cloned repository at or below `path`.
    pub fn pull(&self, path: &str, recursive: bool) -> Result<BulkReport> {
        let mut report = BulkReport::new("pull");
        let jobs: Vec<(String, (PathBuf, PullOptions))> = self
            .cloned_targets(path, recursive, &mut report)?
            .into_iter()
            .map(|t| {
                let node = t.definition.as_ref();
                let options = PullOptions {
                    remote: Some(t.resolver.default_remote(node)),
                    timeout: Some(t.resolver.clone_timeout(node)),
                };
                (t.path, (t.dir, options))
            })
            .collect();
        let pool = self.thread_pool()?;
        self.run_jobs(&pool, &jobs, &mut report, |(dir, options)| {
            self.git.pull(dir, options)
        });
        Ok(report)
    }

    /// Push every cloned repository at or below `path`.
    pub fn push(&self, path: &str, recursive: bool) -> Result<BulkReport> {
        let mut report = BulkReport::new("push");
        let jobs: Vec<(String, (PathBuf, String))> = self
            .cloned_targets(path, recursive, &mut report)?
            .into_iter()
            .map(|t| {
                let remote = t.resolver.default_remote(t.definition.as_ref());
                (t.path, (t.dir, remote))
            })
            .collect();
        let pool = self.thread_pool()?;
        self.run_jobs(&pool, &jobs, &mut report, |(dir, remote)| {
            self.git.push(dir, remote)
        });
        Ok(report)
    }

    /// Commit local changes in every modified repository at or below `path`.
    pub fn commit(&self, path: &str, recursive: bool, message: &str) -> Result<BulkReport> {
        let mut report = BulkReport::new("commit");
        let mut jobs = Vec::new();
        for target in self.cloned_targets(path, recursive, &mut report)? {
            match is_dirty(&target.dir, self.git.as_ref()) {
                Ok(true) => jobs.push((target.path, target.dir)),
                Ok(false) => report.skipped.push(target.path),
                Err(e) => report.record(target.path, Err(e)),
            }
        }
        let pool = self.thread_pool()?;
        self.run_jobs(&pool, &jobs, &mut report, |dir| self.git.commit(dir, message));
        Ok(report)
    }

    /// Live status of every repository at or below `path`.
    ///
    /// Read-only; repositories that are not cloned are reported as missing.
    /// Levels whose configuration failed to load are returned as failures in
    /// the report alongside the rows that could be read.
    pub fn status(&self, path: &str, recursive: bool) -> Result<(Vec<NodeStatus>, BulkReport)> {
        let mut report = BulkReport::new("status");
        let targets = self.repo_targets(path, recursive, &mut report)?;
        let rows = targets
            .into_iter()
            .map(|t| {
                let state = live_state(&t.dir, self.git.as_ref()).unwrap_or_else(|e| {
                    warn!("Could not read status of {}: {}", t.path, e);
                    t.state()
                });
                let branch = match state {
                    RepoState::Missing => None,
                    _ => self.git.current_branch(&t.dir).ok(),
                };
                NodeStatus {
                    path: t.path,
                    node_type: t.node_type,
                    state,
                    branch,
                }
            })
            .collect();
        Ok((rows, report))
    }

    fn cloned_targets(
        &self,
        path: &str,
        recursive: bool,
        report: &mut BulkReport,
    ) -> Result<Vec<RepoTarget>> {
        let mut targets = self.repo_targets(path, recursive, report)?;
        targets.retain(|t| {
            let cloned = t.state() != RepoState::Missing;
            if !cloned {
                report.skipped.push(t.path.clone());
            }
            cloned
        });
        Ok(targets)
    }

    /// Every repository node at or below `path`, without cloning.
    ///
    /// Levels that fail to load are recorded in `report` and skipped.
    fn repo_targets(
        &self,
        path: &str,
        recursive: bool,
        report: &mut BulkReport,
    ) -> Result<Vec<RepoTarget>> {
        let loader = self.read_only_loader();
        let walk = self.walk(path, Materialize::Never)?;
        let mut targets = Vec::new();

        match (&walk.definition, &walk.parent, &walk.children) {
            (None, _, Some(root)) if walk.node.url.is_some() => targets.push(RepoTarget {
                path: walk.node.path.clone(),
                dir: walk.node.fs_path.clone(),
                node_type: NodeType::Root,
                definition: None,
                resolver: root.resolver.clone(),
            }),
            (Some(def), Some(parent), _) if !def.is_config() => targets.push(RepoTarget {
                path: walk.node.path.clone(),
                dir: walk.node.fs_path.clone(),
                node_type: NodeType::Repo,
                definition: Some(def.clone()),
                resolver: parent.resolver.clone(),
            }),
            _ => {}
        }

        let mut current_level: Vec<(String, Level)> = walk
            .children
            .map(|level| vec![(walk.node.path.clone(), level)])
            .unwrap_or_default();

        while !current_level.is_empty() {
            let mut next_level = Vec::new();
            for (owner, level) in &current_level {
                for def in &level.tree.nodes {
                    let node_path = join_tree_path(owner, &def.name);
                    let dir = level.node_dir(&def.name);
                    if !def.is_config() {
                        targets.push(RepoTarget {
                            path: node_path.clone(),
                            dir: dir.clone(),
                            node_type: NodeType::Repo,
                            definition: Some(def.clone()),
                            resolver: level.resolver.clone(),
                        });
                    }
                    if !recursive {
                        continue;
                    }
                    let loaded = if def.is_config() {
                        loader.load_delegated(level, def, &node_path, &dir).map(Some)
                    } else if repo_state(&dir) == RepoState::Cloned {
                        loader.load_hosted(level, &node_path, &dir)
                    } else {
                        Ok(None)
                    };
                    match loaded {
                        Ok(Some(child)) => next_level.push((node_path, child)),
                        Ok(None) => {}
                        Err(e) => report.record(node_path, Err(e)),
                    }
                }
            }
            current_level = next_level;
        }

        Ok(targets)
    }

    fn thread_pool(&self) -> Result<ThreadPool> {
        let threads = self.resolver()?.max_parallel();
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::InvalidOperation {
                message: format!("failed to start worker pool: {}", e),
            })
    }

    /// Run one level of independent jobs on `pool`, recording each outcome.
    fn run_jobs<J, F>(
        &self,
        pool: &ThreadPool,
        jobs: &[(String, J)],
        report: &mut BulkReport,
        op: F,
    ) where
        J: Sync,
        F: Fn(&J) -> Result<()> + Sync + Send,
    {
        if jobs.is_empty() {
            return;
        }
        let results: Vec<(&str, Result<()>)> = pool.install(|| {
            jobs.par_iter()
                .map(|(path, job)| (path.as_str(), op(job)))
                .collect()
        });
        for (path, result) in results {
            report.record(path.to_string(), result);
        }
    }

    fn clone_job(&self, level: &Level, def: &NodeDefinition) -> Result<CloneJob> {
        let url = def.url().ok_or_else(|| Error::InvalidOperation {
            message: format!("node '{}' has no url to clone", def.name),
        })?;
        let url = if level.tree.ssh_preference(&self.defaults) {
            to_ssh_url(url).unwrap_or_else(|| url.to_string())
        } else {
            url.to_string()
        };
        Ok(CloneJob {
            url,
            dest: level.node_dir(&def.name),
            options: CloneOptions {
                branch: level.resolver.explicit_branch(def),
                depth: level.resolver.shallow_depth(Some(def)),
                timeout: Some(level.resolver.clone_timeout(Some(def))),
            },
        })
    }

    fn run_clone(&self, job: &CloneJob) -> Result<()> {
        debug!("cloning {} into {}", job.url, job.dest.display());
        self.git.clone_repo(&job.url, &job.dest, &job.options)
    }
}

fn child_names(level: &Level) -> Vec<String> {
    level.tree.nodes.iter().map(|n| n.name.clone()).collect()
}

/// Apply `edit` to the raw file at `path` and write it back.
///
/// The file is re-read without embedded defaults so that saving does not
/// bake them into it.
fn edit_level_file<F>(path: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&mut ConfigTree) -> Result<()>,
{
    let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut tree = ConfigTree::parse(&content, path)?;
    edit(&mut tree)?;
    tree.validate()?;
    tree.save(path)
}

/// Delete a node's directory. Absence is not an error.
fn remove_materialized(dir: &Path) -> Result<()> {
    let meta = match dir.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(dir, e)),
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(dir)
    } else {
        fs::remove_file(dir)
    };
    result.map_err(|e| Error::io(dir, e))?;
    debug!("deleted {}", dir.display());
    Ok(())
}
