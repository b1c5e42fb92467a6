//! Runtime tree nodes
//!
//! A [`TreeNode`] is the navigator's answer to "what is at this path right
//! now". It is built from a [`NodeDefinition`](crate::config::NodeDefinition)
//! plus a look at the filesystem, handed to the caller, and dropped. Nothing
//! here is ever persisted.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::state::RepoState;

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The workspace root.
    Root,
    /// A git repository.
    Repo,
    /// A delegation to another configuration file.
    Config,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeType::Root => "root",
            NodeType::Repo => "repo",
            NodeType::Config => "config",
        };
        f.write_str(s)
    }
}

/// A node as seen at the time of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    /// Absolute tree path, e.g. `/team/service`.
    pub path: String,
    pub node_type: NodeType,
    pub url: Option<String>,
    pub lazy: bool,
    pub state: RepoState,
    /// Names of the declared children, when they are known without cloning.
    pub children: Vec<String>,
    /// Directory where the node is (or would be) materialized.
    pub fs_path: PathBuf,
}

impl TreeNode {
    /// True only for a lazy repository that is not on disk.
    pub fn needs_clone(&self) -> bool {
        self.node_type == NodeType::Repo && self.lazy && self.state == RepoState::Missing
    }

    pub fn is_root(&self) -> bool {
        self.node_type == NodeType::Root
    }
}

/// One row of a children listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildInfo {
    pub name: String,
    pub node_type: NodeType,
    pub lazy: bool,
    pub state: RepoState,
}

/// A node with its resolved subtree, for tree views.
#[derive(Debug, Clone, Serialize)]
pub struct TreeView {
    pub node: TreeNode,
    pub children: Vec<TreeView>,
}

/// Live status of a cloned or missing repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub path: String,
    pub node_type: NodeType,
    pub state: RepoState,
    pub branch: Option<String>,
}
