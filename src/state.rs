//! Filesystem-derived repository state
//!
//! Whether a repository is present is never recorded anywhere; it is read off
//! the working tree every time it is asked for. A directory counts as a clone
//! when it has a `.git` entry, which may be a directory (plain clone) or a file
//! (worktrees and submodules).

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::git::GitOperations;

/// Presence of a repository on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoState {
    Missing,
    Cloned,
    /// Cloned with uncommitted changes. Only produced by [`live_state`].
    Modified,
}

impl fmt::Display for RepoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepoState::Missing => "missing",
            RepoState::Cloned => "cloned",
            RepoState::Modified => "modified",
        };
        f.write_str(s)
    }
}

/// `Cloned` when `path` holds a `.git` entry, `Missing` otherwise.
pub fn repo_state(path: &Path) -> RepoState {
    if path.join(".git").symlink_metadata().is_ok() {
        RepoState::Cloned
    } else {
        RepoState::Missing
    }
}

/// Whether a cloned repository has uncommitted changes.
pub fn is_dirty(path: &Path, git: &dyn GitOperations) -> Result<bool> {
    let porcelain = git.status(path)?;
    Ok(porcelain.lines().any(|line| !line.trim().is_empty()))
}

/// Presence plus dirtiness: `Modified` for a clone with local changes.
pub fn live_state(path: &Path, git: &dyn GitOperations) -> Result<RepoState> {
    match repo_state(path) {
        RepoState::Cloned if is_dirty(path, git)? => Ok(RepoState::Modified),
        state => Ok(state),
    }
}
