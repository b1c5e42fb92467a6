//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a fake git backend, workspace fixtures, and config
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::SIMPLE);
//!     let (nav, git) = fixture.navigator();
//!     // ... test code
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_fs::prelude::*;
use muno::defaults::EmbeddedDefaults;
use muno::error::{Error, Result};
use muno::git::{CloneOptions, GitOperations, PullOptions};
use muno::navigator::Navigator;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::FakeGit;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// Workspace with one auto (lazy) repo and one pattern-eager repo.
    pub const SIMPLE: &str = r#"
workspace:
  name: demo
nodes:
  - name: api
    url: https://example.com/acme/api.git
  - name: platform-monorepo
    url: https://example.com/acme/platform-monorepo.git
"#;

    /// Workspace whose only child delegates to a file outside the workspace.
    pub const DELEGATING: &str = r#"
workspace:
  name: demo
nodes:
  - name: team
    config: ../team/muno.yaml
"#;

    /// The file `DELEGATING` points at.
    pub const TEAM: &str = r#"
workspace:
  name: team
nodes:
  - name: repo1
    url: https://example.com/team/repo1.git
    fetch: eager
  - name: repo2
    url: https://example.com/team/repo2.git
    fetch: lazy
"#;

    /// Workspace with config overrides.
    pub const WITH_OVERRIDES: &str = r#"
workspace:
  name: demo
overrides:
  git:
    clone_timeout: 120
nodes:
  - name: api
    url: https://example.com/acme/api.git
    overrides:
      git:
        default_branch: develop
"#;

    /// Missing the required workspace name.
    pub const NAMELESS: &str = r#"
workspace:
  repos_dir: repos
nodes: []
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "workspace: [unclosed";
}

/// Fake git backend.
///
/// Clones create an empty `.git` directory, every call is recorded, and
/// individual urls can be made to fail.
#[derive(Clone, Default)]
pub struct FakeGit {
    clones: Arc<Mutex<Vec<(String, PathBuf, CloneOptions)>>>,
    pulls: Arc<Mutex<Vec<PathBuf>>>,
    commits: Arc<Mutex<Vec<(PathBuf, String)>>>,
    failing: Arc<Mutex<Vec<String>>>,
    dirty: Arc<Mutex<Vec<PathBuf>>>,
}

#[allow(dead_code)]
impl FakeGit {
    /// Make every clone of `url` fail.
    pub fn fail_on(&self, url: &str) {
        self.failing.lock().unwrap().push(url.to_string());
    }

    /// Report local changes for the repository at `path`.
    pub fn mark_dirty(&self, path: &Path) {
        self.dirty.lock().unwrap().push(path.to_path_buf());
    }

    /// Urls cloned so far, sorted.
    pub fn cloned_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .clones
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _, _)| url.clone())
            .collect();
        urls.sort();
        urls
    }

    pub fn clone_count(&self) -> usize {
        self.clones.lock().unwrap().len()
    }

    pub fn pulled(&self) -> Vec<PathBuf> {
        self.pulls.lock().unwrap().clone()
    }

    pub fn commits(&self) -> Vec<(PathBuf, String)> {
        self.commits.lock().unwrap().clone()
    }
}

impl GitOperations for FakeGit {
    fn clone_repo(&self, url: &str, dest: &Path, opts: &CloneOptions) -> Result<()> {
        self.clones
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf(), opts.clone()));
        if self.failing.lock().unwrap().iter().any(|u| u == url) {
            return Err(Error::GitClone {
                url: url.to_string(),
                dest: dest.to_path_buf(),
                message: "repository not found".to_string(),
            });
        }
        fs::create_dir_all(dest.join(".git")).map_err(|e| Error::io(dest, e))
    }

    fn pull(&self, path: &Path, _opts: &PullOptions) -> Result<()> {
        self.pulls.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn push(&self, _path: &Path, _remote: &str) -> Result<()> {
        Ok(())
    }

    fn commit(&self, path: &Path, message: &str) -> Result<()> {
        self.commits
            .lock()
            .unwrap()
            .push((path.to_path_buf(), message.to_string()));
        Ok(())
    }

    fn status(&self, path: &Path) -> Result<String> {
        if self.dirty.lock().unwrap().iter().any(|p| p == path) {
            Ok(" M README.md\n".to_string())
        } else {
            Ok(String::new())
        }
    }

    fn current_branch(&self, _path: &Path) -> Result<String> {
        Ok("main".to_string())
    }
}

/// A test fixture that provides a temporary directory holding a workspace.
///
/// The workspace file lives at `ws/muno.yaml` so that tests can place
/// delegated files beside the workspace as well as inside it.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config(configs::DELEGATING)
///     .with_file("team/muno.yaml", configs::TEAM);
///
/// fixture.command().arg("list").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("ws")
            .create_dir_all()
            .expect("Failed to create workspace directory");
        Self { temp_dir }
    }

    /// Write the workspace configuration file.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("ws/muno.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file relative to the temp directory root (not the workspace).
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Pretend the repository at `path` (relative to the workspace) is cloned.
    pub fn with_clone(self, path: &str) -> Self {
        self.temp_dir
            .child("ws")
            .child(path)
            .child(".git")
            .create_dir_all()
            .expect("Failed to create clone");
        self
    }

    /// The workspace root directory.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("ws")
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("muno.yaml")
    }

    /// Create a child path relative to the workspace.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child("ws").child(path)
    }

    /// Open the workspace with a fresh fake git.
    pub fn navigator(&self) -> (Navigator, FakeGit) {
        let git = FakeGit::default();
        let nav = Navigator::new(
            self.config_path(),
            EmbeddedDefaults::builtin().expect("Failed to load defaults"),
            Box::new(git.clone()),
        )
        .expect("Failed to open workspace");
        (nav, git)
    }

    /// Create a command configured to run in this fixture's workspace.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("muno");
        cmd.current_dir(self.path())
            .env_remove("MUNO_WORKSPACE")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
