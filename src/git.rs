//! # Git Capability
//!
//! The navigator never runs git itself. It talks to a [`GitOperations`]
//! implementation, which keeps the tree logic testable: tests plug in a fake
//! that creates `.git` directories, the binary uses [`DefaultGitOperations`].
//!
//! `DefaultGitOperations` shells out to the system `git`, which automatically
//! handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig
//!
//! Every command can be bounded by a timeout. A command that runs past it is
//! killed and reported as [`Error::GitTimeout`].

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Options for a single clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Branch to check out; the remote HEAD when `None`.
    pub branch: Option<String>,
    /// Shallow clone depth; full history when `None`.
    pub depth: Option<u32>,
    pub timeout: Option<Duration>,
}

/// Options for a single pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub remote: Option<String>,
    pub timeout: Option<Duration>,
}

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clone `url` into `dest`. `dest` must not contain a repository yet.
    fn clone_repo(&self, url: &str, dest: &Path, opts: &CloneOptions) -> Result<()>;

    /// Fast-forward the working tree at `path`.
    fn pull(&self, path: &Path, opts: &PullOptions) -> Result<()>;

    /// Push the current branch at `path` to `remote`.
    fn push(&self, path: &Path, remote: &str) -> Result<()>;

    /// Commit all tracked changes at `path`.
    fn commit(&self, path: &Path, message: &str) -> Result<()>;

    /// Porcelain status text; empty for a clean tree.
    fn status(&self, path: &Path) -> Result<String>;

    /// Name of the checked-out branch.
    fn current_branch(&self, path: &Path) -> Result<String>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_repo(&self, url: &str, dest: &Path, opts: &CloneOptions) -> Result<()> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let mut args = vec!["clone".to_string()];
        if let Some(depth) = opts.depth {
            args.push(format!("--depth={}", depth));
        }
        if let Some(branch) = &opts.branch {
            args.push("--branch".to_string());
            args.push(branch.clone());
        }
        args.push(url.to_string());
        args.push(dest.to_string_lossy().into_owned());

        let existed = dest.exists();
        let result = run_git(parent, &args, opts.timeout);
        if result.is_err() {
            discard_partial_clone(dest, existed);
        }

        match result {
            Ok(_) => Ok(()),
            Err(Error::GitCommand { stderr, .. }) => Err(Error::GitClone {
                url: url.to_string(),
                dest: dest.to_path_buf(),
                message: clone_failure_message(&stderr),
            }),
            Err(Error::GitTimeout { timeout, .. }) => Err(Error::GitTimeout {
                command: format!("clone {}", url),
                path: dest.to_path_buf(),
                timeout,
            }),
            Err(e) => Err(e),
        }
    }

    fn pull(&self, path: &Path, opts: &PullOptions) -> Result<()> {
        let mut args = vec!["pull".to_string(), "--ff-only".to_string()];
        if let Some(remote) = &opts.remote {
            args.push(remote.clone());
        }
        run_git(path, &args, opts.timeout).map(|_| ())
    }

    fn push(&self, path: &Path, remote: &str) -> Result<()> {
        let args = ["push".to_string(), remote.to_string(), "HEAD".to_string()];
        run_git(path, &args, None).map(|_| ())
    }

    fn commit(&self, path: &Path, message: &str) -> Result<()> {
        let args = [
            "commit".to_string(),
            "-a".to_string(),
            "-m".to_string(),
            message.to_string(),
        ];
        run_git(path, &args, None).map(|_| ())
    }

    fn status(&self, path: &Path) -> Result<String> {
        run_git(path, &["status".to_string(), "--porcelain".to_string()], None)
    }

    fn current_branch(&self, path: &Path) -> Result<String> {
        let args = [
            "rev-parse".to_string(),
            "--abbrev-ref".to_string(),
            "HEAD".to_string(),
        ];
        run_git(path, &args, None).map(|out| out.trim().to_string())
    }
}

/// Remove whatever a failed clone left at `dest`, unless the directory was
/// there before the clone started. A killed git leaves a `.git` behind.
fn discard_partial_clone(dest: &Path, existed: bool) {
    if existed {
        return;
    }
    match fs::remove_dir_all(dest) {
        Ok(()) => debug!("Removed partial clone at {}", dest.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial clone at {}: {}", dest.display(), e),
    }
}

/// Provide helpful error message for common auth failures
fn clone_failure_message(stderr: &str) -> String {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            For private repos, ensure you have:\n\
            - SSH key added to ssh-agent\n\
            - Git credentials configured\n\
            - Personal access token set up\n\
            Error: {}",
            stderr
        )
    } else {
        stderr.to_string()
    }
}

/// Run `git <args>` in `dir`, returning stdout.
fn run_git(dir: &Path, args: &[String], timeout: Option<Duration>) -> Result<String> {
    let command = args.first().cloned().unwrap_or_default();
    debug!("git {} (in {})", args.join(" "), dir.display());

    let command_error = |stderr: String| Error::GitCommand {
        command: command.clone(),
        path: dir.to_path_buf(),
        stderr,
    };

    let mut child = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_error(e.to_string()))?;

    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let status = match wait_with_timeout(&mut child, timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            // Readers are left to finish on their own; a helper process may
            // still hold the pipes open.
            return Err(Error::GitTimeout {
                command: command.clone(),
                path: dir.to_path_buf(),
                timeout: timeout.unwrap_or_default(),
            });
        }
        Err(e) => return Err(command_error(e.to_string())),
    };

    let out = join_reader(stdout);
    let err = join_reader(stderr);

    if !status.success() {
        return Err(command_error(err.trim().to_string()));
    }
    Ok(out)
}

fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Wait for `child`, giving up after `timeout`. `Ok(None)` means it timed out.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
