//! # Error Handling
//!
//! This module defines the centralized error type for `muno`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the library can report, each variant carrying enough context (file paths,
//! tree paths, urls) to diagnose the problem without a debugger.
//!
//! The variants fall into five groups:
//!
//! - **I/O**: unreadable or unwritable files and directories, always with the
//!   attempted path.
//! - **Parse**: malformed YAML configuration or JSON state files.
//! - **Validation**: structural problems found by `ConfigTree::validate`.
//! - **Resolution**: tree paths that do not resolve, missing delegated
//!   configuration files, circular delegation.
//! - **Operational**: failures reported by the git capability. Bulk operations
//!   collect these per repository and report them together through
//!   `Error::BulkOperation`.
//!
//! The `Result` alias is used throughout the library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for muno operations
#[derive(Error, Debug)]
pub enum Error {
    /// A file or directory could not be read, written, or created.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error without a known path, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    IoBare(#[from] std::io::Error),

    /// A configuration file exists but could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed as YAML.
    #[error("Error parsing config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// The session/position state file could not be parsed.
    #[error("Error parsing state {}: {message}", path.display())]
    StateParse { path: PathBuf, message: String },

    /// A configuration tree violates a structural rule.
    #[error("Invalid configuration: {message}")]
    Validation { message: String },

    /// A tree path segment does not name a declared node of `parent`.
    #[error("Node not found: '{segment}' in path {path}")]
    NodeNotFound {
        path: String,
        parent: String,
        segment: String,
    },

    /// A delegated configuration file referenced by a node does not exist.
    #[error("Config file not found for node {node_path}: {}", path.display())]
    ConfigNotFound { path: PathBuf, node_path: String },

    /// Loading the configuration delegated by a node failed.
    #[error("Failed to load config for node {node_path}: {source}")]
    ConfigLoad {
        node_path: String,
        #[source]
        source: Box<Error>,
    },

    /// A delegated configuration file references one of its ancestors.
    #[error("Circular configuration reference: {chain}")]
    CircularReference { chain: String },

    /// A `key.path=value` override could not be parsed.
    #[error("Invalid config override '{entry}': {message}")]
    InvalidOverride { entry: String, message: String },

    /// A structural operation that cannot be applied to the given target.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// No configuration file was found in a directory or any of its parents.
    #[error("No muno workspace found at or above {}", start.display())]
    WorkspaceNotFound { start: PathBuf },

    /// An error occurred while cloning a repository.
    #[error("Git clone error for {url} into {}: {message}", dest.display())]
    GitClone {
        url: String,
        dest: PathBuf,
        message: String,
    },

    /// An error occurred while executing a git command in a working tree.
    #[error("Git command failed in {}: {command} - {stderr}", path.display())]
    GitCommand {
        command: String,
        path: PathBuf,
        stderr: String,
    },

    /// A git subprocess ran longer than its configured timeout.
    #[error("Git command timed out after {timeout:?} in {}: {command}", path.display())]
    GitTimeout {
        command: String,
        path: PathBuf,
        timeout: Duration,
    },

    /// One or more repositories failed during a bulk operation.
    #[error("{operation} failed for {} node(s):\n{}", failures.len(), failures.join("\n"))]
    BulkOperation {
        operation: String,
        failures: Vec<String>,
    },

    /// An error occurred during serialization.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Build an `Error::Io` carrying the attempted path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
