//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `muno`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   [`Context`] and performs the command's logic.
//!
//! Commands that work on an existing workspace open it through
//! [`Context::navigator`], which applies the global `--workspace` and
//! `--config` flags.

pub mod add;
pub mod clone;
pub mod commit;
pub mod completions;
pub mod config;
pub mod current;
pub mod init;
pub mod list;
pub mod pull;
pub mod push;
pub mod remove;
pub mod status;
pub mod tree;
pub mod use_node;
pub mod validate;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use muno::defaults::EmbeddedDefaults;
use muno::error::Error;
use muno::git::DefaultGitOperations;
use muno::navigator::{BulkReport, Navigator};
use muno::output::{emoji, OutputConfig};
use muno::resolver::parse_config_overrides;
use muno::suggestions;

/// Global flags shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub color: String,
    pub workspace: Option<PathBuf>,
    pub overrides: Vec<String>,
}

impl Context {
    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    /// Directory the workspace search starts from.
    pub fn start_dir(&self) -> Result<PathBuf> {
        match &self.workspace {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Open the workspace containing the start directory.
    pub fn navigator(&self) -> Result<Navigator> {
        let defaults = EmbeddedDefaults::builtin()?;
        let overrides = parse_config_overrides(&self.overrides).map_err(|e| match e {
            Error::InvalidOverride { entry, .. } => suggestions::invalid_override(&entry),
            other => other.into(),
        })?;
        let start = self.start_dir()?;
        let navigator = Navigator::discover(&start, defaults, Box::new(DefaultGitOperations))
            .map_err(|e| match e {
                Error::WorkspaceNotFound { start } => suggestions::workspace_not_found(&start),
                other => other.into(),
            })?;
        Ok(navigator.with_cli_overrides(overrides))
    }
}

/// Absolute tree path for an optional user argument, relative to the current
/// position.
pub fn target_path(nav: &Navigator, path: Option<&str>) -> Result<String> {
    Ok(nav.absolute_path(path.unwrap_or("."))?)
}

/// Attach hints to library errors where muno knows how to help.
pub fn explain(nav: &Navigator, err: Error) -> anyhow::Error {
    match err {
        Error::NodeNotFound {
            path,
            parent,
            segment,
        } => {
            let siblings: Vec<String> = nav
                .list_children(&parent)
                .map(|children| children.into_iter().map(|c| c.name).collect())
                .unwrap_or_default();
            suggestions::node_not_found(&path, &segment, &siblings)
        }
        Error::CircularReference { chain } => suggestions::circular_reference(&chain),
        other => other.into(),
    }
}

/// Spinner shown while a bulk operation runs.
pub fn spinner(out: &OutputConfig, message: impl Into<String>) -> ProgressBar {
    if !out.use_color {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Print a bulk report and fail when any node failed.
pub fn finish_bulk(out: &OutputConfig, report: BulkReport, verb: &str) -> Result<()> {
    for path in &report.succeeded {
        println!("{} {} {}", emoji(out, "✅", "[OK]"), verb, path);
    }
    for (path, e) in &report.failures {
        println!("{} {}: {}", emoji(out, "❌", "[ERR]"), path, e);
    }
    println!(
        "{} {} succeeded, {} skipped, {} failed",
        emoji(out, "📊", "[INFO]"),
        report.succeeded.len(),
        report.skipped.len(),
        report.failures.len()
    );
    report.into_result()?;
    Ok(())
}
