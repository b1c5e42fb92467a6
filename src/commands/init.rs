//! # Init Command Implementation
//!
//! This module implements the `init` subcommand, which creates a new
//! `muno.yaml` describing an empty workspace.
//!
//! ## Functionality
//!
//! - **Workspace Name**: Taken from the argument, or from the directory name
//! - **Root Repository**: Records the url of the repository the workspace
//!   directory itself lives in (`--root-repo`)
//! - **Force Mode**: Overwrites an existing configuration file when specified

use anyhow::Result;
use clap::Args;
use std::fs;

use muno::config::ConfigTree;
use muno::defaults::{EmbeddedDefaults, DEFAULT_CONFIG_FILENAME};
use muno::loader::auto_discover_config;
use muno::output::emoji;

use super::Context;

/// Create a new muno.yaml workspace configuration
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Workspace name. Defaults to the directory name.
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Url of the git repository the workspace directory itself lives in
    #[arg(long, value_name = "URL")]
    pub root_repo: Option<String>,

    /// Directory, relative to the workspace, where repositories are cloned
    #[arg(long, value_name = "DIR")]
    pub repos_dir: Option<String>,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let defaults = EmbeddedDefaults::builtin()?;
    let dir = ctx.start_dir()?;
    fs::create_dir_all(&dir)?;

    if let Some(existing) = auto_discover_config(&dir, &defaults) {
        if !args.force {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' already exists. Use --force to overwrite.",
                existing.display()
            ));
        }
    }

    let name = args
        .name
        .or_else(|| {
            dir.canonicalize()
                .ok()
                .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "workspace".to_string());

    let mut tree = ConfigTree::new(name, &defaults);
    tree.workspace.root_repo = args.root_repo;
    if let Some(repos_dir) = args.repos_dir {
        tree.workspace.repos_dir = repos_dir;
    }
    tree.validate()?;

    let path = dir.join(DEFAULT_CONFIG_FILENAME);
    tree.save(&path)?;

    println!(
        "{} Created {} for workspace '{}'",
        emoji(&out, "✅", "[OK]"),
        path.display(),
        tree.workspace.name
    );
    println!(
        "{} Run `muno add <url>` to add repositories",
        emoji(&out, "💡", "[HINT]")
    );
    Ok(())
}
