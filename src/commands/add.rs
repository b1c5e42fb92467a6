//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which declares a new
//! repository under a node and writes it to the configuration file that owns
//! that node's children.
//!
//! ## Functionality
//!
//! - **Name Detection**: The node name defaults to the repository name in the url
//! - **Fetch Policy**: `--lazy` defers the clone; otherwise it happens right away
//! - **Parent Selection**: `--parent` picks the node to add under, relative to
//!   the current position

use anyhow::Result;
use clap::Args;

use muno::output::{emoji, state_label};
use muno::path::repo_name_from_url;

use super::{explain, spinner, target_path, Context};

/// Add a repository under a node
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Git url of the repository
    #[arg(value_name = "URL")]
    pub url: String,

    /// Node name. Defaults to the repository name in the url.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Node to add under. Defaults to the current position.
    #[arg(long, value_name = "PATH")]
    pub parent: Option<String>,

    /// Do not clone until the node is first used
    #[arg(long)]
    pub lazy: bool,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let parent = target_path(&nav, args.parent.as_deref())?;
    let name = args
        .name
        .unwrap_or_else(|| repo_name_from_url(&args.url));

    let bar = spinner(&out, format!("Adding {}", name));
    let result = nav.add_repo(&parent, &name, &args.url, args.lazy);
    bar.finish_and_clear();
    let node = result.map_err(|e| explain(&nav, e))?;

    println!(
        "{} Added {} ({}, {})",
        emoji(&out, "✅", "[OK]"),
        node.path,
        if node.lazy { "lazy" } else { "eager" },
        state_label(&out, &nav.defaults().display, node.state)
    );
    Ok(())
}
