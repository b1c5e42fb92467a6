//! # Use Command Implementation
//!
//! This module implements the `use` subcommand, which moves the current
//! position to a node. Every repository the path crosses is cloned if it is
//! missing, including the target itself.

use anyhow::Result;
use clap::Args;

use muno::output::{emoji, state_label};

use super::{explain, spinner, Context};

/// Move to a node, cloning whatever the path needs
#[derive(Args, Debug)]
pub struct UseArgs {
    /// Absolute tree path, or a path relative to the current position
    /// (`..`, `team/service`)
    #[arg(value_name = "PATH")]
    pub path: String,
}

/// Execute the `use` command.
pub fn execute(args: UseArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;

    let bar = spinner(&out, format!("Resolving {}", args.path));
    let result = nav.use_node(&args.path);
    bar.finish_and_clear();
    let node = result.map_err(|e| explain(&nav, e))?;

    println!(
        "{} Now at {} ({})",
        emoji(&out, "📍", "[AT]"),
        node.path,
        state_label(&out, &nav.defaults().display, node.state)
    );
    println!("   {}", node.fs_path.display());
    Ok(())
}
