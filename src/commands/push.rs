//! # Push Command Implementation
//!
//! Pushes the current branch of every cloned repository at or below a node to
//! its configured remote (`git.default_remote`).

use anyhow::Result;
use clap::Args;

use super::{explain, finish_bulk, spinner, target_path, Context};

/// Push cloned repositories
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Tree path to start from. Defaults to the current position.
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Include every level below the path
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the `push` command.
pub fn execute(args: PushArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let target = target_path(&nav, args.path.as_deref())?;

    let bar = spinner(&out, format!("Pushing under {}", target));
    let result = nav.push(&target, args.recursive);
    bar.finish_and_clear();
    let report = result.map_err(|e| explain(&nav, e))?;

    finish_bulk(&out, report, "pushed")
}
