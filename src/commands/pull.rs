//! # Pull Command Implementation
//!
//! Pulls every cloned repository at or below a node. Repositories that are
//! not cloned are skipped.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_bulk, spinner, target_path, Context};

/// Pull cloned repositories
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Tree path to start from. Defaults to the current position.
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Include every level below the path
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the `pull` command.
pub fn execute(args: PullArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let target = target_path(&nav, args.path.as_deref())?;

    let bar = spinner(&out, format!("Pulling under {}", target));
    let result = nav.pull(&target, args.recursive);
    bar.finish_and_clear();
    let report = result.map_err(|e| explain(&nav, e))?;

    finish_bulk(&out, report, "pulled")
}
