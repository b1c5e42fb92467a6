//! # Commit Command Implementation
//!
//! Commits tracked changes in every modified repository at or below a node,
//! using the same message everywhere. Clean repositories are skipped.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_bulk, spinner, target_path, Context};

/// Commit local changes in modified repositories
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Commit message
    #[arg(short, long, value_name = "MESSAGE")]
    pub message: String,

    /// Tree path to start from. Defaults to the current position.
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Include every level below the path
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the `commit` command.
pub fn execute(args: CommitArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let target = target_path(&nav, args.path.as_deref())?;

    let bar = spinner(&out, format!("Committing under {}", target));
    let result = nav.commit(&target, args.recursive, &args.message);
    bar.finish_and_clear();
    let report = result.map_err(|e| explain(&nav, e))?;

    finish_bulk(&out, report, "committed")
}
