//! # Status Command Implementation
//!
//! This module implements the `status` subcommand, which reports whether each
//! repository is cloned, has local changes, and which branch it is on.
//!
//! Read-only: nothing is cloned, and configurations hosted inside repositories
//! that are not cloned are not visited.

use anyhow::Result;
use clap::Args;

use muno::output::{emoji, state_label};

use super::{explain, target_path, Context};

/// Show the live state of repositories
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Tree path to report on. Defaults to the current position.
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Include every level below the path, not just direct children
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let glyphs = &nav.defaults().display;
    let target = target_path(&nav, args.path.as_deref())?;
    let (rows, report) = nav
        .status(&target, args.recursive)
        .map_err(|e| explain(&nav, e))?;

    if rows.is_empty() && report.is_success() {
        println!("No repositories under {}", target);
        return Ok(());
    }

    let width = rows.iter().map(|r| r.path.len()).max().unwrap_or(0);
    for row in &rows {
        println!(
            "{:<width$}  {:<12}  {}",
            row.path,
            state_label(&out, glyphs, row.state),
            row.branch.as_deref().unwrap_or("-"),
            width = width
        );
    }
    for (path, e) in &report.failures {
        println!("{} {}: {}", emoji(&out, "❌", "[ERR]"), path, e);
    }
    report.into_result()?;
    Ok(())
}
