//! # Clone Command Implementation
//!
//! This module implements the `clone` subcommand, which materializes
//! repositories according to their fetch policy.
//!
//! ## Functionality
//!
//! - **Default Policy**: Clones eager repositories (meta-repositories and
//!   nodes marked `fetch: eager`) and leaves lazy ones for later
//! - **Lazy Repositories**: `--include-lazy` clones those too
//! - **Recursion**: `--recursive` descends through delegated configurations
//!   and repositories that host their own `muno.yaml`
//!
//! Failures are reported per repository; one failing clone does not stop the
//! others.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_bulk, spinner, target_path, Context};

/// Clone repositories according to their fetch policy
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Tree path to start from. Defaults to the current position.
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Descend into every level below the path
    #[arg(short, long)]
    pub recursive: bool,

    /// Clone lazy repositories as well
    #[arg(long)]
    pub include_lazy: bool,
}

/// Execute the `clone` command.
pub fn execute(args: CloneArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let target = target_path(&nav, args.path.as_deref())?;

    let bar = spinner(&out, format!("Cloning under {}", target));
    let result = nav.clone_lazy_repos(&target, args.recursive, args.include_lazy);
    bar.finish_and_clear();
    let report = result.map_err(|e| explain(&nav, e))?;

    finish_bulk(&out, report, "cloned")
}
