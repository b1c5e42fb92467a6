//! # Current Command Implementation
//!
//! Prints the current position and where it lives on disk.

use anyhow::Result;
use clap::Args;
use log::warn;

use super::Context;

/// Print the current position
#[derive(Args, Debug)]
pub struct CurrentArgs {
    /// Print the directory of the current node instead of its tree path
    #[arg(long)]
    pub dir: bool,
}

/// Execute the `current` command.
pub fn execute(args: CurrentArgs, ctx: &Context) -> Result<()> {
    let nav = ctx.navigator()?;
    let position = nav.current_position()?;

    if !args.dir {
        println!("{}", position);
        return Ok(());
    }

    match nav.inspect(&position) {
        Ok(node) => println!("{}", node.fs_path.display()),
        Err(e) => {
            warn!("Recorded position {} no longer resolves: {}", position, e);
            println!("{}", nav.root_dir().display());
        }
    }
    Ok(())
}
