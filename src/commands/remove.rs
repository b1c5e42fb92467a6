//! # Remove Command Implementation
//!
//! This module implements the `remove` subcommand, which deletes a node from
//! its parent's configuration file and removes its working tree.
//!
//! Removing a repository deletes its directory, local changes included, so the
//! command asks for confirmation unless `--yes` is given or
//! `behavior.interactive` is false.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde_yaml::Value;

use muno::output::emoji;

use super::{explain, target_path, Context};

/// Remove a node and its working tree
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Tree path of the node to remove
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let target = target_path(&nav, Some(&args.path))?;
    let node = nav.inspect(&target).map_err(|e| explain(&nav, e))?;

    let interactive = !matches!(
        nav.resolver()?.get_value("behavior.interactive", None),
        Some(Value::Bool(false))
    ) && console::Term::stdout().is_term();

    if !args.yes && interactive {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Remove {} and delete {}?",
                node.path,
                node.fs_path.display()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    nav.remove_node(&target).map_err(|e| explain(&nav, e))?;
    println!("{} Removed {}", emoji(&out, "🗑️", "[DEL]"), node.path);
    Ok(())
}
