//! # List Command Implementation
//!
//! This module implements the `list` subcommand, which shows the declared
//! children of a node together with their fetch policy and live state.
//!
//! This command is a safe, read-only operation: nothing is cloned. A
//! repository that has not been cloned yet lists no children.

use anyhow::Result;
use clap::Args;

use muno::output::{node_marker, state_label};
use muno::tree::NodeType;

use super::{explain, target_path, Context};

/// List the children of a node
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Tree path to list. Defaults to the current position.
    #[arg(value_name = "PATH")]
    pub path: Option<String>,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let glyphs = &nav.defaults().display;
    let target = target_path(&nav, args.path.as_deref())?;
    let children = nav
        .list_children(&target)
        .map_err(|e| explain(&nav, e))?;

    println!("{}", target);
    if children.is_empty() {
        println!("  (no children)");
        return Ok(());
    }

    for child in &children {
        let policy = match (child.node_type, child.lazy) {
            (NodeType::Config, _) => "-",
            (_, true) => "lazy",
            (_, false) => "eager",
        };
        println!(
            "  {} {:<32} {:<6} {}",
            node_marker(&out, glyphs, child.node_type),
            child.name,
            policy,
            state_label(&out, glyphs, child.state)
        );
    }
    Ok(())
}
