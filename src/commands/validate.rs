//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks the
//! workspace configuration without cloning anything.
//!
//! ## Functionality
//!
//! - **Structure**: Every reachable configuration file is parsed and validated
//!   (workspace name, node names, url/config exclusivity)
//! - **Delegation**: Referenced files must exist and must not delegate in a
//!   circle
//! - **Duplicate Names**: Reported as warnings; only the first of several
//!   siblings with the same name is reachable
//! - **Single File**: `--file` validates one file on its own
//!
//! Configurations hosted inside repositories that are not cloned yet cannot be
//! seen and are not checked.

use anyhow::Result;
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;

use muno::config::ConfigTree;
use muno::defaults::EmbeddedDefaults;
use muno::output::{emoji, OutputConfig};
use muno::tree::{NodeType, TreeView};

use super::{explain, Context};

/// Validate the workspace configuration files
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Validate a single configuration file instead of the whole workspace
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    repos: usize,
    configs: usize,
    lazy: usize,
    cloned: usize,
    duplicates: Vec<String>,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();

    if let Some(file) = args.file {
        return validate_file(&out, &file);
    }

    let nav = ctx.navigator()?;
    println!(
        "{} Validating workspace: {}",
        emoji(&out, "🔍", "[SCAN]"),
        nav.config_file().display()
    );

    let view = match nav.tree("/", None) {
        Ok(view) => view,
        Err(e) => {
            println!("{} {}", emoji(&out, "❌", "[ERR]"), e);
            return Err(explain(&nav, e));
        }
    };

    let mut summary = Summary::default();
    summarize(&view, &mut summary);

    println!("\n{} Workspace Summary:", emoji(&out, "📊", "[INFO]"));
    println!("   Repositories: {}", summary.repos);
    println!("   Delegated configs: {}", summary.configs);
    println!("   Lazy repositories: {}", summary.lazy);
    println!("   Cloned repositories: {}", summary.cloned);

    for duplicate in &summary.duplicates {
        println!(
            "{} Duplicate node name {} (only the first is reachable)",
            emoji(&out, "⚠️", "[WARN]"),
            duplicate
        );
    }

    println!("\n{} Configuration is valid", emoji(&out, "✅", "[OK]"));
    Ok(())
}

fn validate_file(out: &OutputConfig, file: &std::path::Path) -> Result<()> {
    println!(
        "{} Validating configuration: {}",
        emoji(out, "🔍", "[SCAN]"),
        file.display()
    );
    let defaults = EmbeddedDefaults::builtin()?;
    match ConfigTree::load(file, &defaults) {
        Ok(tree) => {
            println!(
                "{} Configuration is valid ({} nodes)",
                emoji(out, "✅", "[OK]"),
                tree.nodes.len()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", emoji(out, "❌", "[ERR]"), e);
            Err(e.into())
        }
    }
}

fn summarize(view: &TreeView, summary: &mut Summary) {
    let mut seen = BTreeSet::new();
    for name in &view.node.children {
        if !seen.insert(name.as_str()) {
            summary.duplicates.push(muno::path::join_tree_path(&view.node.path, name));
        }
    }

    for child in &view.children {
        match child.node.node_type {
            NodeType::Repo => {
                summary.repos += 1;
                if child.node.lazy {
                    summary.lazy += 1;
                }
                if child.node.state != muno::state::RepoState::Missing {
                    summary.cloned += 1;
                }
            }
            NodeType::Config => summary.configs += 1,
            NodeType::Root => {}
        }
        summarize(child, summary);
    }
}
