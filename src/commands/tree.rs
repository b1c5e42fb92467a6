//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the workspace
//! tree in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Tree Visualization**: Stitches every reachable configuration level into
//!   one view
//! - **Depth Control**: Supports `--depth` flag to limit tree depth
//! - **Live State**: Marks each repository as cloned or missing
//!
//! This command is a safe, read-only operation: repositories that are not
//! cloned are shown as leaves.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use muno::defaults::DisplayGlyphs;
use muno::output::{node_marker, state_label, OutputConfig};
use muno::tree::{NodeType, TreeView};

use super::{explain, target_path, Context};

/// Display the workspace tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Tree path to start from. Defaults to the current position.
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the start node, 1 to show its children, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let nav = ctx.navigator()?;
    let target = target_path(&nav, args.path.as_deref())?;
    let view = nav
        .tree(&target, args.depth)
        .map_err(|e| explain(&nav, e))?;

    let display = build_display_node(&view, &out, &nav.defaults().display);
    print_tree(&display).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

fn build_display_node(view: &TreeView, out: &OutputConfig, glyphs: &DisplayGlyphs) -> DisplayNode {
    let node = &view.node;
    let name = if node.is_root() {
        format!("{} ({})", node.path, node.name)
    } else {
        node.name.clone()
    };
    let mut label = format!("{} {}", node_marker(out, glyphs, node.node_type), name);
    if node.node_type != NodeType::Config {
        if node.lazy {
            label.push_str(" [lazy]");
        }
        if !node.is_root() || node.url.is_some() {
            label.push_str(&format!(" {}", state_label(out, glyphs, node.state)));
        }
    }

    DisplayNode {
        label,
        children: view
            .children
            .iter()
            .map(|child| build_display_node(child, out, glyphs))
            .collect(),
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct DisplayNode {
    label: String,
    children: Vec<DisplayNode>,
}

impl TreeItem for DisplayNode {
    type Child = DisplayNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
