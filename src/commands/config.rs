//! # Config Command Implementation
//!
//! This module implements the `config` subcommand, which prints configuration
//! values as the navigator sees them: embedded defaults, workspace overrides,
//! node overrides and `--config` flags merged in that order.

use anyhow::Result;
use clap::Args;
use serde_yaml::Value;

use muno::resolver::get_by_path;

use super::{explain, Context};

/// Show resolved configuration values
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Dotted key to print, e.g. `git.clone_timeout`. Prints every value when
    /// omitted.
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    /// Node whose overrides apply. Defaults to the workspace root.
    #[arg(long, value_name = "PATH")]
    pub node: Option<String>,
}

/// Execute the `config` command.
pub fn execute(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let nav = ctx.navigator()?;
    let path = match &args.node {
        Some(node) => nav.absolute_path(node)?,
        None => "/".to_string(),
    };
    let merged = nav
        .effective_config(&path)
        .map_err(|e| explain(&nav, e))?;

    let Some(key) = args.key else {
        print!("{}", serde_yaml::to_string(&merged)?);
        return Ok(());
    };

    let value = get_by_path(&merged, &key)
        .ok_or_else(|| anyhow::anyhow!("Config key not found: {}", key))?;
    println!("{}", render_value(value)?);
    Ok(())
}

/// Scalars print bare; maps and lists print as YAML.
fn render_value(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)?.trim_end().to_string(),
    })
}
