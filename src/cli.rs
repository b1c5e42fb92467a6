//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use muno::defaults::WORKSPACE_ENV;

use crate::commands::{self, Context};

/// muno - Navigate many git repositories as one lazily cloned tree
#[derive(Parser, Debug)]
#[command(name = "muno")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Workspace directory. Defaults to searching upward from the current
    /// directory.
    #[arg(short = 'C', long, global = true, value_name = "DIR", env = WORKSPACE_ENV)]
    workspace: Option<PathBuf>,

    /// Override a config value for this run, e.g. `git.clone_timeout=600`.
    /// May be repeated.
    #[arg(long = "config", global = true, value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new muno.yaml workspace configuration
    Init(commands::init::InitArgs),

    /// List the children of a node
    #[command(alias = "ls")]
    List(commands::list::ListArgs),

    /// Display the workspace tree
    Tree(commands::tree::TreeArgs),

    /// Show the live state of repositories
    Status(commands::status::StatusArgs),

    /// Move to a node, cloning whatever the path needs
    Use(commands::use_node::UseArgs),

    /// Print the current position
    Current(commands::current::CurrentArgs),

    /// Add a repository under a node
    Add(commands::add::AddArgs),

    /// Remove a node and its working tree
    #[command(alias = "rm")]
    Remove(commands::remove::RemoveArgs),

    /// Clone repositories according to their fetch policy
    Clone(commands::clone::CloneArgs),

    /// Pull cloned repositories
    Pull(commands::pull::PullArgs),

    /// Push cloned repositories
    Push(commands::push::PushArgs),

    /// Commit local changes in modified repositories
    Commit(commands::commit::CommitArgs),

    /// Show resolved configuration values
    Config(commands::config::ConfigArgs),

    /// Validate the workspace configuration files
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = Context {
            color: self.color,
            workspace: self.workspace,
            overrides: self.overrides,
        };

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &ctx),
            Commands::List(args) => commands::list::execute(args, &ctx),
            Commands::Tree(args) => commands::tree::execute(args, &ctx),
            Commands::Status(args) => commands::status::execute(args, &ctx),
            Commands::Use(args) => commands::use_node::execute(args, &ctx),
            Commands::Current(args) => commands::current::execute(args, &ctx),
            Commands::Add(args) => commands::add::execute(args, &ctx),
            Commands::Remove(args) => commands::remove::execute(args, &ctx),
            Commands::Clone(args) => commands::clone::execute(args, &ctx),
            Commands::Pull(args) => commands::pull::execute(args, &ctx),
            Commands::Push(args) => commands::push::execute(args, &ctx),
            Commands::Commit(args) => commands::commit::execute(args, &ctx),
            Commands::Config(args) => commands::config::execute(args, &ctx),
            Commands::Validate(args) => commands::validate::execute(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Route `log` records to stderr. `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
