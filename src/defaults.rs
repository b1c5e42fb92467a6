//! Default values for muno workspaces.
//!
//! The built-in defaults live in an embedded YAML document (`defaults.yaml`)
//! and are parsed once into an immutable [`EmbeddedDefaults`] value. Callers
//! construct it at startup and pass it explicitly to every component that needs
//! it (the tree loader, the classifier, the resolver) instead of reaching for a
//! global.

use serde::Deserialize;

use crate::error::{Error, Result};

/// File name written by `muno init` and used when no other name is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "muno.yaml";

/// Environment variable that points the CLI at a workspace directory.
pub const WORKSPACE_ENV: &str = "MUNO_WORKSPACE";

const EMBEDDED_DEFAULTS_YAML: &str = include_str!("defaults.yaml");

/// The parsed built-in defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedDefaults {
    pub workspace: WorkspaceDefaults,
    pub detection: DetectionDefaults,
    pub files: FileDefaults,
    pub display: DisplayGlyphs,
    /// Lowest-precedence layer of the config value resolver.
    pub config: serde_yaml::Mapping,
}

/// Workspace-level fallbacks applied to fields a config file leaves empty.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceDefaults {
    pub repos_dir: String,
    pub ssh_preference: bool,
}

/// Eager-fetch detection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionDefaults {
    pub eager_patterns: Vec<String>,
}

/// Well-known file names.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDefaults {
    /// Accepted configuration file names, in discovery order.
    pub config_names: Vec<String>,
    pub state_file: String,
}

/// Glyphs used when rendering tree and status views.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayGlyphs {
    pub root: String,
    pub repo: String,
    pub config: String,
    pub cloned: String,
    pub modified: String,
    pub missing: String,
}

impl EmbeddedDefaults {
    /// Parse the defaults compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(EMBEDDED_DEFAULTS_YAML)
    }

    /// Parse defaults from a YAML document with the same layout as the
    /// embedded one.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse {
            path: "<embedded defaults>".into(),
            message: e.to_string(),
        })
    }

    /// The canonical configuration file name (first in discovery order).
    pub fn primary_config_name(&self) -> &str {
        self.files
            .config_names
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONFIG_FILENAME)
    }
}
