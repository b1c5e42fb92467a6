//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color and glyph support based on terminal capabilities and
//! user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use muno::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//!
//! // Use emoji helper that respects config
//! println!("{} Cloning...", emoji(&config, "📥", "[CLONE]"));
//! ```

use std::env;

use console::style;

use crate::defaults::DisplayGlyphs;
use crate::state::RepoState;
use crate::tree::NodeType;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the appropriate string based on color configuration.
///
/// When colors are enabled, returns the emoji. When disabled, returns
/// the plain text alternative.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Marker for a node kind: the configured glyph, or a bracketed tag.
pub fn node_marker<'a>(
    config: &OutputConfig,
    glyphs: &'a DisplayGlyphs,
    kind: NodeType,
) -> &'a str {
    match kind {
        NodeType::Root => emoji(config, &glyphs.root, "[root]"),
        NodeType::Repo => emoji(config, &glyphs.repo, "[repo]"),
        NodeType::Config => emoji(config, &glyphs.config, "[config]"),
    }
}

/// State word, prefixed with its glyph and colored when enabled.
pub fn state_label(config: &OutputConfig, glyphs: &DisplayGlyphs, state: RepoState) -> String {
    let word = state.to_string();
    if !config.use_color {
        return word;
    }
    let (glyph, styled) = match state {
        RepoState::Cloned => (&glyphs.cloned, style(word).green()),
        RepoState::Modified => (&glyphs.modified, style(word).yellow()),
        RepoState::Missing => (&glyphs.missing, style(word).dim()),
    };
    format!("{} {}", glyph, styled.force_styling(true))
}
