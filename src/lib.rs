//! # muno
//!
//! Manage a large set of independently versioned git repositories as one
//! navigable tree, where most repositories are cloned only when they are
//! first needed.
//!
//! ## Quick Example
//!
//! ```
//! use muno::classifier::Classifier;
//! use muno::config::ConfigTree;
//! use muno::defaults::EmbeddedDefaults;
//!
//! let defaults = EmbeddedDefaults::builtin().unwrap();
//! let tree = ConfigTree::parse(
//!     r#"
//! workspace:
//!   name: platform
//! nodes:
//!   - name: backend-monorepo
//!     url: https://github.com/acme/backend-monorepo.git
//!   - name: payments
//!     url: https://github.com/acme/payments.git
//! "#,
//!     std::path::Path::new("muno.yaml"),
//! )
//! .unwrap();
//!
//! let classifier = Classifier::new(&defaults.detection.eager_patterns);
//! let lazy: Vec<bool> = tree.nodes.iter().map(|n| classifier.effective_lazy(n)).collect();
//! assert_eq!(lazy, vec![false, true]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: one `muno.yaml` file describes one level of
//!   the tree. Nodes are repositories (`url`) or delegations to another file
//!   (`config`).
//! - **Classification (`classifier`)**: decides which repositories are cloned
//!   eagerly. Meta-repositories matching suffixes such as `-monorepo` are; the
//!   rest wait until someone navigates into them.
//! - **Resolution (`resolver`)**: layered config values, from the embedded
//!   defaults through workspace and node overrides up to the command line.
//! - **State (`state`)**: whether a repository is present is read off the disk
//!   every time, never recorded.
//! - **Navigation (`loader`, `navigator`)**: tree paths like `/team/service`
//!   are resolved by walking and stitching configuration files, cloning what
//!   the path needs.
//! - **Session (`session`)**: the current position, the only state muno
//!   persists.

pub mod classifier;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod loader;
pub mod navigator;
pub mod output;
pub mod path;
pub mod resolver;
pub mod session;
pub mod state;
pub mod suggestions;
pub mod tree;

#[cfg(test)]
mod path_proptest;
