//! Layered configuration values
//!
//! Configuration values (clone timeout, default branch, parallelism, ...) come
//! from four layers, lowest precedence first:
//!
//! 1. the embedded defaults (`config:` section of `defaults.yaml`),
//! 2. the workspace `overrides:` map of the configuration files,
//! 3. the `overrides:` map of an individual node,
//! 4. `--config key.path=value` flags from the command line.
//!
//! Layers are combined with [`deep_merge`]: nested maps merge key by key, any
//! other value replaces what was there. Values are addressed with dotted paths
//! such as `git.clone_timeout`.

use std::time::Duration;

use serde_yaml::{Mapping, Value};

use crate::config::{ConfigMap, NodeDefinition};
use crate::defaults::EmbeddedDefaults;
use crate::error::{Error, Result};

/// Keys that apply to a single node rather than the whole workspace.
pub const NODE_SPECIFIC_KEYS: &[&str] = &[
    "git.default_branch",
    "git.default_remote",
    "git.shallow_depth",
    "fetch",
];

/// Key fragments whose values are parsed as integers when possible.
const INTEGER_KEY_HINTS: &[&str] = &["timeout", "depth", "parallel", "size"];

const FALLBACK_BRANCH: &str = "main";
const FALLBACK_CLONE_TIMEOUT_SECS: u64 = 300;
const FALLBACK_MAX_PARALLEL: usize = 4;

/// Merge `src` into `dst` in place.
///
/// When both sides hold a map under the same key the maps are merged
/// recursively; otherwise the value from `src` replaces the one in `dst`, even
/// if the type changes. Keys only present in `dst` are kept.
pub fn deep_merge(dst: &mut Mapping, src: &Mapping) {
    for (key, value) in src {
        match (dst.get_mut(key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                dst.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Look up a dotted path in a nested map.
///
/// Returns `None` when a segment is missing or an intermediate value is not a
/// map.
pub fn get_by_path<'a>(map: &'a Mapping, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next().filter(|s| !s.is_empty())?;
    let mut current = map.get(first)?;
    for segment in segments {
        current = current.as_mapping()?.get(segment)?;
    }
    Some(current)
}

/// Set a dotted path in a nested map, creating intermediate maps as needed.
///
/// A non-map value sitting where an intermediate map is needed is replaced.
pub fn set_by_path(map: &mut Mapping, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = map;
    for segment in parents {
        let key = Value::from(*segment);
        let entry = current
            .entry(key)
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !entry.is_mapping() {
            *entry = Value::Mapping(Mapping::new());
        }
        current = match entry {
            Value::Mapping(m) => m,
            _ => unreachable!("entry was just made a mapping"),
        };
    }
    current.insert(Value::from(*last), value);
}

/// Coerce the raw string of a `key=value` override.
pub fn coerce_value(key: &str, raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    let key_lower = key.to_lowercase();
    if INTEGER_KEY_HINTS.iter().any(|hint| key_lower.contains(hint)) {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::from(n);
        }
    }
    Value::from(raw)
}

/// Parse `key.path=value` strings into a nested map.
pub fn parse_config_overrides<S: AsRef<str>>(entries: &[S]) -> Result<Mapping> {
    let mut map = Mapping::new();
    for entry in entries {
        let entry = entry.as_ref();
        let (key, raw) = entry.split_once('=').ok_or_else(|| Error::InvalidOverride {
            entry: entry.to_string(),
            message: "expected key=value".to_string(),
        })?;
        let key = key.trim();
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(Error::InvalidOverride {
                entry: entry.to_string(),
                message: "key must be a dotted path such as git.clone_timeout".to_string(),
            });
        }
        set_by_path(&mut map, key, coerce_value(key, raw.trim()));
    }
    Ok(map)
}

/// Whether an override key belongs in a node's `overrides` rather than the
/// workspace's.
pub fn is_node_specific_key(key: &str) -> bool {
    NODE_SPECIFIC_KEYS.contains(&key)
}

/// Resolves configuration values across the four layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    defaults: Mapping,
    workspace: Mapping,
    cli: Mapping,
}

impl ConfigResolver {
    pub fn new(defaults: &EmbeddedDefaults) -> Self {
        Self {
            defaults: defaults.config.clone(),
            ..Default::default()
        }
    }

    /// Add a workspace-level map. Successive calls merge, so nested levels
    /// can layer their own overrides over the root's.
    pub fn with_workspace(mut self, overrides: Option<&ConfigMap>) -> Self {
        if let Some(overrides) = overrides {
            deep_merge(&mut self.workspace, overrides);
        }
        self
    }

    pub fn with_cli(mut self, overrides: Mapping) -> Self {
        self.cli = overrides;
        self
    }

    /// Merged map for `node`, or the workspace-only map when `node` is
    /// `None`.
    pub fn resolve(&self, node: Option<&NodeDefinition>) -> Mapping {
        let mut merged = self.defaults.clone();
        deep_merge(&mut merged, &self.workspace);
        if let Some(overrides) = node.and_then(|n| n.overrides.as_ref()) {
            deep_merge(&mut merged, overrides);
        }
        deep_merge(&mut merged, &self.cli);
        merged
    }

    pub fn get_value(&self, path: &str, node: Option<&NodeDefinition>) -> Option<Value> {
        get_by_path(&self.resolve(node), path).cloned()
    }

    /// Branch set explicitly for `node`, either as a field or a config value.
    pub fn explicit_branch(&self, node: &NodeDefinition) -> Option<String> {
        if let Some(branch) = node.default_branch() {
            return Some(branch.to_string());
        }
        match self.get_value("git.default_branch", Some(node)) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Default branch of `node`, falling back to `main`.
    pub fn get_default_branch(&self, node: Option<&NodeDefinition>) -> String {
        if let Some(branch) = node.and_then(|n| n.default_branch()) {
            return branch.to_string();
        }
        match self.get_value("git.default_branch", node) {
            Some(Value::String(s)) => s,
            _ => FALLBACK_BRANCH.to_string(),
        }
    }

    /// Per-command timeout for clone and pull.
    pub fn clone_timeout(&self, node: Option<&NodeDefinition>) -> Duration {
        let secs = self
            .get_value("git.clone_timeout", node)
            .and_then(|v| value_as_u64(&v))
            .unwrap_or(FALLBACK_CLONE_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Shallow clone depth; `None` means a full clone.
    pub fn shallow_depth(&self, node: Option<&NodeDefinition>) -> Option<u32> {
        self.get_value("git.shallow_depth", node)
            .and_then(|v| value_as_u64(&v))
            .and_then(|d| u32::try_from(d).ok())
            .filter(|d| *d > 0)
    }

    /// Upper bound on concurrent clone/pull jobs.
    pub fn max_parallel(&self) -> usize {
        self.get_value("git.max_parallel", None)
            .and_then(|v| value_as_u64(&v))
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(FALLBACK_MAX_PARALLEL)
    }

    /// Remote name used for push and pull.
    pub fn default_remote(&self, node: Option<&NodeDefinition>) -> String {
        match self.get_value("git.default_remote", node) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => "origin".to_string(),
        }
    }
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
