//! Session and position bookkeeping
//!
//! The only mutable state muno persists: the tree path the user last moved to
//! and a record of externally launched sessions keyed by tree path. It is
//! stored as JSON in the workspace root and is a convenience, never a source
//! of truth about the tree or about which repositories are cloned.
//!
//! ```json
//! {
//!   "timestamp": "2026-01-01T00:00:00Z",
//!   "current_node_path": "/team/service",
//!   "sessions": {
//!     "/team/service": {
//!       "status": "running",
//!       "pid": 4242,
//!       "start_time": "2026-01-01T00:00:00Z",
//!       "last_activity": "2026-01-01T00:05:00Z"
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle of an external session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Stopped,
}

/// One external session attached to a tree path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub status: SessionStatus,
    pub pid: u32,
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Persisted position and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "root_path")]
    pub current_node_path: String,
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionRecord>,
}

fn root_path() -> String {
    "/".to_string()
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            current_node_path: root_path(),
            sessions: BTreeMap::new(),
        }
    }
}

impl SessionState {
    /// Read the state file. A missing file yields a fresh state positioned at
    /// the root.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io(path, e)),
        };
        serde_json::from_str(&content).map_err(|e| Error::StateParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Stamp the current time and write the state file.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.timestamp = Utc::now();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| Error::io(path, e))
    }

    pub fn current(&self) -> &str {
        &self.current_node_path
    }

    pub fn set_current(&mut self, tree_path: impl Into<String>) {
        self.current_node_path = tree_path.into();
    }

    /// Record a newly launched session, replacing any previous one at the
    /// same path.
    pub fn start_session(&mut self, tree_path: impl Into<String>, pid: u32) {
        let now = Utc::now();
        self.sessions.insert(
            tree_path.into(),
            SessionRecord {
                status: SessionStatus::Running,
                pid,
                start_time: now,
                last_activity: now,
            },
        );
    }

    /// Update the activity time of a session. Returns false when none exists.
    pub fn touch_session(&mut self, tree_path: &str) -> bool {
        match self.sessions.get_mut(tree_path) {
            Some(record) => {
                record.last_activity = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Mark a session stopped.
    pub fn end_session(&mut self, tree_path: &str) -> Option<&SessionRecord> {
        let record = self.sessions.get_mut(tree_path)?;
        record.status = SessionStatus::Stopped;
        record.last_activity = Utc::now();
        Some(record)
    }

    /// Drop stopped sessions, returning how many were removed.
    pub fn prune_stopped(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, record| record.status == SessionStatus::Running);
        before - self.sessions.len()
    }

    /// Drop sessions recorded under a subtree, e.g. after it was removed.
    pub fn forget_subtree(&mut self, tree_path: &str) {
        let prefix = format!("{}/", tree_path.trim_end_matches('/'));
        self.sessions
            .retain(|path, _| path != tree_path && !path.starts_with(&prefix));
    }
}
