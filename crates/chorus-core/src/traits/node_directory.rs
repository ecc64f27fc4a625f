// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node expansion directory: which payload nodes are expanded or pinned.
//!
//! The directory is maintained by the decision engine's earlier choices. The
//! payload builder only reads it; a path the directory has never seen is
//! treated as collapsed.

use serde::{Deserialize, Serialize};

/// Expansion metadata for a single node path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub expanded: bool,
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_expanded_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl NodeMetadata {
    pub fn collapsed() -> Self {
        Self::default()
    }
}

/// Read/write access to node expansion state.
pub trait NodeDirectory: Send + Sync {
    /// Metadata for `path`, or `None` when the path is unknown.
    fn metadata(&self, path: &str) -> Option<NodeMetadata>;

    /// Mark `path` expanded. Returns the paths auto-collapsed to make room.
    fn expand(&self, path: &str, now: f64) -> Vec<String>;

    /// Mark `path` collapsed. Returns whether the node was expanded before.
    fn collapse(&self, path: &str) -> bool;
}
