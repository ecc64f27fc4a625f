// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent in-memory [`NodeDirectory`].

use chorus_config::model::ContextConfig;
use chorus_core::traits::{NodeDirectory, NodeMetadata};
use dashmap::DashMap;
use tracing::debug;

/// Expansion state for node paths, shared between the decision engine's
/// expand/collapse tools and the payload builder.
///
/// At most `max_expanded` nodes are expanded at once. Expanding past the
/// limit collapses the least recently expanded unpinned nodes.
#[derive(Debug)]
pub struct InMemoryNodeDirectory {
    nodes: DashMap<String, NodeMetadata>,
    max_expanded: usize,
}

impl InMemoryNodeDirectory {
    pub fn new(max_expanded: usize) -> Self {
        Self {
            nodes: DashMap::new(),
            max_expanded,
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.max_expanded_nodes)
    }

    /// Pin `path` so auto-collapse never picks it.
    pub fn pin(&self, path: &str) {
        self.nodes.entry(path.to_string()).or_default().pinned = true;
    }

    pub fn unpin(&self, path: &str) -> bool {
        match self.nodes.get_mut(path) {
            Some(mut meta) => std::mem::replace(&mut meta.pinned, false),
            None => false,
        }
    }

    /// Cache a summary shown while `path` is collapsed.
    pub fn set_summary(&self, path: &str, summary: impl Into<String>) {
        self.nodes.entry(path.to_string()).or_default().summary = Some(summary.into());
    }

    /// Currently expanded paths, sorted.
    pub fn expanded_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .nodes
            .iter()
            .filter(|e| e.value().expanded)
            .map(|e| e.key().clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for InMemoryNodeDirectory {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

impl NodeDirectory for InMemoryNodeDirectory {
    fn metadata(&self, path: &str) -> Option<NodeMetadata> {
        self.nodes.get(path).map(|meta| meta.value().clone())
    }

    fn expand(&self, path: &str, now: f64) -> Vec<String> {
        {
            let mut meta = self.nodes.entry(path.to_string()).or_default();
            meta.expanded = true;
            meta.last_expanded_at = Some(now);
        }

        // Snapshot first; no map guard may be held while collapsing.
        let mut expanded_count = 0usize;
        let mut candidates: Vec<(String, f64)> = Vec::new();
        for entry in self.nodes.iter() {
            let meta = entry.value();
            if !meta.expanded {
                continue;
            }
            expanded_count += 1;
            if !meta.pinned && entry.key() != path {
                candidates.push((entry.key().clone(), meta.last_expanded_at.unwrap_or(0.0)));
            }
        }

        let excess = expanded_count.saturating_sub(self.max_expanded);
        if excess == 0 {
            return Vec::new();
        }
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut collapsed = Vec::with_capacity(excess);
        for (victim, _) in candidates.into_iter().take(excess) {
            if self.collapse(&victim) {
                collapsed.push(victim);
            }
        }
        debug!(path, collapsed = ?collapsed, "auto-collapsed nodes over the expansion limit");
        collapsed
    }

    fn collapse(&self, path: &str) -> bool {
        match self.nodes.get_mut(path) {
            Some(mut meta) => std::mem::replace(&mut meta.expanded, false),
            None => false,
        }
    }
}
