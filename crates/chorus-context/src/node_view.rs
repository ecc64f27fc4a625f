// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node view: the store as addressable paths, expanded or collapsed per the
//! expansion directory.

use std::cmp::Reverse;

use chorus_config::model::ContextConfig;
use chorus_core::traits::{NodeDirectory, NodeMetadata};
use chorus_world::WorldState;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::paths::{NodeKind, enumerate_nodes};
use crate::ranking::rank_channels;
use crate::resolve::{placeholder_summary, rendered_message_count, resolve_node};
use crate::size::{BuiltPayload, PayloadMode, PayloadStats};

struct Entry {
    kind: NodeKind,
    expanded: bool,
    rendered: Value,
}

/// Render the node view.
///
/// Without a directory every node is collapsed. Expanded nodes whose data
/// cannot be resolved are skipped. When the expanded nodes carry no
/// messages while the store has some, the recent messages of the busiest
/// channels are force-expanded for this render only; the directory is not
/// touched.
pub fn build_node_view(
    state: &WorldState,
    directory: Option<&dyn NodeDirectory>,
    config: &ContextConfig,
    now: f64,
) -> BuiltPayload {
    let kinds = enumerate_nodes(state, config);
    let mut stats = PayloadStats::new(PayloadMode::Node);
    stats.total_nodes = kinds.len();

    let mut entries: Vec<Entry> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let path = kind.to_string();
        let meta = directory
            .and_then(|d| d.metadata(&path))
            .unwrap_or_else(NodeMetadata::collapsed);

        if meta.expanded {
            match resolve_node(&kind, state, config, now) {
                Some(data) => {
                    stats.message_count += rendered_message_count(&data);
                    entries.push(Entry {
                        kind,
                        expanded: true,
                        rendered: json!({ "path": path, "expanded": true, "data": data }),
                    });
                }
                None => {
                    debug!(path = %path, "expanded node has no data, skipping");
                    stats.skipped_nodes += 1;
                }
            }
        } else {
            let summary = meta
                .summary
                .unwrap_or_else(|| placeholder_summary(&kind, state));
            entries.push(Entry {
                kind,
                expanded: false,
                rendered: json!({ "path": path, "expanded": false, "summary": summary }),
            });
        }
    }

    if stats.message_count == 0 && state.message_count() > 0 {
        apply_failsafe(state, config, now, &mut entries, &mut stats);
    }

    stats.expanded_nodes = entries.iter().filter(|e| e.expanded).count();
    stats.collapsed_nodes = entries.len() - stats.expanded_nodes;

    let nodes: Vec<Value> = entries.into_iter().map(|e| e.rendered).collect();
    let payload = json!({
        "mode": PayloadMode::Node,
        "generated_at": now,
        "nodes": nodes,
    });

    debug!(
        expanded = stats.expanded_nodes,
        collapsed = stats.collapsed_nodes,
        skipped = stats.skipped_nodes,
        messages = stats.message_count,
        "built node view"
    );
    BuiltPayload::finish(payload, stats)
}

/// Force-expand `recent_messages` of the channels holding the most messages,
/// ties broken by activity rank.
fn apply_failsafe(
    state: &WorldState,
    config: &ContextConfig,
    now: f64,
    entries: &mut [Entry],
    stats: &mut PayloadStats,
) {
    let mut candidates: Vec<(usize, usize, NodeKind)> = rank_channels(state, config)
        .into_iter()
        .enumerate()
        .filter(|(_, c)| !c.messages.is_empty())
        .map(|(rank, c)| {
            (
                c.messages.len(),
                rank,
                NodeKind::ChannelMessages {
                    platform: c.channel_type,
                    channel_id: c.id.clone(),
                },
            )
        })
        .collect();
    candidates.sort_by_key(|(count, rank, _)| (Reverse(*count), *rank));

    let mut forced = Vec::new();
    for (_, _, kind) in candidates.into_iter().take(config.failsafe_channel_count) {
        let Some(data) = resolve_node(&kind, state, config, now) else {
            continue;
        };
        let Some(entry) = entries.iter_mut().find(|e| e.kind == kind) else {
            continue;
        };
        stats.message_count += rendered_message_count(&data);
        let path = kind.to_string();
        entry.expanded = true;
        entry.rendered = json!({
            "path": path,
            "expanded": true,
            "forced": true,
            "data": data,
        });
        forced.push(path);
    }

    if !forced.is_empty() {
        stats.failsafe_applied = true;
        info!(
            channels = ?forced,
            "no messages in expanded nodes, force-expanded busiest channels"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chorus_core::types::{ChannelType, Message, SenderInfo};

    use super::*;

    #[derive(Default)]
    struct MapDirectory(Mutex<HashMap<String, NodeMetadata>>);

    impl MapDirectory {
        fn set(&self, path: &str, meta: NodeMetadata) {
            self.0.lock().unwrap().insert(path.to_string(), meta);
        }
    }

    impl NodeDirectory for MapDirectory {
        fn metadata(&self, path: &str) -> Option<NodeMetadata> {
            self.0.lock().unwrap().get(path).cloned()
        }
        fn expand(&self, _path: &str, _now: f64) -> Vec<String> {
            Vec::new()
        }
        fn collapse(&self, _path: &str) -> bool {
            false
        }
    }

    fn expanded() -> NodeMetadata {
        NodeMetadata {
            expanded: true,
            ..NodeMetadata::default()
        }
    }

    fn add(state: &mut WorldState, id: &str, channel: &str, ts: f64) {
        let msg = Message::new(id, channel, ChannelType::Matrix, SenderInfo::new("@u:x"), "hi", ts);
        state.add_message(channel, msg);
    }

    #[test]
    fn no_directory_means_collapsed_with_failsafe() {
        let mut state = WorldState::default();
        add(&mut state, "m1", "!a:x", 1.0);
        let built = build_node_view(&state, None, &ContextConfig::default(), 10.0);
        assert!(built.stats.failsafe_applied);
        assert_eq!(built.stats.expanded_nodes, 1);
        assert_eq!(built.stats.message_count, 1);
    }

    #[test]
    fn empty_store_skips_failsafe() {
        let state = WorldState::default();
        let built = build_node_view(&state, None, &ContextConfig::default(), 10.0);
        assert!(!built.stats.failsafe_applied);
        assert_eq!(built.stats.total_nodes, 1);
        assert_eq!(built.payload["nodes"][0]["path"], "system/status");
    }

    #[test]
    fn failsafe_prefers_busiest_channels() {
        let mut state = WorldState::default();
        for i in 0..3 {
            add(&mut state, &format!("q{i}"), "!quiet:x", 100.0 + i as f64);
        }
        for i in 0..5 {
            add(&mut state, &format!("b{i}"), "!busy:x", 10.0 + i as f64);
        }
        add(&mut state, "s1", "!single:x", 500.0);
        let config = ContextConfig {
            failsafe_channel_count: 2,
            ..ContextConfig::default()
        };
        let built = build_node_view(&state, None, &config, 600.0);
        let forced: Vec<&str> = built.payload["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["forced"] == true)
            .map(|n| n["path"].as_str().unwrap())
            .collect();
        assert_eq!(forced.len(), 2);
        assert!(forced.contains(&"channels/matrix/!busy:x/recent_messages"));
        assert!(forced.contains(&"channels/matrix/!quiet:x/recent_messages"));
    }

    #[test]
    fn expanded_messages_suppress_failsafe() {
        let mut state = WorldState::default();
        add(&mut state, "m1", "!a:x", 1.0);
        add(&mut state, "m2", "!b:x", 2.0);
        let dir = MapDirectory::default();
        dir.set("channels/matrix/!a:x/recent_messages", expanded());
        let built = build_node_view(&state, Some(&dir), &ContextConfig::default(), 10.0);
        assert!(!built.stats.failsafe_applied);
        assert_eq!(built.stats.expanded_nodes, 1);
        assert_eq!(built.stats.message_count, 1);
    }

    #[test]
    fn cached_summary_is_used_for_collapsed_nodes() {
        let mut state = WorldState::default();
        add(&mut state, "m1", "!a:x", 1.0);
        let dir = MapDirectory::default();
        dir.set("channels/matrix/!a:x/recent_messages", expanded());
        dir.set(
            "channels/matrix/!a:x/info",
            NodeMetadata {
                summary: Some("the lobby".into()),
                ..NodeMetadata::default()
            },
        );
        let built = build_node_view(&state, Some(&dir), &ContextConfig::default(), 10.0);
        let info = built.payload["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["path"] == "channels/matrix/!a:x/info")
            .cloned()
            .unwrap();
        assert_eq!(info["summary"], "the lobby");
        assert_eq!(info["expanded"], false);
    }

    #[test]
    fn stats_count_every_node() {
        let mut state = WorldState::default();
        add(&mut state, "m1", "!a:x", 1.0);
        let dir = MapDirectory::default();
        dir.set("system/status", expanded());
        let built = build_node_view(&state, Some(&dir), &ContextConfig::default(), 10.0);
        let stats = &built.payload["payload_stats"];
        // system/status, info, recent_messages, users/matrix/@u:x
        assert_eq!(stats["total_nodes"], 4);
        assert_eq!(
            built.stats.expanded_nodes + built.stats.collapsed_nodes,
            built.stats.total_nodes
        );
        assert!(stats["size_bytes"].as_u64().unwrap() > 0);
        assert!(stats["estimated_tokens"].as_u64().unwrap() > 0);
    }
}
