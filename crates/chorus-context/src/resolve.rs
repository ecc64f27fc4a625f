// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-node-kind data handlers and collapsed-node placeholders.

use chorus_config::model::ContextConfig;
use chorus_world::WorldState;
use serde_json::{Value, json};

use crate::paths::NodeKind;
use crate::render::{
    recent_messages, render_action, render_channel_info, render_goal, render_message,
    truncate_chars,
};

const PLACEHOLDER_PREVIEW_CHARS: usize = 80;

/// Full detail for an expanded node. `None` when the store has nothing at
/// that path; the caller skips the node.
pub fn resolve_node(
    kind: &NodeKind,
    state: &WorldState,
    config: &ContextConfig,
    now: f64,
) -> Option<Value> {
    match kind {
        NodeKind::ChannelInfo {
            platform,
            channel_id,
        } => state
            .channel(*platform, channel_id)
            .map(render_channel_info),
        NodeKind::ChannelMessages {
            platform,
            channel_id,
        } => {
            let channel = state.channel(*platform, channel_id)?;
            let messages: Vec<Value> =
                recent_messages(channel.messages.iter(), config.node_messages_per_channel)
                    .into_iter()
                    .map(|m| render_message(m, config, config.summarize_messages))
                    .collect();
            Some(json!({
                "channel_id": channel.id,
                "platform": channel.channel_type,
                "name": channel.name,
                "total_messages": channel.messages.len(),
                "messages": messages,
            }))
        }
        NodeKind::Thread { root_id } => {
            let thread = state.thread(root_id)?;
            let messages: Vec<Value> = thread
                .iter()
                .map(|m| render_message(m, config, config.summarize_messages))
                .collect();
            Some(json!({ "root_id": root_id, "messages": messages }))
        }
        NodeKind::User { platform, user_key } => {
            let user = state.user(*platform, user_key)?;
            let mut data = json!(user);
            let memory_count = state.memories(*platform, user_key).map_or(0, |m| m.len());
            if memory_count > 0 {
                data["memory_count"] = json!(memory_count);
            }
            Some(data)
        }
        NodeKind::MemoryBank { platform, user_key } => {
            let entries = state.memories(*platform, user_key)?;
            if entries.is_empty() {
                return None;
            }
            Some(json!({
                "platform": platform,
                "user_key": user_key,
                "memories": entries,
            }))
        }
        NodeKind::ToolCache => non_empty(json!(state.tool_cache())),
        NodeKind::SearchCache => non_empty(json!(state.search_cache())),
        NodeKind::MediaGallery => non_empty(json!(state.media())),
        NodeKind::ActiveGoals => {
            let goals: Vec<Value> = state.active_goals().map(render_goal).collect();
            non_empty(Value::Array(goals))
        }
        NodeKind::SystemStatus => {
            let recent: Vec<Value> = state
                .actions()
                .iter()
                .rev()
                .take(config.action_history_items)
                .map(render_action)
                .collect();
            Some(json!({
                "metrics": state.get_metrics(now),
                "recent_actions": recent,
            }))
        }
    }
}

fn non_empty(value: Value) -> Option<Value> {
    match &value {
        Value::Array(items) if items.is_empty() => None,
        _ => Some(value),
    }
}

/// One-line description of a collapsed node, used when the directory has no
/// cached summary for it.
pub fn placeholder_summary(kind: &NodeKind, state: &WorldState) -> String {
    match kind {
        NodeKind::ChannelInfo {
            platform,
            channel_id,
        } => match state.channel(*platform, channel_id) {
            Some(c) => format!("{} ({platform}, {})", c.name, c.status),
            None => "unknown channel".to_string(),
        },
        NodeKind::ChannelMessages {
            platform,
            channel_id,
        } => match state
            .channel(*platform, channel_id)
            .and_then(|c| c.messages.back().map(|m| (c.messages.len(), m)))
        {
            Some((count, latest)) => format!(
                "{count} messages, latest from {}: {}",
                latest.sender.label(),
                truncate_chars(&latest.content, PLACEHOLDER_PREVIEW_CHARS)
            ),
            None => "no messages".to_string(),
        },
        NodeKind::Thread { root_id } => {
            let count = state.thread(root_id).map_or(0, |t| t.len());
            format!("{count} messages in thread")
        }
        NodeKind::User { platform, user_key } => match state.user(*platform, user_key) {
            Some(user) => {
                let label = user
                    .display_name
                    .as_deref()
                    .or(user.username.as_deref())
                    .unwrap_or(&user.user_key);
                format!("{label}: {} messages", user.message_count)
            }
            None => "unknown user".to_string(),
        },
        NodeKind::MemoryBank { platform, user_key } => {
            let count = state.memories(*platform, user_key).map_or(0, |m| m.len());
            format!("{count} memories")
        }
        NodeKind::ToolCache => format!("{} cached tool results", state.tool_cache().len()),
        NodeKind::SearchCache => format!("{} recent searches", state.search_cache().len()),
        NodeKind::MediaGallery => format!("{} media items", state.media().len()),
        NodeKind::ActiveGoals => format!("{} active goals", state.active_goals().count()),
        NodeKind::SystemStatus => format!(
            "{} channels, {} messages, {} actions",
            state.channel_count(),
            state.message_count(),
            state.actions().len()
        ),
    }
}

/// Messages rendered inside a resolved node's data.
pub fn rendered_message_count(data: &Value) -> usize {
    data.get("messages")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}
