// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat view: every channel in one payload, detailed or summarized by rank.

use std::collections::HashSet;

use chorus_config::model::ContextConfig;
use chorus_core::types::{Channel, ChannelType};
use chorus_world::WorldState;
use serde_json::{Value, json};
use tracing::debug;

use crate::optimize::{OptimizeOptions, optimize_payload};
use crate::ranking::{is_activity_spike, rank_channels};
use crate::render::{
    recent_messages, render_action, render_channel_info, render_channel_summary, render_goal,
    render_message,
};
use crate::size::{BuiltPayload, PayloadMode, PayloadStats, payload_size};

/// Detail limits in force for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Profile {
    max_detailed_channels: usize,
    messages_per_channel: usize,
}

impl Profile {
    fn select(config: &ContextConfig, spike: bool) -> Self {
        if spike {
            Self {
                max_detailed_channels: config.spike_max_detailed_channels,
                messages_per_channel: config.spike_messages_per_channel,
            }
        } else {
            Self {
                max_detailed_channels: config.max_detailed_channels,
                messages_per_channel: config.messages_per_channel,
            }
        }
    }
}

/// Render the flat view.
///
/// `primary` names the channel the cycle focuses on; `None` means the
/// highest-ranked channel. The primary channel is always detailed when it
/// is active. During an activity spike the aggressive profile applies and
/// every other channel carries `recently_joined: true`.
pub fn build_full_view(
    state: &WorldState,
    config: &ContextConfig,
    primary: Option<&str>,
    now: f64,
) -> BuiltPayload {
    let spike = is_activity_spike(state, config, now);
    let profile = Profile::select(config, spike);
    let ranked = rank_channels(state, config);

    let primary_key: Option<(ChannelType, &str)> = match primary {
        Some(id) => state
            .find_channel(id)
            .map(|c| (c.channel_type, c.id.as_str())),
        None => ranked.first().map(|c| (c.channel_type, c.id.as_str())),
    };

    let detailed = select_detailed(&ranked, primary_key, profile.max_detailed_channels);

    let mut stats = PayloadStats::new(PayloadMode::Full);
    let mut detailed_out = Vec::new();
    let mut summaries_out = Vec::new();

    for channel in &ranked {
        let key = (channel.channel_type, channel.id.as_str());
        let is_primary = primary_key == Some(key);
        let mut rendered = if detailed.contains(&key) {
            stats.detailed_channels += 1;
            render_detailed(channel, config, profile.messages_per_channel, &mut stats)
        } else {
            stats.summarized_channels += 1;
            render_channel_summary(channel)
        };
        if spike && !is_primary {
            rendered["recently_joined"] = json!(true);
        }
        if detailed.contains(&key) {
            detailed_out.push(rendered);
        } else {
            summaries_out.push(rendered);
        }
    }

    let recent_actions: Vec<Value> = state
        .actions()
        .iter()
        .rev()
        .take(config.action_history_items)
        .map(render_action)
        .collect();
    let active_goals: Vec<Value> = state.active_goals().map(render_goal).collect();

    let mut payload = json!({
        "mode": PayloadMode::Full,
        "generated_at": now,
        "primary_channel": primary_key.map(|(_, id)| id),
        "activity_spike": spike,
        "channels": {
            "detailed": detailed_out,
            "summaries": summaries_out,
        },
        "recent_actions": recent_actions,
        "active_goals": active_goals,
        "metrics": state.get_metrics(now),
    });

    if let Some(limit) = config.hard_size_limit_bytes {
        let size = payload_size(&payload);
        if size > limit {
            payload = optimize_payload(payload, &OptimizeOptions::from(config));
            stats.optimized = true;
            debug!(
                before = size,
                after = payload_size(&payload),
                limit,
                "flat view exceeded hard size limit, optimized"
            );
        }
    }

    debug!(
        detailed = stats.detailed_channels,
        summarized = stats.summarized_channels,
        messages = stats.message_count,
        spike,
        "built flat view"
    );
    BuiltPayload::finish(payload, stats)
}

fn select_detailed<'a>(
    ranked: &[&'a Channel],
    primary: Option<(ChannelType, &'a str)>,
    max: usize,
) -> HashSet<(ChannelType, &'a str)> {
    let mut detailed = HashSet::new();
    if max == 0 {
        return detailed;
    }
    if let Some(key) = primary
        && ranked
            .iter()
            .any(|c| (c.channel_type, c.id.as_str()) == key && c.is_active())
    {
        detailed.insert(key);
    }
    for channel in ranked.iter().filter(|c| c.is_active()) {
        if detailed.len() >= max {
            break;
        }
        detailed.insert((channel.channel_type, channel.id.as_str()));
    }
    detailed
}

fn render_detailed(
    channel: &Channel,
    config: &ContextConfig,
    limit: usize,
    stats: &mut PayloadStats,
) -> Value {
    let messages: Vec<Value> = recent_messages(channel.messages.iter(), limit)
        .into_iter()
        .map(|m| render_message(m, config, config.summarize_messages))
        .collect();
    stats.message_count += messages.len();
    let mut rendered = render_channel_info(channel);
    rendered["messages"] = Value::Array(messages);
    rendered
}
