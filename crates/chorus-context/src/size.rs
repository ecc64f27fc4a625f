// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payload size measurement and pre-render estimation.

use chorus_config::model::ContextConfig;
use chorus_world::WorldState;
use serde::Serialize;
use serde_json::Value;
use strum::Display;

use crate::ranking::rank_channels;
use crate::render::SUMMARY_TEXT_CHARS;

/// Average bytes per token used for estimates.
pub const BYTES_PER_TOKEN: f64 = 3.5;

// Rough JSON overhead per rendered element, measured against real renders.
const PAYLOAD_BASE_BYTES: usize = 512;
const MESSAGE_OVERHEAD_BYTES: usize = 120;
const CHANNEL_DETAIL_OVERHEAD_BYTES: usize = 220;
const CHANNEL_SUMMARY_BYTES: usize = 200;
const ACTION_BYTES: usize = 160;
const GOAL_BYTES: usize = 200;

/// Which view a payload was rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayloadMode {
    Full,
    Node,
}

/// `payload_stats` block attached to every rendered payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadStats {
    pub mode: PayloadMode,
    pub expanded_nodes: usize,
    pub collapsed_nodes: usize,
    pub total_nodes: usize,
    /// Expanded nodes whose data could not be resolved.
    pub skipped_nodes: usize,
    pub detailed_channels: usize,
    pub summarized_channels: usize,
    /// Messages rendered in the payload.
    pub message_count: usize,
    /// Serialized size of the payload without this block.
    pub size_bytes: usize,
    pub estimated_tokens: usize,
    pub failsafe_applied: bool,
    pub optimized: bool,
}

impl PayloadStats {
    pub fn new(mode: PayloadMode) -> Self {
        Self {
            mode,
            expanded_nodes: 0,
            collapsed_nodes: 0,
            total_nodes: 0,
            skipped_nodes: 0,
            detailed_channels: 0,
            summarized_channels: 0,
            message_count: 0,
            size_bytes: 0,
            estimated_tokens: 0,
            failsafe_applied: false,
            optimized: false,
        }
    }

    pub fn set_size(&mut self, size_bytes: usize) {
        self.size_bytes = size_bytes;
        self.estimated_tokens = estimate_tokens(size_bytes);
    }
}

/// A rendered payload together with the stats embedded in it.
#[derive(Debug, Clone)]
pub struct BuiltPayload {
    pub mode: PayloadMode,
    pub payload: Value,
    pub stats: PayloadStats,
}

impl BuiltPayload {
    /// Finalize `payload`: measure it, then attach the `payload_stats` block.
    pub(crate) fn finish(mut payload: Value, mut stats: PayloadStats) -> Self {
        stats.set_size(payload_size(&payload));
        if let Value::Object(map) = &mut payload {
            map.insert(
                "payload_stats".into(),
                serde_json::to_value(&stats).unwrap_or(Value::Null),
            );
        }
        Self {
            mode: stats.mode,
            payload,
            stats,
        }
    }
}

/// Tokens for `bytes` of payload, rounded up.
pub fn estimate_tokens(bytes: usize) -> usize {
    (bytes as f64 / BYTES_PER_TOKEN).ceil() as usize
}

/// Serialized size of a JSON value in bytes.
pub fn payload_size(value: &Value) -> usize {
    serde_json::to_vec(value).map_or(0, |bytes| bytes.len())
}

/// Pre-render estimate of a flat view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PayloadEstimate {
    pub estimated_bytes: usize,
    pub estimated_tokens: usize,
}

/// Estimate the flat view size from raw state without rendering it, so a
/// caller can pick the flat or node view up front.
pub fn estimate_payload_size(state: &WorldState, config: &ContextConfig) -> PayloadEstimate {
    let mut bytes = PAYLOAD_BASE_BYTES;

    for (rank, channel) in rank_channels(state, config).into_iter().enumerate() {
        if rank < config.max_detailed_channels && channel.is_active() {
            bytes += CHANNEL_DETAIL_OVERHEAD_BYTES + channel.name.len();
            for message in channel.messages.iter().rev().take(config.messages_per_channel) {
                let text = if config.summarize_messages {
                    message.content.len().min(SUMMARY_TEXT_CHARS * 4)
                } else {
                    message.content.len()
                };
                bytes += MESSAGE_OVERHEAD_BYTES + text + message.sender.raw.len();
                bytes += message.image_urls.iter().map(String::len).sum::<usize>();
            }
        } else {
            bytes += CHANNEL_SUMMARY_BYTES + channel.name.len();
        }
    }

    bytes += state.actions().len().min(config.action_history_items) * ACTION_BYTES;
    bytes += state.active_goals().count() * GOAL_BYTES;

    PayloadEstimate {
        estimated_bytes: bytes,
        estimated_tokens: estimate_tokens(bytes),
    }
}
