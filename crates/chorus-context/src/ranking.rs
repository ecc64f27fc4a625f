// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel ordering and activity spike detection.

use chorus_config::model::ContextConfig;
use chorus_core::types::{Channel, ChannelType};
use chorus_world::WorldState;

/// Last activity used for ranking: newest message time (or the status
/// change time for empty channels), plus the Farcaster boost.
pub fn effective_activity(channel: &Channel, config: &ContextConfig) -> f64 {
    let base = channel
        .last_activity()
        .unwrap_or(channel.status_changed_at);
    if channel.channel_type == ChannelType::Farcaster {
        base + config.farcaster_priority_boost_secs
    } else {
        base
    }
}

/// All channels, most recently active first. Ties break on platform then id
/// so the order is stable for an unchanged state.
pub fn rank_channels<'a>(state: &'a WorldState, config: &ContextConfig) -> Vec<&'a Channel> {
    let mut channels: Vec<&Channel> = state.channels().collect();
    channels.sort_by(|a, b| {
        effective_activity(b, config)
            .total_cmp(&effective_activity(a, config))
            .then_with(|| (a.channel_type, &a.id).cmp(&(b.channel_type, &b.id)))
    });
    channels
}

/// Channels with a message inside the spike lookback window.
pub fn active_channel_count(state: &WorldState, config: &ContextConfig, now: f64) -> usize {
    let since = now - config.spike_window_secs;
    state
        .channels()
        .filter(|c| c.last_activity().is_some_and(|t| t >= since))
        .count()
}

/// Whether more channels than the configured threshold are active at once.
pub fn is_activity_spike(state: &WorldState, config: &ContextConfig, now: f64) -> bool {
    active_channel_count(state, config, now) > config.spike_channel_threshold
}
