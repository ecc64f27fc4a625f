// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-zero buffer
//! bounds, sane rate windows, known platform names and log levels.

use std::str::FromStr;

use chorus_core::ChannelType;

use crate::diagnostic::{ConfigError, suggest_key};
use crate::model::ChorusConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const PLATFORMS: &[&str] = &["matrix", "farcaster"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &ChorusConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.name.trim().is_empty() {
        errors.push(validation("agent.name must not be empty".into()));
    }

    let level = config.agent.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::UnknownName {
            key: "agent.log_level".into(),
            kind: "log level".into(),
            suggestion: suggest_key(&level, LOG_LEVELS),
            name: config.agent.log_level.clone(),
            valid: LOG_LEVELS.join(", "),
        });
    }

    let world = &config.world;
    for (key, value) in [
        ("world.max_messages_per_channel", world.max_messages_per_channel),
        ("world.max_action_history", world.max_action_history),
        ("world.max_seen_message_ids", world.max_seen_message_ids),
        ("world.max_thread_messages", world.max_thread_messages),
        ("world.max_memories_per_user", world.max_memories_per_user),
        ("world.max_tool_cache_entries", world.max_tool_cache_entries),
        ("world.max_search_cache_entries", world.max_search_cache_entries),
        ("world.max_media_items", world.max_media_items),
        ("context.max_text_length", config.context.max_text_length),
        ("context.max_collection_items", config.context.max_collection_items),
        ("context.node_mode_token_threshold", config.context.node_mode_token_threshold),
        ("context.failsafe_channel_count", config.context.failsafe_channel_count),
        ("context.node_messages_per_channel", config.context.node_messages_per_channel),
        ("rate_limit.max_cycles_per_hour", config.rate_limit.max_cycles_per_hour),
        ("rate_limit.max_burst_cycles", config.rate_limit.max_burst_cycles),
        ("scheduler.queue_capacity", config.scheduler.queue_capacity),
    ] {
        if value == 0 {
            errors.push(validation(format!("{key} must be at least 1")));
        }
    }

    let rate = &config.rate_limit;
    if rate.base_interval_secs.is_nan() || rate.base_interval_secs <= 0.0 {
        errors.push(validation(format!(
            "rate_limit.base_interval_secs must be positive, got {}",
            rate.base_interval_secs
        )));
    }
    if rate.burst_window_secs.is_nan()
        || rate.burst_window_secs <= 0.0
        || rate.burst_window_secs > 3600.0
    {
        errors.push(validation(format!(
            "rate_limit.burst_window_secs must be in (0, 3600], got {}",
            rate.burst_window_secs
        )));
    }
    if !(1.0..=3.0).contains(&rate.cooldown_multiplier) {
        errors.push(validation(format!(
            "rate_limit.cooldown_multiplier must be between 1.0 and 3.0, got {}",
            rate.cooldown_multiplier
        )));
    }

    for name in rate.channel_type_limits.keys() {
        if ChannelType::from_str(name).is_err() {
            errors.push(ConfigError::UnknownName {
                key: "rate_limit.channel_type_limits".into(),
                kind: "platform".into(),
                name: name.clone(),
                suggestion: suggest_key(name, PLATFORMS),
                valid: PLATFORMS.join(", "),
            });
        }
    }

    let context = &config.context;
    if context.spike_window_secs < 0.0 {
        errors.push(validation(format!(
            "context.spike_window_secs must be non-negative, got {}",
            context.spike_window_secs
        )));
    }
    if context.spike_max_detailed_channels > context.max_detailed_channels {
        errors.push(validation(format!(
            "context.spike_max_detailed_channels ({}) must not exceed context.max_detailed_channels ({})",
            context.spike_max_detailed_channels, context.max_detailed_channels
        )));
    }

    if config.processing.cycle_interval_ms == 0 {
        errors.push(validation(
            "processing.cycle_interval_ms must be at least 1".into(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
