// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; the core installs no recorder, so every call
//! is a no-op until the embedding process installs one.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Chorus metric descriptions.
///
/// Called once at startup after a recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "chorus_messages_total",
        "Messages offered to the world-state store, by platform and outcome"
    );
    describe_counter!("chorus_cycles_total", "Decision cycles, by outcome");
    describe_counter!(
        "chorus_rate_limit_denials_total",
        "Rate limiter denials, by category"
    );
    describe_counter!("chorus_actions_total", "Outbound actions, by type and result");
    describe_gauge!("chorus_world_channels", "Channels held by the world-state store");
    describe_histogram!(
        "chorus_payload_bytes",
        "Serialized payload size handed to the decision engine"
    );
    describe_histogram!("chorus_cycle_duration_seconds", "Decision cycle duration");
}

/// Record a message offered to the store.
pub fn record_message(platform: &str, accepted: bool) {
    let outcome = if accepted { "accepted" } else { "duplicate" };
    metrics::counter!("chorus_messages_total", "platform" => platform.to_string(), "outcome" => outcome)
        .increment(1);
}

/// Record a finished (or refused) decision cycle.
pub fn record_cycle(outcome: &'static str) {
    metrics::counter!("chorus_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limit_denial(category: &'static str) {
    metrics::counter!("chorus_rate_limit_denials_total", "category" => category).increment(1);
}

pub fn record_action(action_type: &str, result: &str) {
    metrics::counter!(
        "chorus_actions_total",
        "type" => action_type.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}

pub fn set_channel_count(count: usize) {
    metrics::gauge!("chorus_world_channels").set(count as f64);
}

pub fn record_payload_bytes(bytes: usize) {
    metrics::histogram!("chorus_payload_bytes").record(bytes as f64);
}

pub fn record_cycle_duration(seconds: f64) {
    metrics::histogram!("chorus_cycle_duration_seconds").record(seconds);
}
