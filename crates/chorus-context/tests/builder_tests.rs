// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for payload building across both views.

use std::sync::Arc;

use chorus_config::model::ContextConfig;
use chorus_context::{ContextPayloadBuilder, InMemoryNodeDirectory, PayloadMode};
use chorus_core::traits::NodeDirectory;
use chorus_core::types::{ChannelType, Message, SenderInfo};
use chorus_world::WorldState;
use proptest::prelude::*;

fn cast(id: &str, channel: &str, text: &str, ts: f64) -> Message {
    let mut sender = SenderInfo::new("fid:42");
    sender.user_id = Some(42);
    sender.username = Some("alice".into());
    Message::new(id, channel, ChannelType::Farcaster, sender, text, ts)
}

fn room_message(id: &str, room: &str, text: &str, ts: f64) -> Message {
    Message::new(id, room, ChannelType::Matrix, SenderInfo::new("@bob:example.org"), text, ts)
}

fn mixed_state() -> WorldState {
    let mut state = WorldState::default();
    for i in 0..5 {
        state.add_message("C1", cast(&format!("0xc{i}"), "C1", &format!("cast {i}"), 100.0 + i as f64));
    }
    for i in 0..3 {
        state.add_message(
            "!lobby:example.org",
            room_message(&format!("$e{i}"), "!lobby:example.org", "hello", 200.0 + i as f64),
        );
    }
    state
}

#[test]
fn all_collapsed_directory_still_shows_messages() {
    let state = mixed_state();
    let directory = Arc::new(InMemoryNodeDirectory::default());
    directory.expand("channels/farcaster/C1/recent_messages", 1.0);
    directory.collapse("channels/farcaster/C1/recent_messages");
    directory.set_summary("system/status", "nothing to see");

    let builder = ContextPayloadBuilder::default().with_directory(directory.clone());
    let built = builder.build_node_view(&state, 300.0);

    assert_eq!(built.mode, PayloadMode::Node);
    assert!(built.stats.failsafe_applied);
    let nodes = built.payload["nodes"].as_array().unwrap();
    let with_messages = nodes
        .iter()
        .filter(|n| n["expanded"] == true)
        .filter(|n| {
            n["data"]["messages"]
                .as_array()
                .is_some_and(|m| !m.is_empty())
        })
        .count();
    assert!(with_messages >= 1);

    // The render does not write back into the directory.
    assert!(directory.expanded_paths().is_empty());
}

#[test]
fn flat_view_is_idempotent_for_unchanged_state() {
    let state = mixed_state();
    let builder = ContextPayloadBuilder::default();
    let first = builder.build_full_view(&state, None, 300.0);
    let second = builder.build_full_view(&state, None, 300.0);
    assert_eq!(first.payload["channels"], second.payload["channels"]);
    assert_eq!(first.payload, second.payload);
}

#[test]
fn farcaster_channel_ranks_first_within_boost() {
    let state = mixed_state();
    let built = ContextPayloadBuilder::default().build_full_view(&state, None, 300.0);
    let detailed = built.payload["channels"]["detailed"].as_array().unwrap();
    assert_eq!(detailed[0]["id"], "C1");
    assert_eq!(built.payload["primary_channel"], "C1");
    let texts: Vec<&str> = detailed[0]["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["cast 0", "cast 1", "cast 2", "cast 3", "cast 4"]);
}

#[test]
fn build_switches_to_node_view_over_threshold() {
    let state = mixed_state();
    let small = ContextPayloadBuilder::default().build(&state, None, 300.0);
    assert_eq!(small.mode, PayloadMode::Full);
    assert_eq!(small.payload["mode"], "full");

    let tight = ContextPayloadBuilder::new(ContextConfig {
        node_mode_token_threshold: 10,
        ..ContextConfig::default()
    });
    let big = tight.build(&state, None, 300.0);
    assert_eq!(big.mode, PayloadMode::Node);
    assert_eq!(big.payload["payload_stats"]["mode"], "node");
}

#[test]
fn expanded_directory_nodes_render_data() {
    let state = mixed_state();
    let directory = Arc::new(InMemoryNodeDirectory::default());
    directory.expand("channels/matrix/!lobby:example.org/recent_messages", 1.0);
    directory.expand("users/farcaster/42", 2.0);
    directory.expand("threads/does-not-exist", 3.0);

    let builder = ContextPayloadBuilder::default().with_directory(directory);
    let built = builder.build_node_view(&state, 300.0);

    assert!(!built.stats.failsafe_applied);
    assert_eq!(built.stats.message_count, 3);
    let user = built.payload["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["path"] == "users/farcaster/42")
        .unwrap();
    assert_eq!(user["data"]["username"], "alice");
    assert_eq!(user["data"]["message_count"], 5);
}

#[test]
fn estimate_tracks_rendered_size() {
    let state = mixed_state();
    let builder = ContextPayloadBuilder::default();
    let estimate = builder.estimate_payload_size(&state);
    let built = builder.build_full_view(&state, None, 300.0);
    let ratio = estimate.estimated_bytes as f64 / built.stats.size_bytes as f64;
    assert!((0.25..4.0).contains(&ratio), "ratio {ratio}");
}

proptest! {
    #[test]
    fn flat_view_respects_detail_limits(
        channels in 1usize..15,
        per_channel in 1usize..30,
        max_detailed in 1usize..6,
        per_detailed in 1usize..12,
    ) {
        let mut state = WorldState::default();
        for c in 0..channels {
            let room = format!("!r{c}:x");
            for m in 0..per_channel {
                let ts = (c * 100 + m) as f64;
                state.add_message(&room, room_message(&format!("{c}-{m}"), &room, "x", ts));
            }
        }
        let config = ContextConfig {
            max_detailed_channels: max_detailed,
            messages_per_channel: per_detailed,
            spike_channel_threshold: usize::MAX,
            ..ContextConfig::default()
        };
        let built = ContextPayloadBuilder::new(config).build_full_view(&state, None, 5000.0);
        prop_assert!(built.stats.detailed_channels <= max_detailed);
        prop_assert_eq!(built.stats.detailed_channels + built.stats.summarized_channels, channels);
        prop_assert!(built.stats.message_count <= max_detailed * per_detailed);
    }
}
