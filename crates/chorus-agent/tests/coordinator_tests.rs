// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the processing coordinator and schedulers.

use std::sync::Arc;
use std::time::Duration;

use chorus_agent::{ActionScheduler, CoordinatorState, CycleReport, EnqueueOutcome};
use chorus_config::model::{RateLimitConfig, SchedulerConfig, WorldConfig};
use chorus_core::traits::OutboundAction;
use chorus_core::types::{ActionStatus, ChannelStatus, ChannelType};
use chorus_ratelimit::RateLimiter;
use chorus_test_utils::fixtures::{cast_series, matrix_message};
use chorus_test_utils::{MockSender, TestHarness};
use chorus_world::WorldStateStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn marks_before_wake_coalesce_into_one_cycle() {
    let harness = TestHarness::builder().build();
    for i in 0..5 {
        harness.coordinator.mark_stale("new_message", Some(serde_json::json!({ "n": i })));
    }
    harness.start().await;

    assert!(harness.processor.wait_for_calls(1, WAIT).await);
    // Several interval timeouts pass with the flag cleared.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(harness.processor.call_count(), 1);

    let requests = harness.processor.requests().await;
    assert_eq!(requests[0].cycle_id, 1);
    assert!(requests[0].primary_channel.is_none());
    assert_eq!(requests[0].trigger.as_deref(), Some("new_message"));
    harness.shutdown().await;
}

#[tokio::test]
async fn wake_during_cycle_is_dropped_then_picked_up_on_timeout() {
    let harness = TestHarness::builder().gated().build();
    harness.start().await;
    harness.coordinator.mark_stale("first", None);
    assert!(harness.processor.wait_for_calls(1, WAIT).await);

    harness.coordinator.mark_stale("second", None);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.processor.call_count(), 1);
    let status = harness.coordinator.processing_status();
    assert!(status.stale);
    assert!(status.locked);
    assert_eq!(status.state, CoordinatorState::CycleRunning);

    harness.processor.release();
    assert!(harness.processor.wait_for_calls(2, WAIT).await);
    assert_eq!(harness.processor.max_concurrency(), 1);
    harness.shutdown().await;
}

#[tokio::test]
async fn cycle_failures_are_counted_and_loop_survives() {
    let harness = TestHarness::builder().failing("engine down").build();
    harness.start().await;
    harness.coordinator.mark_stale("new_message", None);
    assert!(harness.processor.wait_for_calls(1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let status = harness.coordinator.processing_status();
    assert_eq!(status.processing_errors, 1);
    assert!(status.running);

    harness.coordinator.mark_stale("retry", None);
    assert!(harness.processor.wait_for_calls(2, WAIT).await);
    harness.shutdown().await;
}

#[tokio::test]
async fn stop_waits_for_running_cycle() {
    let harness = TestHarness::builder().gated().build();
    harness.start().await;
    harness.coordinator.mark_stale("new_message", None);
    assert!(harness.processor.wait_for_calls(1, WAIT).await);

    let processor = Arc::clone(&harness.processor);
    let releaser = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        processor.release();
    });
    harness.coordinator.stop().await;
    releaser.await.unwrap();

    assert_eq!(harness.processor.in_flight(), 0);
    let status = harness.coordinator.processing_status();
    assert_eq!(status.state, CoordinatorState::Stopped);
    assert!(!status.running);
    assert!(!status.locked);
}

#[tokio::test]
async fn messages_added_after_start_trigger_cycles() {
    let harness = TestHarness::builder().build();
    harness.start().await;
    let accepted = harness.add_messages(cast_series("0x", "C1", 3, 100.0)).await;
    assert_eq!(accepted, 3);
    assert!(harness.processor.wait_for_calls(1, WAIT).await);
    let requests = harness.processor.requests().await;
    assert_eq!(requests[0].trigger.as_deref(), Some("new_message"));
    harness.shutdown().await;
}

#[tokio::test]
async fn retention_reaps_departed_channels_before_cycle() {
    let mut config = chorus_config::model::ChorusConfig::default();
    config.world.channel_retention_secs = Some(60);
    let harness = TestHarness::builder().with_config(config).build();

    harness
        .add_messages(vec![matrix_message("$1", "!old:example.org", "alice", "bye", 1.0)])
        .await;
    harness
        .store
        .update_channel_status("!old:example.org", ChannelType::Matrix, ChannelStatus::LeftByBot, None, 1.0)
        .await;

    let report = harness.coordinator.force_cycle().await;
    assert!(matches!(report, Some(CycleReport::Completed { .. })));
    assert_eq!(harness.store.read().await.channel_count(), 0);
}

#[tokio::test]
async fn scheduler_sends_and_resolves_correlation() {
    let store = Arc::new(WorldStateStore::new(&WorldConfig::default()));
    let limiter = Arc::new(Mutex::new(RateLimiter::new(&RateLimitConfig::default())));
    let sender = Arc::new(MockSender::new(ChannelType::Farcaster));
    let config = SchedulerConfig {
        queue_capacity: 10,
        min_send_interval_ms: 1,
    };
    let scheduler = Arc::new(ActionScheduler::new(sender.clone(), store.clone(), limiter, &config));
    let cancel = CancellationToken::new();
    let task = tokio::spawn(Arc::clone(&scheduler).run(cancel.clone()));

    let reply = OutboundAction::new("send_reply")
        .in_channel("C1")
        .targeting("0xparent")
        .with_content("gm!");
    let EnqueueOutcome::Queued { correlation_id } = scheduler.enqueue(reply.clone()).await else {
        panic!("reply was not queued");
    };

    for _ in 0..200 {
        if !sender.sent().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();
    task.await.unwrap();

    assert_eq!(sender.sent().await, vec![reply]);
    let state = store.read().await;
    assert_eq!(state.actions().len(), 1);
    let record = &state.actions()[0];
    assert_eq!(record.correlation_id.as_deref(), Some(correlation_id.as_str()));
    assert_eq!(record.result, ActionStatus::Success);
    assert_eq!(record.parameters["target_id"], "0xparent");
}
