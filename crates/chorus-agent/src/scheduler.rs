// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-platform outbound action scheduler.
//!
//! A bounded FIFO drained by one loop, one send per minimum interval. Each
//! accepted action is recorded as `scheduled` under a fresh correlation id
//! and later updated to `success`, `failure` or `skipped` (rate limited).

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chorus_config::model::SchedulerConfig;
use chorus_core::recording;
use chorus_core::traits::{ActionSender, OutboundAction};
use chorus_core::types::{ActionStatus, ChannelType, now_secs};
use chorus_ratelimit::RateLimiter;
use chorus_world::WorldStateStore;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of [`ActionScheduler::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued { correlation_id: String },
    /// Same action type and target already queued or awaiting its result.
    Duplicate,
    /// The store already records a successful action of this type on the
    /// same target.
    AlreadyDone,
    QueueFull,
}

#[derive(Debug, Clone)]
struct QueuedAction {
    action: OutboundAction,
    dedup_key: String,
    correlation_id: String,
}

#[derive(Debug, Default)]
struct Queue {
    items: VecDeque<QueuedAction>,
    keys: HashSet<String>,
}

/// Counters exposed by [`ActionScheduler::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub queued: usize,
    pub sent: u64,
    pub failed: u64,
    pub skipped: u64,
}

pub struct ActionScheduler {
    sender: Arc<dyn ActionSender>,
    store: Arc<WorldStateStore>,
    limiter: Arc<Mutex<RateLimiter>>,
    queue: Mutex<Queue>,
    capacity: usize,
    min_interval: Duration,
    notify: Notify,
    sent: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

impl ActionScheduler {
    pub fn new(
        sender: Arc<dyn ActionSender>,
        store: Arc<WorldStateStore>,
        limiter: Arc<Mutex<RateLimiter>>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            sender,
            store,
            limiter,
            queue: Mutex::new(Queue::default()),
            capacity: config.queue_capacity,
            min_interval: Duration::from_millis(config.min_send_interval_ms),
            notify: Notify::new(),
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    pub fn platform(&self) -> ChannelType {
        self.sender.platform()
    }

    /// Queue `action` for sending.
    pub async fn enqueue(&self, action: OutboundAction) -> EnqueueOutcome {
        let dedup_key = action.dedup_key();
        let mut queue = self.queue.lock().await;

        if queue.keys.contains(&dedup_key) || self.awaiting_result(&action).await {
            debug!(key = %dedup_key, "duplicate outbound action suppressed");
            return EnqueueOutcome::Duplicate;
        }
        if self.already_succeeded(&action).await {
            debug!(key = %dedup_key, "outbound action already succeeded, suppressed");
            return EnqueueOutcome::AlreadyDone;
        }
        if queue.items.len() >= self.capacity {
            warn!(
                platform = %self.platform(),
                capacity = self.capacity,
                action_type = %action.action_type,
                "outbound queue full, dropping action"
            );
            return EnqueueOutcome::QueueFull;
        }

        let correlation_id = Uuid::new_v4().to_string();
        self.store
            .record_action(
                &action.action_type,
                action.record_parameters(),
                ActionStatus::Scheduled,
                Some(correlation_id.clone()),
            )
            .await;

        queue.keys.insert(dedup_key.clone());
        queue.items.push_back(QueuedAction {
            action,
            dedup_key,
            correlation_id: correlation_id.clone(),
        });
        drop(queue);
        self.notify.notify_one();

        EnqueueOutcome::Queued { correlation_id }
    }

    /// Whether the store still holds a `scheduled` record for the same
    /// target, e.g. one popped from the queue and currently being sent.
    async fn awaiting_result(&self, action: &OutboundAction) -> bool {
        match &action.target_id {
            Some(target) => {
                self.store
                    .has_pending_action(&action.action_type, "target_id", &Value::from(target.as_str()))
                    .await
            }
            None => false,
        }
    }

    /// Whether the store records a successful action of the same type on
    /// the same target.
    async fn already_succeeded(&self, action: &OutboundAction) -> bool {
        match &action.target_id {
            Some(target) => {
                self.store
                    .has_successful_action(&action.action_type, "target_id", &Value::from(target.as_str()))
                    .await
            }
            None => false,
        }
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.items.len()
    }

    pub async fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            queued: self.queue_len().await,
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }

    /// Drain the queue until `cancel` fires. A send already in progress is
    /// finished and recorded before the loop exits.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(platform = %self.platform(), "action scheduler running");
        loop {
            let next = self.pop().await;
            match next {
                Some(item) => {
                    self.dispatch(item).await;
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.min_interval) => {}
                    }
                }
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.notify.notified() => {}
                    }
                }
            }
        }
        let remaining = self.queue_len().await;
        info!(platform = %self.platform(), remaining, "action scheduler stopped");
    }

    async fn pop(&self) -> Option<QueuedAction> {
        let mut queue = self.queue.lock().await;
        let item = queue.items.pop_front()?;
        queue.keys.remove(&item.dedup_key);
        Some(item)
    }

    /// Send one item now, bypassing the interval.
    async fn dispatch(&self, item: QueuedAction) {
        let QueuedAction {
            action,
            correlation_id,
            ..
        } = item;
        let platform = self.platform();
        let now = now_secs();

        {
            let mut limiter = self.limiter.lock().await;
            let mut decision = limiter.can_execute_action(&action.action_type, now);
            if decision.allowed
                && let Some(channel_id) = &action.channel_id
            {
                decision = limiter.can_send_to_channel(channel_id, platform, now);
            }
            if !decision.allowed {
                info!(
                    action_type = %action.action_type,
                    %correlation_id,
                    reason = %decision.describe(),
                    "outbound action rate limited, skipping"
                );
                self.skipped.fetch_add(1, Ordering::Relaxed);
                self.store
                    .update_action_result(&correlation_id, ActionStatus::Skipped)
                    .await;
                return;
            }
        }

        match self.sender.send(&action).await {
            Ok(receipt) => {
                {
                    let mut limiter = self.limiter.lock().await;
                    limiter.record_action(&action.action_type, now);
                    if let Some(channel_id) = &action.channel_id {
                        limiter.record_channel_send(channel_id, platform, now);
                    }
                }
                self.sent.fetch_add(1, Ordering::Relaxed);
                recording::record_action(&action.action_type, "success");
                self.store
                    .update_action_result(&correlation_id, ActionStatus::Success)
                    .await;
                debug!(
                    action_type = %action.action_type,
                    %correlation_id,
                    platform_id = ?receipt.platform_id,
                    "outbound action sent"
                );
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                recording::record_action(&action.action_type, "failure");
                self.store
                    .update_action_result(&correlation_id, ActionStatus::Failure)
                    .await;
                warn!(
                    action_type = %action.action_type,
                    %correlation_id,
                    error = %e,
                    "outbound action failed"
                );
            }
        }
    }
}
