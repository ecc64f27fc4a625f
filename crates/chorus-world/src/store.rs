// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared async handle over [`WorldState`].
//!
//! Every mutating call takes the write lock once, applies one local
//! mutation, and raises the stale signal when a platform-visible change
//! happened. Agent bookkeeping (action records, caches, goals) does not
//! raise the signal, so a cycle never re-triggers itself.

use std::sync::Arc;

use chorus_config::model::WorldConfig;
use chorus_core::recording;
use chorus_core::types::{
    ActionStatus, ChannelMetadata, ChannelStatus, ChannelType, Goal, GoalStatus, MediaItem,
    MemoryEntry, Message, Metadata, WorldMetrics,
};
use chorus_core::StaleSignal;
use serde_json::json;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::state::WorldState;

/// The process-wide world-state store, passed around by `Arc`.
#[derive(Debug)]
pub struct WorldStateStore {
    state: RwLock<WorldState>,
    signal: Arc<StaleSignal>,
}

impl Default for WorldStateStore {
    fn default() -> Self {
        Self::new(&WorldConfig::default())
    }
}

impl WorldStateStore {
    /// Create an empty store with its own stale signal.
    pub fn new(config: &WorldConfig) -> Self {
        Self::with_signal(config, Arc::new(StaleSignal::new()))
    }

    /// Create an empty store that raises an existing signal.
    pub fn with_signal(config: &WorldConfig, signal: Arc<StaleSignal>) -> Self {
        Self {
            state: RwLock::new(WorldState::new(config)),
            signal,
        }
    }

    /// The stale signal this store raises.
    pub fn signal(&self) -> Arc<StaleSignal> {
        Arc::clone(&self.signal)
    }

    /// Raise the stale signal directly (e.g. for an external trigger).
    pub fn mark_stale(&self, reason: &str, details: Option<serde_json::Value>) {
        self.signal.mark(reason, details);
    }

    /// Read access for view builders. Hold the guard only while rendering.
    pub async fn read(&self) -> RwLockReadGuard<'_, WorldState> {
        self.state.read().await
    }

    /// Owned copy of the current state.
    pub async fn snapshot(&self) -> WorldState {
        self.state.read().await.clone()
    }

    pub async fn add_message(&self, channel_id: &str, message: Message) -> bool {
        let platform = message.channel_type;
        let message_id = message.id.clone();
        let (accepted, channel_count) = {
            let mut state = self.state.write().await;
            let accepted = state.add_message(channel_id, message);
            (accepted, state.channel_count())
        };

        recording::record_message(&platform.to_string(), accepted);
        if accepted {
            recording::set_channel_count(channel_count);
            debug!(%message_id, channel_id, %platform, "message accepted");
            self.signal.mark(
                "new_message",
                Some(json!({ "channel_id": channel_id, "message_id": message_id })),
            );
        }
        accepted
    }

    pub async fn add_channel(
        &self,
        channel_id: &str,
        channel_type: ChannelType,
        name: &str,
        now: f64,
    ) -> bool {
        let created = self
            .state
            .write()
            .await
            .add_channel(channel_id, channel_type, name, now);
        if created {
            info!(channel_id, platform = %channel_type, name, "channel registered");
        }
        self.signal
            .mark("channel_updated", Some(json!({ "channel_id": channel_id })));
        created
    }

    pub async fn update_channel_status(
        &self,
        channel_id: &str,
        channel_type: ChannelType,
        status: ChannelStatus,
        display_name: Option<&str>,
        now: f64,
    ) -> bool {
        let changed = self.state.write().await.update_channel_status(
            channel_id,
            channel_type,
            status,
            display_name,
            now,
        );
        if changed {
            info!(channel_id, platform = %channel_type, %status, "channel status updated");
            self.signal.mark(
                "channel_status",
                Some(json!({ "channel_id": channel_id, "status": status.to_string() })),
            );
        }
        changed
    }

    pub async fn update_channel_metadata(
        &self,
        channel_id: &str,
        channel_type: ChannelType,
        metadata: ChannelMetadata,
    ) -> bool {
        let updated = self
            .state
            .write()
            .await
            .update_channel_metadata(channel_id, channel_type, metadata);
        if updated {
            self.signal
                .mark("channel_updated", Some(json!({ "channel_id": channel_id })));
        }
        updated
    }

    pub async fn mark_channel_checked(
        &self,
        channel_id: &str,
        channel_type: ChannelType,
        now: f64,
    ) -> bool {
        self.state
            .write()
            .await
            .mark_channel_checked(channel_id, channel_type, now)
    }

    pub async fn reap_inactive_channels(
        &self,
        now: f64,
        retention_secs: f64,
    ) -> Vec<(ChannelType, String)> {
        let reaped = self
            .state
            .write()
            .await
            .reap_inactive_channels(now, retention_secs);
        for (platform, channel_id) in &reaped {
            info!(%channel_id, %platform, "inactive channel reaped");
        }
        reaped
    }

    pub async fn record_action(
        &self,
        action_type: &str,
        parameters: Metadata,
        result: ActionStatus,
        correlation_id: Option<String>,
    ) {
        debug!(action_type, %result, ?correlation_id, "action recorded");
        recording::record_action(action_type, &result.to_string());
        self.state
            .write()
            .await
            .record_action(action_type, parameters, result, correlation_id);
    }

    pub async fn update_action_result(&self, correlation_id: &str, result: ActionStatus) -> bool {
        self.state
            .write()
            .await
            .update_action_result(correlation_id, result)
    }

    pub async fn has_successful_action(
        &self,
        action_type: &str,
        parameter: &str,
        value: &serde_json::Value,
    ) -> bool {
        self.state
            .read()
            .await
            .has_successful_action(action_type, parameter, value)
    }

    pub async fn has_pending_action(
        &self,
        action_type: &str,
        parameter: &str,
        value: &serde_json::Value,
    ) -> bool {
        self.state
            .read()
            .await
            .has_pending_action(action_type, parameter, value)
    }

    pub async fn set_user_sentiment(
        &self,
        platform: ChannelType,
        user_key: &str,
        label: &str,
        score: f64,
        now: f64,
    ) -> bool {
        self.state
            .write()
            .await
            .set_user_sentiment(platform, user_key, label, score, now)
    }

    pub async fn add_user_memory(&self, platform: ChannelType, user_key: &str, entry: MemoryEntry) {
        self.state
            .write()
            .await
            .add_user_memory(platform, user_key, entry);
    }

    pub async fn cache_tool_result(
        &self,
        tool_name: &str,
        cache_key: &str,
        value: serde_json::Value,
        now: f64,
    ) {
        self.state
            .write()
            .await
            .cache_tool_result(tool_name, cache_key, value, now);
    }

    pub async fn record_search(
        &self,
        query: &str,
        platform: Option<ChannelType>,
        results: serde_json::Value,
        now: f64,
    ) {
        self.state
            .write()
            .await
            .record_search(query, platform, results, now);
    }

    pub async fn add_media(&self, item: MediaItem) -> bool {
        self.state.write().await.add_media(item)
    }

    pub async fn add_goal(&self, goal: Goal) -> bool {
        self.state.write().await.add_goal(goal)
    }

    pub async fn update_goal(
        &self,
        goal_id: &str,
        status: Option<GoalStatus>,
        progress_note: Option<String>,
        now: f64,
    ) -> bool {
        self.state
            .write()
            .await
            .update_goal(goal_id, status, progress_note, now)
    }

    pub async fn get_metrics(&self, now: f64) -> WorldMetrics {
        self.state.read().await.get_metrics(now)
    }
}

#[cfg(test)]
mod tests {
    use chorus_core::types::SenderInfo;

    use super::*;

    fn farcaster(id: &str) -> Message {
        Message::new(id, "C1", ChannelType::Farcaster, SenderInfo::new("fid:1"), "gm", 1.0)
    }

    #[tokio::test]
    async fn accepted_message_marks_stale() {
        let store = WorldStateStore::default();
        let signal = store.signal();
        assert!(store.add_message("C1", farcaster("m1")).await);
        assert!(signal.is_stale());
        assert_eq!(signal.last_mark().unwrap().reason, "new_message");
    }

    #[tokio::test]
    async fn duplicate_does_not_mark_stale() {
        let store = WorldStateStore::default();
        let signal = store.signal();
        store.add_message("C1", farcaster("m1")).await;
        signal.clear();
        assert!(!store.add_message("C1", farcaster("m1")).await);
        assert!(!signal.is_stale());
    }

    #[tokio::test]
    async fn action_records_do_not_mark_stale() {
        let store = WorldStateStore::default();
        store
            .record_action("like_post", Metadata::new(), ActionStatus::Success, None)
            .await;
        assert!(!store.signal().is_stale());
        assert_eq!(store.get_metrics(0.0).await.action_count, 1);
    }
}
