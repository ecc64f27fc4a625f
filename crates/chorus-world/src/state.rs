// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plain world-state data structure.
//!
//! `WorldState` is synchronous and owns no locks or signals; every
//! operation is a single local mutation that keeps its own bounds. The
//! shared async handle lives in [`crate::store`].

use std::collections::{BTreeMap, HashSet, VecDeque};

use chorus_config::model::WorldConfig;
use chorus_core::types::{
    ActionRecord, ActionStatus, Channel, ChannelMetadata, ChannelStatus, ChannelType, Goal,
    GoalStatus, MediaItem, MemoryEntry, Message, Metadata, SearchCacheEntry, Sentiment,
    ToolCacheEntry, UserProfile, WorldMetrics, now_secs,
};
use tracing::{debug, warn};

/// Seconds considered "recent" by the active-channel metric.
const ACTIVE_WINDOW_SECS: f64 = 3600.0;

/// Key of per-user state: platform plus the sender's stable key.
pub type UserKey = (ChannelType, String);

/// Channels, messages, threads, action history and supplementary agent
/// state, all bounded.
#[derive(Debug, Clone)]
pub struct WorldState {
    limits: WorldConfig,
    channels: BTreeMap<ChannelType, BTreeMap<String, Channel>>,
    /// Ids of buffered messages plus recently retired ones.
    seen_ids: HashSet<String>,
    /// Retired ids only, oldest first. Buffered ids are never evicted.
    seen_order: VecDeque<String>,
    threads: BTreeMap<String, VecDeque<Message>>,
    actions: VecDeque<ActionRecord>,
    users: BTreeMap<UserKey, UserProfile>,
    memories: BTreeMap<UserKey, VecDeque<MemoryEntry>>,
    tool_cache: VecDeque<ToolCacheEntry>,
    search_cache: VecDeque<SearchCacheEntry>,
    media: VecDeque<MediaItem>,
    goals: BTreeMap<String, Goal>,
    last_update: f64,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(&WorldConfig::default())
    }
}

impl WorldState {
    /// Create an empty world state with the given bounds.
    pub fn new(limits: &WorldConfig) -> Self {
        Self {
            limits: limits.clone(),
            channels: BTreeMap::new(),
            seen_ids: HashSet::new(),
            seen_order: VecDeque::new(),
            threads: BTreeMap::new(),
            actions: VecDeque::new(),
            users: BTreeMap::new(),
            memories: BTreeMap::new(),
            tool_cache: VecDeque::new(),
            search_cache: VecDeque::new(),
            media: VecDeque::new(),
            goals: BTreeMap::new(),
            last_update: 0.0,
        }
    }

    /// Buffer and retention limits this state was built with.
    pub fn limits(&self) -> &WorldConfig {
        &self.limits
    }

    // --- messages and channels -------------------------------------------

    /// Append a message to `channel_id`, creating the channel if needed.
    ///
    /// Returns `false` without touching anything if the message id has been
    /// seen before, through any channel.
    pub fn add_message(&mut self, channel_id: &str, mut message: Message) -> bool {
        if self.seen_ids.contains(&message.id) {
            debug!(
                message_id = %message.id,
                channel_id,
                "duplicate message ignored"
            );
            return false;
        }
        self.seen_ids.insert(message.id.clone());

        message.channel_id = channel_id.to_string();
        let channel_type = message.channel_type;
        let timestamp = message.timestamp;

        if channel_type.uses_reply_threads() {
            let thread = self
                .threads
                .entry(message.thread_root().to_string())
                .or_default();
            thread.push_back(message.clone());
            while thread.len() > self.limits.max_thread_messages {
                thread.pop_front();
            }
        }

        self.touch_user(&message);
        self.collect_media(&message);

        let max_messages = self.limits.max_messages_per_channel;
        let channel = self
            .channels
            .entry(channel_type)
            .or_default()
            .entry(channel_id.to_string())
            .or_insert_with(|| Channel::new(channel_id, channel_type, channel_id, timestamp));
        channel.messages.push_back(message);

        let mut evicted = Vec::new();
        while channel.messages.len() > max_messages {
            if let Some(old) = channel.messages.pop_front() {
                evicted.push(old);
            }
        }
        for old in &evicted {
            self.forget_thread_member(old);
            self.retire_id(&old.id);
        }

        self.last_update = now_secs();
        true
    }

    /// Move an id that left every buffer into the bounded retired FIFO.
    fn retire_id(&mut self, id: &str) {
        self.seen_order.push_back(id.to_string());
        while self.seen_order.len() > self.limits.max_seen_message_ids {
            if let Some(old) = self.seen_order.pop_front() {
                self.seen_ids.remove(&old);
            }
        }
    }

    /// Drop an evicted message from its thread; drop the thread once empty.
    fn forget_thread_member(&mut self, evicted: &Message) {
        let root = evicted.thread_root();
        if let Some(thread) = self.threads.get_mut(root) {
            thread.retain(|m| m.id != evicted.id);
            if thread.is_empty() {
                self.threads.remove(root);
            }
        }
    }

    fn touch_user(&mut self, message: &Message) {
        let sender = &message.sender;
        let key = (message.channel_type, sender.key());
        let profile = self
            .users
            .entry(key.clone())
            .or_insert_with(|| UserProfile {
                platform: key.0,
                user_key: key.1,
                username: None,
                display_name: None,
                first_seen: message.timestamp,
                last_seen: message.timestamp,
                message_count: 0,
                sentiment: None,
            });
        if sender.username.is_some() {
            profile.username.clone_from(&sender.username);
        }
        if sender.display_name.is_some() {
            profile.display_name.clone_from(&sender.display_name);
        }
        profile.first_seen = profile.first_seen.min(message.timestamp);
        profile.last_seen = profile.last_seen.max(message.timestamp);
        profile.message_count += 1;
    }

    fn collect_media(&mut self, message: &Message) {
        for url in &message.image_urls {
            self.add_media(MediaItem {
                url: url.clone(),
                media_type: "image".to_string(),
                source_channel_id: Some(message.channel_id.clone()),
                source_message_id: Some(message.id.clone()),
                description: None,
                timestamp: message.timestamp,
            });
        }
    }

    /// Register a channel or update the display name of a known one.
    ///
    /// Returns `true` when the channel was created.
    pub fn add_channel(
        &mut self,
        channel_id: &str,
        channel_type: ChannelType,
        name: &str,
        now: f64,
    ) -> bool {
        let by_id = self.channels.entry(channel_type).or_default();
        self.last_update = now_secs();
        match by_id.get_mut(channel_id) {
            Some(channel) => {
                channel.name = name.to_string();
                false
            }
            None => {
                by_id.insert(
                    channel_id.to_string(),
                    Channel::new(channel_id, channel_type, name, now),
                );
                true
            }
        }
    }

    /// Set a channel's membership status.
    ///
    /// An unknown channel is created only when `display_name` is given;
    /// otherwise the call is a logged no-op. Returns whether anything changed.
    pub fn update_channel_status(
        &mut self,
        channel_id: &str,
        channel_type: ChannelType,
        status: ChannelStatus,
        display_name: Option<&str>,
        now: f64,
    ) -> bool {
        let by_id = self.channels.entry(channel_type).or_default();
        let changed = match by_id.get_mut(channel_id) {
            Some(channel) => {
                if let Some(name) = display_name {
                    channel.name = name.to_string();
                }
                if channel.status == status {
                    display_name.is_some()
                } else {
                    debug!(
                        channel_id,
                        from = %channel.status,
                        to = %status,
                        "channel status changed"
                    );
                    channel.status = status;
                    channel.status_changed_at = now;
                    true
                }
            }
            None => match display_name {
                Some(name) => {
                    let mut channel = Channel::new(channel_id, channel_type, name, now);
                    channel.status = status;
                    by_id.insert(channel_id.to_string(), channel);
                    true
                }
                None => {
                    warn!(
                        channel_id,
                        platform = %channel_type,
                        %status,
                        "status update for unknown channel without a display name, ignoring"
                    );
                    false
                }
            },
        };
        if by_id.is_empty() {
            self.channels.remove(&channel_type);
        }
        if changed {
            self.last_update = now_secs();
        }
        changed
    }

    /// Replace a channel's metadata wholesale. Returns `false` for an
    /// unknown channel; metadata never creates one.
    pub fn update_channel_metadata(
        &mut self,
        channel_id: &str,
        channel_type: ChannelType,
        metadata: ChannelMetadata,
    ) -> bool {
        match self.channel_mut(channel_type, channel_id) {
            Some(channel) => {
                channel.metadata = metadata;
                self.last_update = now_secs();
                true
            }
            None => false,
        }
    }

    /// Record when the agent last looked at a channel. Does not bump
    /// `last_update`.
    pub fn mark_channel_checked(
        &mut self,
        channel_id: &str,
        channel_type: ChannelType,
        now: f64,
    ) -> bool {
        match self.channel_mut(channel_type, channel_id) {
            Some(channel) => {
                channel.last_checked = Some(now);
                true
            }
            None => false,
        }
    }

    /// Remove non-active channels whose status changed more than
    /// `retention_secs` before `now`. Their messages leave the buffers and
    /// threads, but their ids stay in the seen set.
    pub fn reap_inactive_channels(
        &mut self,
        now: f64,
        retention_secs: f64,
    ) -> Vec<(ChannelType, String)> {
        let cutoff = now - retention_secs;
        let mut reaped = Vec::new();
        let mut retired = Vec::new();
        for (channel_type, by_id) in &mut self.channels {
            by_id.retain(|id, channel| {
                let expired = !channel.is_active() && channel.status_changed_at < cutoff;
                if expired {
                    reaped.push((*channel_type, id.clone()));
                    retired.extend(channel.messages.iter().map(|m| m.id.clone()));
                }
                !expired
            });
        }
        self.channels.retain(|_, by_id| !by_id.is_empty());
        for id in &retired {
            self.retire_id(id);
        }

        if !reaped.is_empty() {
            let reaped_ids: HashSet<&str> = reaped.iter().map(|(_, id)| id.as_str()).collect();
            self.threads.retain(|_, thread| {
                thread.retain(|m| !reaped_ids.contains(m.channel_id.as_str()));
                !thread.is_empty()
            });
            debug!(count = reaped.len(), "reaped inactive channels");
            self.last_update = now_secs();
        }
        reaped
    }

    // --- action history --------------------------------------------------

    /// Append an action record, or complete the `scheduled` record carrying
    /// the same correlation id.
    pub fn record_action(
        &mut self,
        action_type: &str,
        parameters: Metadata,
        result: ActionStatus,
        correlation_id: Option<String>,
    ) {
        let timestamp = now_secs();
        if let Some(id) = correlation_id.as_deref()
            && let Some(record) = self.scheduled_record_mut(id)
        {
            record.result = result;
            record.parameters.extend(parameters);
            record.timestamp = timestamp;
            self.last_update = timestamp;
            return;
        }

        self.actions.push_back(ActionRecord {
            action_type: action_type.to_string(),
            parameters,
            result,
            timestamp,
            correlation_id,
        });
        while self.actions.len() > self.limits.max_action_history {
            self.actions.pop_front();
        }
        self.last_update = timestamp;
    }

    /// Move a `scheduled` record to `result`. Returns whether it was found.
    pub fn update_action_result(&mut self, correlation_id: &str, result: ActionStatus) -> bool {
        match self.scheduled_record_mut(correlation_id) {
            Some(record) => {
                record.result = result;
                record.timestamp = now_secs();
                true
            }
            None => {
                debug!(correlation_id, %result, "no scheduled action to update");
                false
            }
        }
    }

    fn scheduled_record_mut(&mut self, correlation_id: &str) -> Option<&mut ActionRecord> {
        self.actions.iter_mut().rev().find(|r| {
            r.result == ActionStatus::Scheduled
                && r.correlation_id.as_deref() == Some(correlation_id)
        })
    }

    /// Whether an action of `action_type` with `parameter == value` already
    /// succeeded. Scheduled, failed and skipped attempts do not count.
    pub fn has_successful_action(
        &self,
        action_type: &str,
        parameter: &str,
        value: &serde_json::Value,
    ) -> bool {
        self.any_action(action_type, parameter, value, ActionStatus::Success)
    }

    /// Whether a matching action is still `scheduled`.
    pub fn has_pending_action(
        &self,
        action_type: &str,
        parameter: &str,
        value: &serde_json::Value,
    ) -> bool {
        self.any_action(action_type, parameter, value, ActionStatus::Scheduled)
    }

    fn any_action(
        &self,
        action_type: &str,
        parameter: &str,
        value: &serde_json::Value,
        status: ActionStatus,
    ) -> bool {
        self.actions.iter().any(|r| {
            r.result == status
                && r.action_type == action_type
                && r.parameters.get(parameter) == Some(value)
        })
    }

    // --- supplementary agent state ---------------------------------------

    /// Attach a sentiment label to a known user profile.
    pub fn set_user_sentiment(
        &mut self,
        platform: ChannelType,
        user_key: &str,
        label: &str,
        score: f64,
        now: f64,
    ) -> bool {
        match self.users.get_mut(&(platform, user_key.to_string())) {
            Some(profile) => {
                profile.sentiment = Some(Sentiment {
                    label: label.to_string(),
                    score,
                    updated_at: now,
                });
                true
            }
            None => false,
        }
    }

    pub fn add_user_memory(&mut self, platform: ChannelType, user_key: &str, entry: MemoryEntry) {
        let bank = self
            .memories
            .entry((platform, user_key.to_string()))
            .or_default();
        bank.push_back(entry);
        while bank.len() > self.limits.max_memories_per_user {
            bank.pop_front();
        }
    }

    /// Cache a tool result, replacing any entry with the same tool and key.
    pub fn cache_tool_result(
        &mut self,
        tool_name: &str,
        cache_key: &str,
        value: serde_json::Value,
        now: f64,
    ) {
        self.tool_cache
            .retain(|e| !(e.tool_name == tool_name && e.cache_key == cache_key));
        self.tool_cache.push_back(ToolCacheEntry {
            tool_name: tool_name.to_string(),
            cache_key: cache_key.to_string(),
            value,
            timestamp: now,
        });
        while self.tool_cache.len() > self.limits.max_tool_cache_entries {
            self.tool_cache.pop_front();
        }
    }

    pub fn cached_tool_result(&self, tool_name: &str, cache_key: &str) -> Option<&ToolCacheEntry> {
        self.tool_cache
            .iter()
            .find(|e| e.tool_name == tool_name && e.cache_key == cache_key)
    }

    pub fn record_search(
        &mut self,
        query: &str,
        platform: Option<ChannelType>,
        results: serde_json::Value,
        now: f64,
    ) {
        self.search_cache.push_back(SearchCacheEntry {
            query: query.to_string(),
            platform,
            results,
            timestamp: now,
        });
        while self.search_cache.len() > self.limits.max_search_cache_entries {
            self.search_cache.pop_front();
        }
    }

    /// Add a media item to the gallery. Returns `false` if the URL is
    /// already present.
    pub fn add_media(&mut self, item: MediaItem) -> bool {
        if self.media.iter().any(|m| m.url == item.url) {
            return false;
        }
        self.media.push_back(item);
        while self.media.len() > self.limits.max_media_items {
            self.media.pop_front();
        }
        true
    }

    /// Returns `false` if a goal with the same id exists.
    pub fn add_goal(&mut self, goal: Goal) -> bool {
        if self.goals.contains_key(&goal.id) {
            return false;
        }
        self.goals.insert(goal.id.clone(), goal);
        true
    }

    pub fn update_goal(
        &mut self,
        goal_id: &str,
        status: Option<GoalStatus>,
        progress_note: Option<String>,
        now: f64,
    ) -> bool {
        let Some(goal) = self.goals.get_mut(goal_id) else {
            return false;
        };
        if let Some(status) = status {
            goal.status = status;
        }
        if let Some(note) = progress_note {
            goal.progress.push(note);
        }
        goal.updated_at = now;
        true
    }

    // --- queries ---------------------------------------------------------

    /// All channels, platform first then channel id.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values().flat_map(|by_id| by_id.values())
    }

    pub fn channel(&self, channel_type: ChannelType, channel_id: &str) -> Option<&Channel> {
        self.channels.get(&channel_type)?.get(channel_id)
    }

    /// Look a channel up by id on any platform.
    pub fn find_channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.values().find_map(|by_id| by_id.get(channel_id))
    }

    fn channel_mut(&mut self, channel_type: ChannelType, channel_id: &str) -> Option<&mut Channel> {
        self.channels.get_mut(&channel_type)?.get_mut(channel_id)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.values().map(BTreeMap::len).sum()
    }

    pub fn message_count(&self) -> usize {
        self.channels().map(|c| c.messages.len()).sum()
    }

    pub fn has_seen(&self, message_id: &str) -> bool {
        self.seen_ids.contains(message_id)
    }

    /// Reply threads keyed by root message id.
    pub fn threads(&self) -> &BTreeMap<String, VecDeque<Message>> {
        &self.threads
    }

    pub fn thread(&self, root_id: &str) -> Option<&VecDeque<Message>> {
        self.threads.get(root_id)
    }

    /// Action history, oldest first.
    pub fn actions(&self) -> &VecDeque<ActionRecord> {
        &self.actions
    }

    pub fn users(&self) -> impl Iterator<Item = &UserProfile> {
        self.users.values()
    }

    pub fn user(&self, platform: ChannelType, user_key: &str) -> Option<&UserProfile> {
        self.users.get(&(platform, user_key.to_string()))
    }

    pub fn memory_bank(&self) -> &BTreeMap<UserKey, VecDeque<MemoryEntry>> {
        &self.memories
    }

    pub fn memories(&self, platform: ChannelType, user_key: &str) -> Option<&VecDeque<MemoryEntry>> {
        self.memories.get(&(platform, user_key.to_string()))
    }

    pub fn tool_cache(&self) -> &VecDeque<ToolCacheEntry> {
        &self.tool_cache
    }

    pub fn search_cache(&self) -> &VecDeque<SearchCacheEntry> {
        &self.search_cache
    }

    pub fn media(&self) -> &VecDeque<MediaItem> {
        &self.media
    }

    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.values()
    }

    pub fn active_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.values().filter(|g| g.status == GoalStatus::Active)
    }

    /// Wall-clock time of the last mutation, `0.0` if never mutated.
    pub fn last_update(&self) -> f64 {
        self.last_update
    }

    pub fn get_metrics(&self, now: f64) -> WorldMetrics {
        let active_since = now - ACTIVE_WINDOW_SECS;
        WorldMetrics {
            channel_count: self.channel_count(),
            message_count: self.message_count(),
            action_count: self.actions.len(),
            active_channels_last_hour: self
                .channels()
                .filter(|c| c.last_activity().is_some_and(|t| t >= active_since))
                .count(),
            thread_count: self.threads.len(),
            user_count: self.users.len(),
            last_update: self.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use chorus_core::types::SenderInfo;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    fn msg(id: &str, channel: &str, channel_type: ChannelType, ts: f64) -> Message {
        Message::new(id, channel, channel_type, SenderInfo::new("alice"), format!("text {id}"), ts)
    }

    #[traced_test]
    #[test]
    fn duplicate_is_logged_and_ignored() {
        let mut state = WorldState::default();
        assert!(state.add_message("!a:x", msg("m1", "!a:x", ChannelType::Matrix, 1.0)));
        assert!(!state.add_message("!b:x", msg("m1", "!b:x", ChannelType::Matrix, 2.0)));
        assert_eq!(state.message_count(), 1);
        assert_eq!(state.channel_count(), 1);
        assert!(logs_contain("duplicate message ignored"));
    }

    #[traced_test]
    #[test]
    fn unknown_channel_status_without_name_warns() {
        let mut state = WorldState::default();
        let changed = state.update_channel_status(
            "!gone:x",
            ChannelType::Matrix,
            ChannelStatus::Kicked,
            None,
            5.0,
        );
        assert!(!changed);
        assert_eq!(state.channel_count(), 0);
        assert!(logs_contain("unknown channel without a display name"));
    }

    #[test]
    fn status_update_with_name_creates_channel() {
        let mut state = WorldState::default();
        assert!(state.update_channel_status(
            "!new:x",
            ChannelType::Matrix,
            ChannelStatus::Invited,
            Some("New Room"),
            5.0,
        ));
        let channel = state.channel(ChannelType::Matrix, "!new:x").unwrap();
        assert_eq!(channel.name, "New Room");
        assert_eq!(channel.status, ChannelStatus::Invited);
        assert_eq!(channel.status_changed_at, 5.0);
    }

    #[test]
    fn farcaster_replies_group_into_threads() {
        let mut state = WorldState::default();
        state.add_message("home", msg("c1", "home", ChannelType::Farcaster, 1.0));
        state.add_message(
            "home",
            msg("c2", "home", ChannelType::Farcaster, 2.0).with_reply_to("c1"),
        );
        state.add_message("!r:x", msg("m1", "!r:x", ChannelType::Matrix, 3.0).with_reply_to("c1"));

        let thread = state.thread("c1").unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(state.threads().len(), 1);
    }

    #[test]
    fn evicted_messages_leave_their_threads() {
        let limits = WorldConfig {
            max_messages_per_channel: 2,
            ..WorldConfig::default()
        };
        let mut state = WorldState::new(&limits);
        state.add_message("home", msg("c1", "home", ChannelType::Farcaster, 1.0));
        state.add_message("home", msg("c2", "home", ChannelType::Farcaster, 2.0));
        state.add_message("home", msg("c3", "home", ChannelType::Farcaster, 3.0));

        assert!(state.thread("c1").is_none());
        assert!(state.thread("c3").is_some());
        assert_eq!(state.threads().len(), 2);
    }

    #[test]
    fn per_thread_cap_applies() {
        let limits = WorldConfig {
            max_thread_messages: 3,
            ..WorldConfig::default()
        };
        let mut state = WorldState::new(&limits);
        state.add_message("home", msg("root", "home", ChannelType::Farcaster, 0.0));
        for i in 0..5 {
            let m = msg(&format!("r{i}"), "home", ChannelType::Farcaster, 1.0 + i as f64)
                .with_reply_to("root");
            state.add_message("home", m);
        }
        let ids: Vec<_> = state.thread("root").unwrap().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["r2", "r3", "r4"]);
    }

    #[test]
    fn retired_ids_are_bounded_fifo() {
        let limits = WorldConfig {
            max_seen_message_ids: 2,
            max_messages_per_channel: 1,
            ..WorldConfig::default()
        };
        let mut state = WorldState::new(&limits);
        for i in 0..4 {
            state.add_message("c", msg(&format!("m{i}"), "c", ChannelType::Matrix, i as f64));
        }
        // m3 is buffered; m1 and m2 are the two newest retired ids.
        assert!(!state.has_seen("m0"));
        assert!(state.has_seen("m1"));
        assert!(state.has_seen("m3"));
    }

    #[test]
    fn buffered_ids_outlive_the_retired_cap() {
        let limits = WorldConfig {
            max_seen_message_ids: 3,
            max_messages_per_channel: 2,
            ..WorldConfig::default()
        };
        let mut state = WorldState::new(&limits);
        for (id, room) in [("a1", "!a:x"), ("a2", "!a:x"), ("b1", "!b:x"), ("b2", "!b:x")] {
            assert!(state.add_message(room, msg(id, room, ChannelType::Matrix, 1.0)));
        }
        // Churn through another room so the retired FIFO turns over.
        for i in 0..10 {
            state.add_message("!c:x", msg(&format!("c{i}"), "!c:x", ChannelType::Matrix, 2.0));
        }

        assert!(!state.add_message("!b:x", msg("a1", "!b:x", ChannelType::Matrix, 3.0)));
        let copies = state
            .channels()
            .flat_map(|c| c.messages.iter())
            .filter(|m| m.id == "a1")
            .count();
        assert_eq!(copies, 1);
        assert_eq!(state.message_count(), 6);
    }

    #[test]
    fn correlation_id_completes_scheduled_record() {
        let mut state = WorldState::default();
        let params = Metadata::from([("target_id".to_string(), json!("m9"))]);
        state.record_action("send_reply", params.clone(), ActionStatus::Scheduled, Some("X".into()));
        assert!(state.has_pending_action("send_reply", "target_id", &json!("m9")));
        assert!(!state.has_successful_action("send_reply", "target_id", &json!("m9")));

        state.record_action("send_reply", Metadata::new(), ActionStatus::Success, Some("X".into()));

        assert_eq!(state.actions().len(), 1);
        assert_eq!(state.actions()[0].result, ActionStatus::Success);
        assert!(state.has_successful_action("send_reply", "target_id", &json!("m9")));
        assert!(!state.update_action_result("X", ActionStatus::Failure));
    }

    #[test]
    fn action_history_is_bounded() {
        let mut state = WorldState::default();
        for i in 0..130 {
            let params = Metadata::from([("n".to_string(), json!(i))]);
            state.record_action("wait", params, ActionStatus::Success, None);
        }
        assert_eq!(state.actions().len(), 100);
        assert_eq!(state.actions()[0].parameters["n"], json!(30));
    }

    #[test]
    fn user_profiles_track_senders() {
        let mut state = WorldState::default();
        let mut sender = SenderInfo::new("fid:7");
        sender.user_id = Some(7);
        sender.username = Some("dwr".into());
        let m1 = Message::new("a", "home", ChannelType::Farcaster, sender.clone(), "gm", 10.0);
        let m2 = Message::new("b", "home", ChannelType::Farcaster, sender, "gm again", 20.0);
        state.add_message("home", m1);
        state.add_message("home", m2);

        let profile = state.user(ChannelType::Farcaster, "7").unwrap();
        assert_eq!(profile.message_count, 2);
        assert_eq!(profile.first_seen, 10.0);
        assert_eq!(profile.last_seen, 20.0);
        assert_eq!(profile.username.as_deref(), Some("dwr"));

        assert!(state.set_user_sentiment(ChannelType::Farcaster, "7", "positive", 0.8, 30.0));
        assert!(!state.set_user_sentiment(ChannelType::Matrix, "7", "positive", 0.8, 30.0));
    }

    #[test]
    fn image_urls_populate_gallery_once() {
        let mut state = WorldState::default();
        let urls = vec!["https://img/1.png".to_string()];
        state.add_message(
            "home",
            msg("a", "home", ChannelType::Farcaster, 1.0).with_image_urls(urls.clone()),
        );
        state.add_message(
            "home",
            msg("b", "home", ChannelType::Farcaster, 2.0).with_image_urls(urls),
        );
        assert_eq!(state.media().len(), 1);
        assert_eq!(state.media()[0].source_message_id.as_deref(), Some("a"));
    }

    #[test]
    fn tool_cache_replaces_same_key() {
        let mut state = WorldState::default();
        state.cache_tool_result("weather", "paris", json!({"t": 10}), 1.0);
        state.cache_tool_result("weather", "paris", json!({"t": 12}), 2.0);
        assert_eq!(state.tool_cache().len(), 1);
        assert_eq!(
            state.cached_tool_result("weather", "paris").unwrap().value,
            json!({"t": 12})
        );
    }

    #[test]
    fn goals_update_in_place() {
        let mut state = WorldState::default();
        let goal = Goal {
            id: "g1".into(),
            description: "grow the channel".into(),
            status: GoalStatus::Active,
            progress: Vec::new(),
            created_at: 1.0,
            updated_at: 1.0,
        };
        assert!(state.add_goal(goal.clone()));
        assert!(!state.add_goal(goal));
        assert!(state.update_goal("g1", Some(GoalStatus::Completed), Some("done".into()), 5.0));
        assert_eq!(state.active_goals().count(), 0);
        assert!(!state.update_goal("nope", None, None, 5.0));
    }

    #[test]
    fn reap_removes_only_expired_inactive_channels() {
        let mut state = WorldState::default();
        state.add_message("!keep:x", msg("k1", "!keep:x", ChannelType::Matrix, 1.0));
        state.add_message("!left:x", msg("l1", "!left:x", ChannelType::Matrix, 1.0));
        state.add_message("!fresh:x", msg("f1", "!fresh:x", ChannelType::Matrix, 1.0));
        state.update_channel_status("!left:x", ChannelType::Matrix, ChannelStatus::LeftByBot, None, 100.0);
        state.update_channel_status("!fresh:x", ChannelType::Matrix, ChannelStatus::Kicked, None, 900.0);

        let reaped = state.reap_inactive_channels(1000.0, 500.0);
        assert_eq!(reaped, vec![(ChannelType::Matrix, "!left:x".to_string())]);
        assert_eq!(state.channel_count(), 2);
        // Reaped message ids stay deduplicated.
        assert!(!state.add_message("!left:x", msg("l1", "!left:x", ChannelType::Matrix, 2.0)));
    }

    #[test]
    fn metrics_count_recent_channels() {
        let mut state = WorldState::default();
        state.add_message("old", msg("o", "old", ChannelType::Matrix, 0.0));
        state.add_message("new", msg("n", "new", ChannelType::Farcaster, 5000.0));
        let metrics = state.get_metrics(5000.0);
        assert_eq!(metrics.channel_count, 2);
        assert_eq!(metrics.message_count, 2);
        assert_eq!(metrics.active_channels_last_hour, 1);
        assert_eq!(metrics.thread_count, 1);
        assert_eq!(metrics.user_count, 2);
    }
}
