// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the world-state store, the payload builder and
//! the processing coordinator.
//!
//! All timestamps are float seconds since the Unix epoch.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Free-form platform metadata attached to messages and actions.
///
/// A `BTreeMap` keeps serialized payloads deterministic.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Chat platform a channel or message belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelType {
    Matrix,
    Farcaster,
}

impl ChannelType {
    /// Whether conversations on this platform are grouped by reply chains.
    pub fn uses_reply_threads(self) -> bool {
        matches!(self, ChannelType::Farcaster)
    }
}

/// Membership status of the bot in a channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelStatus {
    Active,
    LeftByBot,
    Kicked,
    Banned,
    Invited,
}

/// Outcome of a recorded action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Failure,
    Scheduled,
    Skipped,
}

impl ActionStatus {
    /// Terminal statuses are the only valid targets of a correlation update.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ActionStatus::Scheduled)
    }
}

/// Lifecycle of an agent goal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

/// Identity of a message author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderInfo {
    /// Raw platform identifier (e.g. `@alice:example.org` or a Farcaster fid string).
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

impl SenderInfo {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            username: None,
            display_name: None,
            user_id: None,
        }
    }

    /// Stable per-platform key for this sender: the numeric id when known,
    /// the raw identifier otherwise.
    pub fn key(&self) -> String {
        match self.user_id {
            Some(id) => id.to_string(),
            None => self.raw.clone(),
        }
    }

    /// Best human-facing label for this sender.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.raw)
    }
}

/// A normalized chat message. Immutable once appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub channel_type: ChannelType,
    pub sender: SenderInfo,
    pub content: String,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        channel_type: ChannelType,
        sender: SenderInfo,
        content: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            channel_type,
            sender,
            content: content.into(),
            timestamp,
            reply_to: None,
            image_urls: Vec::new(),
            attachments: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_image_urls(mut self, urls: Vec<String>) -> Self {
        self.image_urls = urls;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Root id of the reply chain this message belongs to.
    pub fn thread_root(&self) -> &str {
        self.reply_to.as_deref().unwrap_or(&self.id)
    }
}

/// Platform-specific channel attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// A conversation channel on one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub channel_type: ChannelType,
    pub name: String,
    /// Oldest first. Bounded by the store's per-channel limit.
    pub messages: VecDeque<Message>,
    pub last_checked: Option<f64>,
    pub status: ChannelStatus,
    pub status_changed_at: f64,
    pub metadata: ChannelMetadata,
}

impl Channel {
    pub fn new(
        id: impl Into<String>,
        channel_type: ChannelType,
        name: impl Into<String>,
        now: f64,
    ) -> Self {
        Self {
            id: id.into(),
            channel_type,
            name: name.into(),
            messages: VecDeque::new(),
            last_checked: None,
            status: ChannelStatus::Active,
            status_changed_at: now,
            metadata: ChannelMetadata::default(),
        }
    }

    /// Timestamp of the newest message, if any.
    pub fn last_activity(&self) -> Option<f64> {
        self.messages.back().map(|m| m.timestamp)
    }

    pub fn is_active(&self) -> bool {
        self.status == ChannelStatus::Active
    }
}

/// One entry of the bounded action history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_type: String,
    pub parameters: Metadata,
    pub result: ActionStatus,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Well-known action type tags used by schedulers and duplicate checks.
pub mod action_types {
    pub const SEND_MESSAGE: &str = "send_message";
    pub const SEND_REPLY: &str = "send_reply";
    pub const REACT: &str = "react_to_message";
    pub const LIKE: &str = "like_post";
    pub const QUOTE: &str = "quote_post";
    pub const FOLLOW: &str = "follow_user";
    pub const UNFOLLOW: &str = "unfollow_user";
    pub const JOIN_CHANNEL: &str = "join_channel";
    pub const LEAVE_CHANNEL: &str = "leave_channel";
    pub const WAIT: &str = "wait";
}

/// Profile accumulated from a user's messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub platform: ChannelType,
    pub user_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub first_seen: f64,
    pub last_seen: f64,
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

/// Sentiment attached to a user by an external analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: String,
    pub score: f64,
    pub updated_at: f64,
}

/// A remembered fact about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub content: String,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_message_id: Option<String>,
}

/// A cached tool invocation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCacheEntry {
    pub tool_name: String,
    pub cache_key: String,
    pub value: serde_json::Value,
    pub timestamp: f64,
}

/// A recent platform search and a summary of its results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCacheEntry {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<ChannelType>,
    pub results: serde_json::Value,
    pub timestamp: f64,
}

/// An image or other media item seen or produced by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: f64,
}

/// A long-running objective tracked across cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub status: GoalStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<String>,
    pub created_at: f64,
    pub updated_at: f64,
}

/// Counts exposed for observability and spike detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMetrics {
    pub channel_count: usize,
    pub message_count: usize,
    pub action_count: usize,
    pub active_channels_last_hour: usize,
    pub thread_count: usize,
    pub user_count: usize,
    pub last_update: f64,
}

/// Current wall-clock time in float seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn channel_status_round_trips_through_strings() {
        assert_eq!(ChannelStatus::LeftByBot.to_string(), "left_by_bot");
        assert_eq!(
            ChannelStatus::from_str("kicked").unwrap(),
            ChannelStatus::Kicked
        );
        let json = serde_json::to_string(&ChannelStatus::Invited).unwrap();
        assert_eq!(json, "\"invited\"");
    }

    #[test]
    fn thread_root_prefers_reply_target() {
        let sender = SenderInfo::new("alice");
        let root = Message::new("m1", "c1", ChannelType::Farcaster, sender.clone(), "hi", 1.0);
        let reply = Message::new("m2", "c1", ChannelType::Farcaster, sender, "yo", 2.0)
            .with_reply_to("m1");
        assert_eq!(root.thread_root(), "m1");
        assert_eq!(reply.thread_root(), "m1");
    }

    #[test]
    fn sender_key_uses_numeric_id_when_present() {
        let mut sender = SenderInfo::new("@bob:example.org");
        assert_eq!(sender.key(), "@bob:example.org");
        sender.user_id = Some(42);
        sender.username = Some("bob".into());
        assert_eq!(sender.key(), "42");
        assert_eq!(sender.label(), "bob");
    }

    #[test]
    fn only_scheduled_is_non_terminal() {
        assert!(!ActionStatus::Scheduled.is_terminal());
        assert!(ActionStatus::Success.is_terminal());
        assert!(ActionStatus::Failure.is_terminal());
        assert!(ActionStatus::Skipped.is_terminal());
    }

    #[test]
    fn empty_message_fields_are_omitted() {
        let msg = Message::new("m1", "c1", ChannelType::Matrix, SenderInfo::new("a"), "x", 1.0);
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("reply_to").is_none());
        assert!(value.get("image_urls").is_none());
        assert!(value.get("metadata").is_none());
        assert_eq!(value["channel_type"], "matrix");
    }
}
