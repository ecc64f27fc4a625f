// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chorus agent core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Chorus configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChorusConfig {
    /// Agent identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// World-state store bounds and retention.
    #[serde(default)]
    pub world: WorldConfig,

    /// Payload builder rendering options.
    #[serde(default)]
    pub context: ContextConfig,

    /// Cycle and action rate limits.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Processing coordinator timing.
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Outbound action scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Agent identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent, also used in log lines.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "chorus".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// World-state store bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    /// Messages kept per channel; older ones are evicted first.
    #[serde(default = "default_max_messages_per_channel")]
    pub max_messages_per_channel: usize,

    /// Action records kept in the history.
    #[serde(default = "default_max_action_history")]
    pub max_action_history: usize,

    /// Ids remembered for duplicate rejection after their message has left
    /// every channel buffer. Ids of buffered messages are always remembered.
    #[serde(default = "default_max_seen_message_ids")]
    pub max_seen_message_ids: usize,

    /// Messages kept per reply thread.
    #[serde(default = "default_max_thread_messages")]
    pub max_thread_messages: usize,

    /// Memory bank entries kept per user.
    #[serde(default = "default_max_memories_per_user")]
    pub max_memories_per_user: usize,

    #[serde(default = "default_max_tool_cache_entries")]
    pub max_tool_cache_entries: usize,

    #[serde(default = "default_max_search_cache_entries")]
    pub max_search_cache_entries: usize,

    #[serde(default = "default_max_media_items")]
    pub max_media_items: usize,

    /// Seconds a non-active channel is kept after its status changed.
    /// `None` disables reaping.
    #[serde(default)]
    pub channel_retention_secs: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_messages_per_channel: default_max_messages_per_channel(),
            max_action_history: default_max_action_history(),
            max_seen_message_ids: default_max_seen_message_ids(),
            max_thread_messages: default_max_thread_messages(),
            max_memories_per_user: default_max_memories_per_user(),
            max_tool_cache_entries: default_max_tool_cache_entries(),
            max_search_cache_entries: default_max_search_cache_entries(),
            max_media_items: default_max_media_items(),
            channel_retention_secs: None,
        }
    }
}

fn default_max_messages_per_channel() -> usize {
    50
}

fn default_max_action_history() -> usize {
    100
}

fn default_max_seen_message_ids() -> usize {
    10_000
}

fn default_max_thread_messages() -> usize {
    50
}

fn default_max_memories_per_user() -> usize {
    20
}

fn default_max_tool_cache_entries() -> usize {
    50
}

fn default_max_search_cache_entries() -> usize {
    20
}

fn default_max_media_items() -> usize {
    100
}

/// Payload builder configuration.
///
/// Controls how much of the world state is rendered into each view and when
/// the builder switches from the flat view to the node view.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Recent messages rendered per detailed channel in the flat view.
    #[serde(default = "default_messages_per_channel")]
    pub messages_per_channel: usize,

    /// Channels rendered with messages in the flat view; the rest are summarized.
    #[serde(default = "default_max_detailed_channels")]
    pub max_detailed_channels: usize,

    /// Render messages in their compact form (sender, truncated text, time).
    #[serde(default)]
    pub summarize_messages: bool,

    /// Include username/display name/numeric id for senders.
    #[serde(default = "default_true")]
    pub include_detailed_user_info: bool,

    /// Seconds added to a Farcaster channel's last activity when ranking.
    #[serde(default = "default_farcaster_priority_boost_secs")]
    pub farcaster_priority_boost_secs: f64,

    /// Lookback window for the activity spike detector.
    #[serde(default = "default_spike_window_secs")]
    pub spike_window_secs: f64,

    /// More active channels than this inside the window counts as a spike.
    #[serde(default = "default_spike_channel_threshold")]
    pub spike_channel_threshold: usize,

    /// Detailed channels while a spike is in progress.
    #[serde(default = "default_spike_max_detailed_channels")]
    pub spike_max_detailed_channels: usize,

    /// Messages per detailed channel while a spike is in progress.
    #[serde(default = "default_spike_messages_per_channel")]
    pub spike_messages_per_channel: usize,

    /// Estimated token count above which `build` renders the node view.
    #[serde(default = "default_node_mode_token_threshold")]
    pub node_mode_token_threshold: usize,

    /// Longest text field kept by the optimizer.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Arrays longer than this are reduced to `{sample, total_count}` by the optimizer.
    #[serde(default = "default_max_collection_items")]
    pub max_collection_items: usize,

    /// Flat views larger than this are passed through the optimizer.
    #[serde(default)]
    pub hard_size_limit_bytes: Option<usize>,

    /// Channels force-expanded when a node view would otherwise have no messages.
    #[serde(default = "default_failsafe_channel_count")]
    pub failsafe_channel_count: usize,

    /// Messages rendered by an expanded channel node.
    #[serde(default = "default_node_messages_per_channel")]
    pub node_messages_per_channel: usize,

    /// Most recently seen users addressable as nodes.
    #[serde(default = "default_max_user_nodes")]
    pub max_user_nodes: usize,

    /// Most recently active threads addressable as nodes.
    #[serde(default = "default_max_thread_nodes")]
    pub max_thread_nodes: usize,

    /// Recent action records included in views.
    #[serde(default = "default_action_history_items")]
    pub action_history_items: usize,

    /// Nodes the in-memory directory keeps expanded at once.
    #[serde(default = "default_max_expanded_nodes")]
    pub max_expanded_nodes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            messages_per_channel: default_messages_per_channel(),
            max_detailed_channels: default_max_detailed_channels(),
            summarize_messages: false,
            include_detailed_user_info: true,
            farcaster_priority_boost_secs: default_farcaster_priority_boost_secs(),
            spike_window_secs: default_spike_window_secs(),
            spike_channel_threshold: default_spike_channel_threshold(),
            spike_max_detailed_channels: default_spike_max_detailed_channels(),
            spike_messages_per_channel: default_spike_messages_per_channel(),
            node_mode_token_threshold: default_node_mode_token_threshold(),
            max_text_length: default_max_text_length(),
            max_collection_items: default_max_collection_items(),
            hard_size_limit_bytes: None,
            failsafe_channel_count: default_failsafe_channel_count(),
            node_messages_per_channel: default_node_messages_per_channel(),
            max_user_nodes: default_max_user_nodes(),
            max_thread_nodes: default_max_thread_nodes(),
            action_history_items: default_action_history_items(),
            max_expanded_nodes: default_max_expanded_nodes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_messages_per_channel() -> usize {
    10
}

fn default_max_detailed_channels() -> usize {
    8
}

fn default_farcaster_priority_boost_secs() -> f64 {
    300.0
}

fn default_spike_window_secs() -> f64 {
    300.0 // 5 minutes
}

fn default_spike_channel_threshold() -> usize {
    10
}

fn default_spike_max_detailed_channels() -> usize {
    3
}

fn default_spike_messages_per_channel() -> usize {
    3
}

fn default_node_mode_token_threshold() -> usize {
    12_000
}

fn default_max_text_length() -> usize {
    500
}

fn default_max_collection_items() -> usize {
    20
}

fn default_failsafe_channel_count() -> usize {
    3
}

fn default_node_messages_per_channel() -> usize {
    15
}

fn default_max_user_nodes() -> usize {
    20
}

fn default_max_thread_nodes() -> usize {
    20
}

fn default_action_history_items() -> usize {
    10
}

fn default_max_expanded_nodes() -> usize {
    8
}

/// Rate limiter configuration.
///
/// Keys of `action_limits` are action type tags (e.g. `send_reply`); keys of
/// `channel_type_limits` are platform names (`matrix`, `farcaster`). Action
/// types and platforms without an entry are not capped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Base interval used to size burst cooldowns.
    #[serde(default = "default_base_interval_secs")]
    pub base_interval_secs: f64,

    #[serde(default = "default_max_cycles_per_hour")]
    pub max_cycles_per_hour: usize,

    #[serde(default = "default_burst_window_secs")]
    pub burst_window_secs: f64,

    /// Cycles inside the burst window that trigger a cooldown.
    #[serde(default = "default_max_burst_cycles")]
    pub max_burst_cycles: usize,

    /// Starting value of the adaptive cooldown multiplier (1.0-3.0).
    #[serde(default = "default_cooldown_multiplier")]
    pub cooldown_multiplier: f64,

    /// Hourly cap per action type.
    #[serde(default = "default_action_limits")]
    pub action_limits: BTreeMap<String, usize>,

    /// Hourly send cap per channel, by platform.
    #[serde(default = "default_channel_type_limits")]
    pub channel_type_limits: BTreeMap<String, usize>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_interval_secs: default_base_interval_secs(),
            max_cycles_per_hour: default_max_cycles_per_hour(),
            burst_window_secs: default_burst_window_secs(),
            max_burst_cycles: default_max_burst_cycles(),
            cooldown_multiplier: default_cooldown_multiplier(),
            action_limits: default_action_limits(),
            channel_type_limits: default_channel_type_limits(),
        }
    }
}

fn default_base_interval_secs() -> f64 {
    10.0
}

fn default_max_cycles_per_hour() -> usize {
    300
}

fn default_burst_window_secs() -> f64 {
    300.0
}

fn default_max_burst_cycles() -> usize {
    10
}

fn default_cooldown_multiplier() -> f64 {
    1.0
}

fn default_action_limits() -> BTreeMap<String, usize> {
    BTreeMap::from([
        ("send_message".to_string(), 100),
        ("send_reply".to_string(), 100),
        ("react_to_message".to_string(), 50),
        ("like_post".to_string(), 50),
        ("quote_post".to_string(), 30),
        ("follow_user".to_string(), 20),
        ("unfollow_user".to_string(), 20),
    ])
}

fn default_channel_type_limits() -> BTreeMap<String, usize> {
    BTreeMap::from([("matrix".to_string(), 60), ("farcaster".to_string(), 30)])
}

/// Processing coordinator timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Periodic wake-up interval when no stale signal arrives.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Sleep after a failed cycle before the loop resumes.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: default_cycle_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
        }
    }
}

fn default_cycle_interval_ms() -> u64 {
    30_000
}

fn default_error_backoff_ms() -> u64 {
    5_000
}

/// Outbound action scheduler configuration (one scheduler per platform).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Maximum queued actions per scheduler.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Minimum spacing between two sends from the same scheduler.
    #[serde(default = "default_min_send_interval_ms")]
    pub min_send_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            min_send_interval_ms: default_min_send_interval_ms(),
        }
    }
}

fn default_queue_capacity() -> usize {
    100
}

fn default_min_send_interval_ms() -> u64 {
    1_000
}
