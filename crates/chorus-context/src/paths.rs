// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node path grammar and enumeration.
//!
//! ```text
//! channels/{platform}/{channel_id}/info
//! channels/{platform}/{channel_id}/recent_messages
//! threads/{root_id}
//! users/{platform}/{user_key}
//! memory_bank/{platform}/{user_key}
//! tools/cache
//! search/recent
//! media/gallery
//! goals/active
//! system/status
//! ```
//!
//! Channel ids may contain `/`, so the leaf of a channel path is split off
//! from the right.

use std::fmt;
use std::str::FromStr;

use chorus_config::model::ContextConfig;
use chorus_core::types::ChannelType;
use chorus_world::WorldState;

use crate::ranking::rank_channels;

/// What a node path addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    ChannelInfo {
        platform: ChannelType,
        channel_id: String,
    },
    ChannelMessages {
        platform: ChannelType,
        channel_id: String,
    },
    Thread {
        root_id: String,
    },
    User {
        platform: ChannelType,
        user_key: String,
    },
    MemoryBank {
        platform: ChannelType,
        user_key: String,
    },
    ToolCache,
    SearchCache,
    MediaGallery,
    ActiveGoals,
    SystemStatus,
}

impl NodeKind {
    /// Parse a node path. Unknown shapes and platforms yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        match path {
            "tools/cache" => return Some(Self::ToolCache),
            "search/recent" => return Some(Self::SearchCache),
            "media/gallery" => return Some(Self::MediaGallery),
            "goals/active" => return Some(Self::ActiveGoals),
            "system/status" => return Some(Self::SystemStatus),
            _ => {}
        }

        let (root, rest) = path.split_once('/')?;
        match root {
            "channels" => {
                let (platform, rest) = rest.split_once('/')?;
                let platform = ChannelType::from_str(platform).ok()?;
                let (channel_id, leaf) = rest.rsplit_once('/')?;
                if channel_id.is_empty() {
                    return None;
                }
                let channel_id = channel_id.to_string();
                match leaf {
                    "info" => Some(Self::ChannelInfo {
                        platform,
                        channel_id,
                    }),
                    "recent_messages" => Some(Self::ChannelMessages {
                        platform,
                        channel_id,
                    }),
                    _ => None,
                }
            }
            "threads" if !rest.is_empty() => Some(Self::Thread {
                root_id: rest.to_string(),
            }),
            "users" | "memory_bank" => {
                let (platform, user_key) = rest.split_once('/')?;
                let platform = ChannelType::from_str(platform).ok()?;
                if user_key.is_empty() {
                    return None;
                }
                let user_key = user_key.to_string();
                Some(if root == "users" {
                    Self::User { platform, user_key }
                } else {
                    Self::MemoryBank { platform, user_key }
                })
            }
            _ => None,
        }
    }

    /// Whether this node renders chat messages when expanded.
    pub fn carries_messages(&self) -> bool {
        matches!(self, Self::ChannelMessages { .. } | Self::Thread { .. })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelInfo {
                platform,
                channel_id,
            } => write!(f, "channels/{platform}/{channel_id}/info"),
            Self::ChannelMessages {
                platform,
                channel_id,
            } => write!(f, "channels/{platform}/{channel_id}/recent_messages"),
            Self::Thread { root_id } => write!(f, "threads/{root_id}"),
            Self::User { platform, user_key } => write!(f, "users/{platform}/{user_key}"),
            Self::MemoryBank { platform, user_key } => {
                write!(f, "memory_bank/{platform}/{user_key}")
            }
            Self::ToolCache => f.write_str("tools/cache"),
            Self::SearchCache => f.write_str("search/recent"),
            Self::MediaGallery => f.write_str("media/gallery"),
            Self::ActiveGoals => f.write_str("goals/active"),
            Self::SystemStatus => f.write_str("system/status"),
        }
    }
}

/// Every addressable node for the current state, in a deterministic order:
/// system status, channels by activity rank, threads and users by recency,
/// then the singleton collections that have content.
pub fn enumerate_nodes(state: &WorldState, config: &ContextConfig) -> Vec<NodeKind> {
    let mut nodes = vec![NodeKind::SystemStatus];

    for channel in rank_channels(state, config) {
        nodes.push(NodeKind::ChannelInfo {
            platform: channel.channel_type,
            channel_id: channel.id.clone(),
        });
        nodes.push(NodeKind::ChannelMessages {
            platform: channel.channel_type,
            channel_id: channel.id.clone(),
        });
    }

    let mut threads: Vec<(&String, f64)> = state
        .threads()
        .iter()
        .filter_map(|(root, msgs)| msgs.back().map(|m| (root, m.timestamp)))
        .collect();
    threads.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    nodes.extend(
        threads
            .into_iter()
            .take(config.max_thread_nodes)
            .map(|(root, _)| NodeKind::Thread {
                root_id: root.clone(),
            }),
    );

    let mut users: Vec<_> = state.users().collect();
    users.sort_by(|a, b| {
        b.last_seen
            .total_cmp(&a.last_seen)
            .then_with(|| (a.platform, &a.user_key).cmp(&(b.platform, &b.user_key)))
    });
    nodes.extend(users.into_iter().take(config.max_user_nodes).map(|u| NodeKind::User {
        platform: u.platform,
        user_key: u.user_key.clone(),
    }));

    nodes.extend(
        state
            .memory_bank()
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|((platform, user_key), _)| NodeKind::MemoryBank {
                platform: *platform,
                user_key: user_key.clone(),
            }),
    );

    if !state.tool_cache().is_empty() {
        nodes.push(NodeKind::ToolCache);
    }
    if !state.search_cache().is_empty() {
        nodes.push(NodeKind::SearchCache);
    }
    if !state.media().is_empty() {
        nodes.push(NodeKind::MediaGallery);
    }
    if state.active_goals().next().is_some() {
        nodes.push(NodeKind::ActiveGoals);
    }

    nodes
}
