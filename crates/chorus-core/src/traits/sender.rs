// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound action sender implemented by platform clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChorusError;
use crate::types::{ChannelType, Metadata};

/// One outbound platform operation (post, reply, react, follow, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundAction {
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Message or user the action targets (reply target, liked cast, followed fid).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub parameters: Metadata,
}

impl OutboundAction {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            channel_id: None,
            target_id: None,
            content: None,
            parameters: Metadata::new(),
        }
    }

    pub fn in_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn targeting(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Key used to suppress two queued actions competing for the same target.
    pub fn dedup_key(&self) -> String {
        match (&self.target_id, &self.channel_id) {
            (Some(target), _) => format!("{}:{target}", self.action_type),
            (None, Some(channel)) => format!(
                "{}:{channel}:{}",
                self.action_type,
                self.content.as_deref().unwrap_or_default()
            ),
            (None, None) => format!(
                "{}::{}",
                self.action_type,
                self.content.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Parameters recorded on the matching `ActionRecord`.
    pub fn record_parameters(&self) -> Metadata {
        let mut params = self.parameters.clone();
        if let Some(channel) = &self.channel_id {
            params.insert("channel_id".into(), channel.clone().into());
        }
        if let Some(target) = &self.target_id {
            params.insert("target_id".into(), target.clone().into());
        }
        if let Some(content) = &self.content {
            params.insert("content".into(), content.clone().into());
        }
        params
    }
}

/// Platform acknowledgement of a completed send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Platform id of the created object (event id, cast hash), if any.
    pub platform_id: Option<String>,
}

/// A platform client able to execute outbound actions.
#[async_trait]
pub trait ActionSender: Send + Sync + 'static {
    fn platform(&self) -> ChannelType;

    async fn send(&self, action: &OutboundAction) -> Result<SendReceipt, ChorusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_prefers_target() {
        let reply = OutboundAction::new("send_reply")
            .in_channel("c1")
            .targeting("m9")
            .with_content("hello");
        assert_eq!(reply.dedup_key(), "send_reply:m9");

        let post = OutboundAction::new("send_message")
            .in_channel("c1")
            .with_content("hello");
        assert_eq!(post.dedup_key(), "send_message:c1:hello");
    }

    #[test]
    fn record_parameters_include_routing_fields() {
        let action = OutboundAction::new("like_post").targeting("0xabc");
        let params = action.record_parameters();
        assert_eq!(params["target_id"], "0xabc");
        assert!(!params.contains_key("channel_id"));
    }
}
