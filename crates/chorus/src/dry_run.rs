// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborators used when no model or platform connection is configured.
//!
//! The engine logs what it would have decided on and plans nothing; the
//! sender logs outbound actions instead of delivering them.

use async_trait::async_trait;
use chorus_core::error::ChorusError;
use chorus_core::traits::{
    ActionSender, DecisionEngine, DecisionRequest, OutboundAction, PlannedAction, SendReceipt,
};
use chorus_core::types::ChannelType;
use tracing::info;

pub struct DryRunEngine;

#[async_trait]
impl DecisionEngine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn decide(&self, request: DecisionRequest) -> Result<Vec<PlannedAction>, ChorusError> {
        let stats = &request.payload["payload_stats"];
        info!(
            cycle_id = request.cycle_id,
            mode = %request.payload_mode,
            size_bytes = stats["size_bytes"].as_u64().unwrap_or_default(),
            estimated_tokens = stats["estimated_tokens"].as_u64().unwrap_or_default(),
            "dry run: payload ready, no decision engine configured"
        );
        Ok(Vec::new())
    }
}

pub struct DryRunSender {
    platform: ChannelType,
}

impl DryRunSender {
    pub fn new(platform: ChannelType) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl ActionSender for DryRunSender {
    fn platform(&self) -> ChannelType {
        self.platform
    }

    async fn send(&self, action: &OutboundAction) -> Result<SendReceipt, ChorusError> {
        info!(
            platform = %self.platform,
            action_type = %action.action_type,
            channel_id = ?action.channel_id,
            target_id = ?action.target_id,
            "dry run: outbound action not delivered"
        );
        Ok(SendReceipt::default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn dry_run_engine_plans_nothing() {
        let request = DecisionRequest {
            cycle_id: 1,
            primary_channel: None,
            payload_mode: "full".into(),
            payload: json!({ "payload_stats": { "size_bytes": 10, "estimated_tokens": 3 } }),
        };
        assert!(DryRunEngine.decide(request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_sender_returns_empty_receipt() {
        let sender = DryRunSender::new(ChannelType::Matrix);
        let receipt = sender
            .send(&OutboundAction::new("send_message").in_channel("!r:x"))
            .await
            .unwrap();
        assert!(receipt.platform_id.is_none());
    }
}
