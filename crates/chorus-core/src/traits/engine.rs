// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decision engine trait: turns a rendered payload into planned actions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChorusError;
use crate::types::{ActionStatus, Metadata};

/// What the engine sees for one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRequest {
    pub cycle_id: u64,
    pub primary_channel: Option<String>,
    /// `"full"` or `"node"`.
    pub payload_mode: String,
    pub payload: serde_json::Value,
}

/// An action the engine took or wants recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub action_type: String,
    #[serde(default)]
    pub parameters: Metadata,
    pub result: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl PlannedAction {
    pub fn new(action_type: impl Into<String>, result: ActionStatus) -> Self {
        Self {
            action_type: action_type.into(),
            parameters: Metadata::new(),
            result,
            correlation_id: None,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// The external decision-making engine (typically an LLM with tools).
#[async_trait]
pub trait DecisionEngine: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn decide(&self, request: DecisionRequest) -> Result<Vec<PlannedAction>, ChorusError>;
}
