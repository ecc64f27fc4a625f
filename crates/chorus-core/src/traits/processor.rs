// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downstream cycle processor invoked by the processing coordinator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChorusError;

/// Input to one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRequest {
    /// Monotonic per-coordinator cycle number, starting at 1.
    pub cycle_id: u64,
    /// `None` means a holistic evaluation across all channels.
    pub primary_channel: Option<String>,
    /// Reason attached to the stale mark that triggered the cycle, if any.
    pub trigger: Option<String>,
    pub started_at: f64,
}

/// Summary of what a cycle did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub actions_recorded: usize,
    /// Planned sends handed to a platform scheduler instead of recorded.
    #[serde(default)]
    pub actions_scheduled: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_bytes: Option<usize>,
}

/// Runs a single render-and-decide cycle.
///
/// The coordinator holds its run guard for the whole call, so implementations
/// may await network I/O freely.
#[async_trait]
pub trait CycleProcessor: Send + Sync + 'static {
    async fn process_cycle(&self, request: CycleRequest) -> Result<CycleOutcome, ChorusError>;
}
