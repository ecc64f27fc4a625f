// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock decision engine returning scripted plans.

use std::collections::VecDeque;

use async_trait::async_trait;
use chorus_core::error::ChorusError;
use chorus_core::traits::{DecisionEngine, DecisionRequest, PlannedAction};
use tokio::sync::Mutex;

/// Plans are popped from a FIFO queue. An empty queue yields no actions.
pub struct MockDecisionEngine {
    plans: Mutex<VecDeque<Vec<PlannedAction>>>,
    requests: Mutex<Vec<DecisionRequest>>,
}

impl MockDecisionEngine {
    pub fn new() -> Self {
        Self {
            plans: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_plans(plans: Vec<Vec<PlannedAction>>) -> Self {
        Self {
            plans: Mutex::new(VecDeque::from(plans)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn add_plan(&self, plan: Vec<PlannedAction>) {
        self.plans.lock().await.push_back(plan);
    }

    /// Requests seen so far, oldest first.
    pub async fn requests(&self) -> Vec<DecisionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockDecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DecisionEngine for MockDecisionEngine {
    fn name(&self) -> &str {
        "mock-engine"
    }

    async fn decide(&self, request: DecisionRequest) -> Result<Vec<PlannedAction>, ChorusError> {
        self.requests.lock().await.push(request);
        Ok(self.plans.lock().await.pop_front().unwrap_or_default())
    }
}
