// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a store, limiter and coordinator around a
//! [`MockCycleProcessor`].

use std::sync::Arc;

use chorus_agent::ProcessingCoordinator;
use chorus_config::model::ChorusConfig;
use chorus_core::types::Message;
use chorus_ratelimit::RateLimiter;
use chorus_world::WorldStateStore;
use tokio::sync::Mutex;

use crate::mock_processor::MockCycleProcessor;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    config: ChorusConfig,
    processor: MockCycleProcessor,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ChorusConfig::default();
        config.processing.cycle_interval_ms = 50;
        config.processing.error_backoff_ms = 10;
        Self {
            config,
            processor: MockCycleProcessor::new(),
        }
    }

    pub fn with_config(mut self, config: ChorusConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cycle_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.processing.cycle_interval_ms = interval_ms;
        self
    }

    /// Hold every cycle open until the processor is released.
    pub fn gated(mut self) -> Self {
        self.processor = MockCycleProcessor::gated();
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.processor = MockCycleProcessor::failing(message);
        self
    }

    pub fn build(self) -> TestHarness {
        let store = Arc::new(WorldStateStore::new(&self.config.world));
        let limiter = Arc::new(Mutex::new(RateLimiter::new(&self.config.rate_limit)));
        let processor = Arc::new(self.processor);
        let coordinator = ProcessingCoordinator::new(
            Arc::clone(&store),
            processor.clone(),
            Arc::clone(&limiter),
            self.config.processing.clone(),
        )
        .with_channel_retention(self.config.world.channel_retention_secs);

        TestHarness {
            config: self.config,
            store,
            limiter,
            processor,
            coordinator,
        }
    }
}

/// A coordinator stack with a mock processor, for end-to-end tests.
pub struct TestHarness {
    pub config: ChorusConfig,
    pub store: Arc<WorldStateStore>,
    pub limiter: Arc<Mutex<RateLimiter>>,
    pub processor: Arc<MockCycleProcessor>,
    pub coordinator: ProcessingCoordinator,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Insert messages into the store. Returns how many were accepted.
    pub async fn add_messages(&self, messages: Vec<Message>) -> usize {
        let mut accepted = 0;
        for message in messages {
            let channel_id = message.channel_id.clone();
            if self.store.add_message(&channel_id, message).await {
                accepted += 1;
            }
        }
        accepted
    }

    pub async fn start(&self) {
        self.coordinator.start().await;
    }

    /// Release any gated cycles and stop the coordinator.
    pub async fn shutdown(&self) {
        self.processor.release();
        self.coordinator.stop().await;
    }
}
