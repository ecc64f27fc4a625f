// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock cycle processor for coordinator tests.
//!
//! Records every request, tracks how many cycles run at once and can hold
//! cycles open behind a gate until the test releases them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chorus_core::error::ChorusError;
use chorus_core::traits::{CycleOutcome, CycleProcessor, CycleRequest};
use tokio::sync::{Mutex, Notify, Semaphore};

/// Enough permits to let every remaining cycle through.
const OPEN_GATE_PERMITS: usize = 1 << 20;

pub struct MockCycleProcessor {
    requests: Mutex<Vec<CycleRequest>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    failure: Option<String>,
    started: Notify,
}

impl MockCycleProcessor {
    /// Processor whose cycles complete immediately.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Processor whose cycles block until [`release`](Self::release).
    pub fn gated() -> Self {
        Self::build(Some(Arc::new(Semaphore::new(0))), None)
    }

    /// Processor whose cycles always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::build(None, Some(message.into()))
    }

    fn build(gate: Option<Arc<Semaphore>>, failure: Option<String>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            gate,
            failure,
            started: Notify::new(),
        }
    }

    /// Open the gate for all current and future cycles.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(OPEN_GATE_PERMITS);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of cycles observed running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<CycleRequest> {
        self.requests.lock().await.clone()
    }

    /// Wait until at least `count` cycles have started. Returns `false` on
    /// timeout.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let started = self.started.notified();
                if self.call_count() >= count {
                    return;
                }
                started.await;
            }
        })
        .await
        .is_ok()
    }
}

impl Default for MockCycleProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CycleProcessor for MockCycleProcessor {
    async fn process_cycle(&self, request: CycleRequest) -> Result<CycleOutcome, ChorusError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_waiters();

        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(ChorusError::processor(message.clone())),
            None => Ok(CycleOutcome::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cycle_id: u64) -> CycleRequest {
        CycleRequest {
            cycle_id,
            primary_channel: None,
            trigger: None,
            started_at: 0.0,
        }
    }

    #[tokio::test]
    async fn gated_cycles_wait_for_release() {
        let processor = Arc::new(MockCycleProcessor::gated());
        let task = tokio::spawn({
            let processor = Arc::clone(&processor);
            async move { processor.process_cycle(request(1)).await }
        });
        assert!(processor.wait_for_calls(1, Duration::from_secs(1)).await);
        assert_eq!(processor.in_flight(), 1);

        processor.release();
        task.await.unwrap().unwrap();
        assert_eq!(processor.in_flight(), 0);
        assert_eq!(processor.requests().await[0].cycle_id, 1);
    }

    #[tokio::test]
    async fn failing_processor_returns_error() {
        let processor = MockCycleProcessor::failing("boom");
        assert!(processor.process_cycle(request(1)).await.is_err());
        assert_eq!(processor.call_count(), 1);
    }
}
