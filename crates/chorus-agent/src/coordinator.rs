// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processing coordinator: turns stale marks into at most one running
//! decision cycle at a time.
//!
//! The loop waits on the store's [`StaleSignal`] with an interval timeout.
//! A wake that arrives while a cycle is running is dropped; the stale flag
//! stays set, so the next timeout picks it up. There is never a queue of
//! pending cycles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chorus_config::model::ProcessingConfig;
use chorus_core::error::ChorusError;
use chorus_core::recording;
use chorus_core::signal::StaleSignal;
use chorus_core::traits::{CycleOutcome, CycleProcessor, CycleRequest};
use chorus_core::types::now_secs;
use chorus_ratelimit::{RateLimitStatus, RateLimiter};
use chorus_world::WorldStateStore;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    CycleRunning,
    Stopped,
}

impl CoordinatorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::CycleRunning,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorState::Idle => write!(f, "idle"),
            CoordinatorState::CycleRunning => write!(f, "cycle_running"),
            CoordinatorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Snapshot returned by [`ProcessingCoordinator::processing_status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingStatus {
    /// Whether the wait/dispatch loop is alive.
    pub running: bool,
    pub stale: bool,
    /// Whether a cycle currently holds the run guard.
    pub locked: bool,
    pub cycles_processed: u64,
    pub processing_errors: u64,
    pub last_cycle_time: Option<f64>,
    pub state: CoordinatorState,
    pub last_trigger: Option<String>,
}

/// What happened to one cycle attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    Completed { cycle_id: u64, outcome: CycleOutcome },
    RateLimited { wait_secs: f64, reason: String },
    Failed { cycle_id: u64, error: String },
}

struct Shared {
    store: Arc<WorldStateStore>,
    signal: Arc<StaleSignal>,
    processor: Arc<dyn CycleProcessor>,
    limiter: Arc<Mutex<RateLimiter>>,
    config: ProcessingConfig,
    retention_secs: ArcSwapOption<u64>,
    run_guard: Arc<Mutex<()>>,
    state: AtomicU8,
    loop_running: AtomicBool,
    next_cycle_id: AtomicU64,
    cycles_processed: AtomicU64,
    processing_errors: AtomicU64,
    last_cycle_time: ArcSwapOption<f64>,
    last_trigger: ArcSwapOption<String>,
}

struct LoopHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives decision cycles off the world state's stale signal.
pub struct ProcessingCoordinator {
    shared: Arc<Shared>,
    handle: Mutex<Option<LoopHandle>>,
}

impl ProcessingCoordinator {
    pub fn new(
        store: Arc<WorldStateStore>,
        processor: Arc<dyn CycleProcessor>,
        limiter: Arc<Mutex<RateLimiter>>,
        config: ProcessingConfig,
    ) -> Self {
        let signal = store.signal();
        Self {
            shared: Arc::new(Shared {
                store,
                signal,
                processor,
                limiter,
                config,
                retention_secs: ArcSwapOption::empty(),
                run_guard: Arc::new(Mutex::new(())),
                state: AtomicU8::new(CoordinatorState::Idle as u8),
                loop_running: AtomicBool::new(false),
                next_cycle_id: AtomicU64::new(1),
                cycles_processed: AtomicU64::new(0),
                processing_errors: AtomicU64::new(0),
                last_cycle_time: ArcSwapOption::empty(),
                last_trigger: ArcSwapOption::empty(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Reap non-active channels idle longer than `secs` before each cycle.
    pub fn with_channel_retention(self, secs: Option<u64>) -> Self {
        self.set_channel_retention(secs);
        self
    }

    /// Change the channel retention; takes effect from the next cycle,
    /// including on a running loop. `None` disables reaping.
    pub fn set_channel_retention(&self, secs: Option<u64>) {
        self.shared.retention_secs.store(secs.map(Arc::new));
    }

    pub fn store(&self) -> &Arc<WorldStateStore> {
        &self.shared.store
    }

    pub fn limiter(&self) -> &Arc<Mutex<RateLimiter>> {
        &self.shared.limiter
    }

    /// Mark the world state stale. Marks before the next wake coalesce.
    pub fn mark_stale(&self, reason: &str, details: Option<serde_json::Value>) {
        self.shared.signal.mark(reason, details);
    }

    /// Spawn the wait/dispatch loop. Returns `false` if it is already running.
    pub async fn start(&self) -> bool {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return false;
        }

        let cancel = CancellationToken::new();
        let shared = Arc::clone(&self.shared);
        shared.set_state(CoordinatorState::Idle);
        shared.loop_running.store(true, Ordering::Release);

        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = run_loop(Arc::clone(&shared), loop_cancel).await {
                error!(error = %e, "processing loop failed, coordinator stopped");
            }
            shared.loop_running.store(false, Ordering::Release);
            shared.set_state(CoordinatorState::Stopped);
        });

        info!(
            interval_ms = self.shared.config.cycle_interval_ms,
            "processing coordinator started"
        );
        *handle = Some(LoopHandle { cancel, task });
        true
    }

    /// Cancel the loop and wait for a running cycle to finish.
    pub async fn stop(&self) {
        let Some(handle) = self.handle.lock().await.take() else {
            return;
        };
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            warn!(error = %e, "processing loop task ended abnormally");
        }
        let _guard = self.shared.run_guard.lock().await;
        self.shared.set_state(CoordinatorState::Stopped);
        info!("processing coordinator stopped");
    }

    /// Run one cycle now unless one is already running.
    ///
    /// Returns `None` when a cycle holds the run guard.
    pub async fn force_cycle(&self) -> Option<CycleReport> {
        let guard = Arc::clone(&self.shared.run_guard).try_lock_owned().ok()?;
        self.shared.signal.clear();
        let report = self
            .shared
            .run_cycle(Some("forced".to_string()), guard)
            .await;
        Some(report)
    }

    pub fn processing_status(&self) -> ProcessingStatus {
        let shared = &self.shared;
        ProcessingStatus {
            running: shared.loop_running.load(Ordering::Acquire),
            stale: shared.signal.is_stale(),
            locked: shared.run_guard.try_lock().is_err(),
            cycles_processed: shared.cycles_processed.load(Ordering::Relaxed),
            processing_errors: shared.processing_errors.load(Ordering::Relaxed),
            last_cycle_time: shared.last_cycle_time.load_full().map(|t| *t),
            state: shared.state(),
            last_trigger: shared.last_trigger.load_full().map(|t| (*t).clone()),
        }
    }

    pub async fn rate_limit_status(&self, now: f64) -> RateLimitStatus {
        self.shared.limiter.lock().await.status(now)
    }
}

impl Shared {
    fn state(&self) -> CoordinatorState {
        CoordinatorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: CoordinatorState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Enter `CycleRunning` unless the coordinator is stopped.
    fn begin_cycle(&self) {
        let _ = self.state.compare_exchange(
            CoordinatorState::Idle as u8,
            CoordinatorState::CycleRunning as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn end_cycle(&self) {
        let _ = self.state.compare_exchange(
            CoordinatorState::CycleRunning as u8,
            CoordinatorState::Idle as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Execute one cycle while holding the run guard. The guard is released
    /// when this returns.
    async fn run_cycle(&self, trigger: Option<String>, _guard: OwnedMutexGuard<()>) -> CycleReport {
        self.begin_cycle();
        let now = now_secs();

        {
            let mut limiter = self.limiter.lock().await;
            let decision = limiter.can_process_cycle(now);
            if !decision.allowed {
                let reason = decision.describe();
                info!(wait_secs = decision.wait_secs, %reason, "cycle rate limited");
                recording::record_cycle("rate_limited");
                self.end_cycle();
                return CycleReport::RateLimited {
                    wait_secs: decision.wait_secs,
                    reason,
                };
            }
            limiter.record_cycle(now);
        }

        let cycle_id = self.next_cycle_id.fetch_add(1, Ordering::Relaxed);
        self.last_trigger.store(trigger.clone().map(Arc::new));

        if let Some(secs) = self.retention_secs.load_full() {
            let reaped = self.store.reap_inactive_channels(now, *secs as f64).await;
            if !reaped.is_empty() {
                debug!(cycle_id, count = reaped.len(), "reaped inactive channels");
            }
        }

        let request = CycleRequest {
            cycle_id,
            primary_channel: None,
            trigger,
            started_at: now,
        };
        debug!(cycle_id, trigger = ?request.trigger, "starting cycle");

        let started = Instant::now();
        let result = self.processor.process_cycle(request).await;
        let elapsed = started.elapsed().as_secs_f64();
        recording::record_cycle_duration(elapsed);

        let report = match result {
            Ok(outcome) => {
                self.cycles_processed.fetch_add(1, Ordering::Relaxed);
                self.last_cycle_time.store(Some(Arc::new(now_secs())));
                recording::record_cycle("completed");
                info!(
                    cycle_id,
                    actions = outcome.actions_recorded,
                    mode = ?outcome.payload_mode,
                    elapsed_ms = (elapsed * 1000.0) as u64,
                    "cycle completed"
                );
                CycleReport::Completed { cycle_id, outcome }
            }
            Err(e) => {
                self.processing_errors.fetch_add(1, Ordering::Relaxed);
                recording::record_cycle("failed");
                error!(cycle_id, error = %e, "cycle failed");
                CycleReport::Failed {
                    cycle_id,
                    error: e.to_string(),
                }
            }
        };
        self.end_cycle();
        report
    }
}

async fn run_loop(shared: Arc<Shared>, cancel: CancellationToken) -> Result<(), ChorusError> {
    let interval = Duration::from_millis(shared.config.cycle_interval_ms);
    let backoff = Duration::from_millis(shared.config.error_backoff_ms);
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        let woken = tokio::select! {
            _ = cancel.cancelled() => {
                info!("shutdown signal received, stopping processing loop");
                break;
            }
            _ = shared.signal.notified() => true,
            _ = tokio::time::sleep(interval) => false,
        };

        if !shared.signal.is_stale() {
            trace!(woken, "no pending changes");
            continue;
        }

        let Ok(guard) = Arc::clone(&shared.run_guard).try_lock_owned() else {
            debug!(woken, "cycle already running, dropping wake");
            continue;
        };

        // The previous cycle has released the guard, so its task is done.
        if let Some(previous) = in_flight.take() {
            previous
                .await
                .map_err(|e| ChorusError::Internal(format!("cycle task failed: {e}")))?;
        }

        shared.signal.clear();
        let trigger = shared.signal.last_mark().map(|m| m.reason.clone());
        let cycle_shared = Arc::clone(&shared);
        in_flight = Some(tokio::spawn(async move {
            let report = cycle_shared.run_cycle(trigger, guard).await;
            if matches!(report, CycleReport::Failed { .. }) {
                tokio::time::sleep(backoff).await;
            }
        }));
    }

    Ok(())
}
