// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Level-triggered "world state is stale" signal.
//!
//! A single flag plus a single-permit [`Notify`]. Any number of marks before
//! the waiter wakes collapse into one wake-up; there is never a queue of
//! pending triggers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::trace;

/// Why the state was last marked stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleMark {
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub marked_at: f64,
}

/// Shared stale flag owned by the world-state store and observed by the
/// processing coordinator.
#[derive(Debug, Default)]
pub struct StaleSignal {
    stale: AtomicBool,
    marks: AtomicU64,
    last_mark: ArcSwapOption<StaleMark>,
    notify: Notify,
}

impl StaleSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake the waiter (if any).
    pub fn mark(&self, reason: &str, details: Option<serde_json::Value>) {
        self.last_mark.store(Some(Arc::new(StaleMark {
            reason: reason.to_string(),
            details,
            marked_at: crate::types::now_secs(),
        })));
        self.marks.fetch_add(1, Ordering::Relaxed);
        let was_stale = self.stale.swap(true, Ordering::AcqRel);
        trace!(reason, was_stale, "state marked stale");
        self.notify.notify_one();
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn clear(&self) -> bool {
        self.stale.swap(false, Ordering::AcqRel)
    }

    /// Resolves once `mark` has been called since the last wake-up.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    pub fn last_mark(&self) -> Option<Arc<StaleMark>> {
        self.last_mark.load_full()
    }

    /// Total number of marks, including coalesced ones.
    pub fn mark_count(&self) -> u64 {
        self.marks.load(Ordering::Relaxed)
    }
}
