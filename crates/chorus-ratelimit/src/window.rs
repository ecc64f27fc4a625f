// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding time window of event timestamps.

use std::collections::VecDeque;

/// FIFO of event timestamps younger than `length_secs`.
///
/// The window is `(now - length, now]`: an event exactly `length` old has
/// already left it, so a denial computed from the oldest event always waits
/// a positive time. Pruning is lazy: callers prune with the current time
/// before reading.
#[derive(Debug, Clone)]
pub struct RateWindow {
    length_secs: f64,
    events: VecDeque<f64>,
}

impl RateWindow {
    pub fn new(length_secs: f64) -> Self {
        Self {
            length_secs,
            events: VecDeque::new(),
        }
    }

    /// Drop every event at or before `now - length`.
    pub fn prune(&mut self, now: f64) {
        let cutoff = now - self.length_secs;
        while self.events.front().is_some_and(|&t| t <= cutoff) {
            self.events.pop_front();
        }
    }

    pub fn record(&mut self, now: f64) {
        self.events.push_back(now);
    }

    /// Events inside the window ending at `now`, without pruning.
    pub fn count_since(&self, now: f64, span_secs: f64) -> usize {
        let cutoff = now - span_secs;
        self.events.iter().rev().take_while(|&&t| t > cutoff).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seconds until the oldest event leaves the window (0 if empty).
    pub fn time_until_oldest_expires(&self, now: f64) -> f64 {
        self.events
            .front()
            .map_or(0.0, |&oldest| (oldest + self.length_secs - now).max(0.0))
    }
}
