// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processing side of the Chorus agent core.
//!
//! The [`ProcessingCoordinator`] turns world-state changes into rate-limited
//! decision cycles, [`PayloadCycleProcessor`] runs one cycle against a
//! decision engine, and one [`ActionScheduler`] per platform paces the
//! outbound actions that come out of it.

pub mod coordinator;
pub mod processor;
pub mod scheduler;
pub mod shutdown;

pub use coordinator::{CoordinatorState, CycleReport, ProcessingCoordinator, ProcessingStatus};
pub use processor::PayloadCycleProcessor;
pub use scheduler::{ActionScheduler, EnqueueOutcome, SchedulerStats};
