// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chorus agent core.
//!
//! This crate provides the domain types (messages, channels, action records),
//! the shared error type, the level-triggered stale signal, and the traits
//! through which external collaborators (decision engine, platform senders,
//! node expansion directory) plug into the core.

pub mod error;
pub mod recording;
pub mod signal;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChorusError;
pub use signal::{StaleMark, StaleSignal};
pub use types::{
    ActionRecord, ActionStatus, Channel, ChannelMetadata, ChannelStatus, ChannelType, Message,
    Metadata, SenderInfo, WorldMetrics, now_secs,
};

pub use traits::{
    ActionSender, CycleOutcome, CycleProcessor, CycleRequest, DecisionEngine, DecisionRequest,
    NodeDirectory, NodeMetadata, OutboundAction, PlannedAction, SendReceipt,
};
