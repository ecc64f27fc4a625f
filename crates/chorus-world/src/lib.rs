// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! World-state store for the Chorus agent core.
//!
//! Holds every channel, message, reply thread and action record the agent
//! knows about, plus per-user profiles, memories, tool and search caches, a
//! media gallery and goals. Everything is in process memory and bounded;
//! nothing survives a restart.

pub mod state;
pub mod store;

pub use state::{UserKey, WorldState};
pub use store::WorldStateStore;
