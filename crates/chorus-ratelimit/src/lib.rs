// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate limiting for the Chorus agent core.
//!
//! The limiter is plain synchronous state over sliding windows. Callers
//! pass the current time explicitly and share the limiter behind a
//! `tokio::sync::Mutex` when several tasks consult it.

pub mod limiter;
pub mod window;

pub use limiter::{RateDecision, RateLimitStatus, RateLimiter, WindowUsage, format_wait};
pub use window::RateWindow;
