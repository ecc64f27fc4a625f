// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chorus agent core.

use thiserror::Error;

/// The primary error type used across Chorus collaborator traits and core operations.
///
/// Duplicate inserts and rate-limit denials are deliberately *not* represented
/// here: those are normal outcomes reported through return values.
#[derive(Debug, Error)]
pub enum ChorusError {
    /// Configuration errors (invalid values discovered at runtime).
    #[error("configuration error: {0}")]
    Config(String),

    /// The downstream cycle processor failed.
    #[error("cycle processor error: {message}")]
    Processor {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The decision engine failed to produce a decision.
    #[error("decision engine error: {message}")]
    Engine {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An outbound platform send failed.
    #[error("send error on {platform}: {message}")]
    Send {
        platform: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity (channel, action, node) does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Payload serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChorusError {
    /// Shorthand for a processor failure without an underlying source.
    pub fn processor(message: impl Into<String>) -> Self {
        Self::Processor {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a decision engine failure without an underlying source.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
            source: None,
        }
    }
}
