//! Error types for the event bus.
//!
//! Every fallible public operation returns [`BusError`]. The taxonomy is
//! deliberately small: the variants here are raised synchronously at the
//! call site, while handler-side failures (payload type mismatches, panics
//! inside user callbacks) are contained at the worker boundary, logged, and
//! never surfaced through this type.

use thiserror::Error;

/// Errors reported at the public API boundary.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BusError {
    /// An operation other than construction was attempted before
    /// [`init`](crate::EventBus::init) succeeded, or after shutdown.
    #[error("event bus has not been initialized")]
    NotInitialized,

    /// The supplied configuration is invalid or contradictory.
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// What constraint was violated.
        reason: String,
    },

    /// A publish or subscribe targeted an event name absent from the table.
    #[error("event not registered: {name}")]
    NotRegistered {
        /// The unknown event name.
        name: String,
    },

    /// The publish variant does not match the configured task model.
    #[error("task model mismatch: {reason}")]
    TaskModelMismatch {
        /// Which combination was rejected.
        reason: String,
    },

    /// The task queue already holds `task_max` items; this publish submitted
    /// no further tasks.
    #[error("task queue is full")]
    QueueFull,
}

/// Specialized result type for event bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::NotInitialized => "not_initialized",
            BusError::Configuration { .. } => "configuration",
            BusError::NotRegistered { .. } => "not_registered",
            BusError::TaskModelMismatch { .. } => "task_model_mismatch",
            BusError::QueueFull => "queue_full",
        }
    }
}
