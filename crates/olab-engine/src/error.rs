use chrono::{DateTime, Utc};
use olab_schemas::OrderStatus;

/// Typed failure taxonomy for every engine operation.
///
/// Each variant carries a stable machine code (see [`EngineError::code`])
/// that survives to the HTTP boundary, so callers can distinguish a missing
/// capability from a wrong state from a closed window without parsing text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Malformed or missing input. Recoverable by resubmitting.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The actor lacks the capability gating this action. Never retried.
    #[error("missing capability: {capability}")]
    Forbidden { capability: &'static str },

    /// The requested `(from, to)` pair is not in the transition table.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Edit attempted after the window closed, or production start attempted
    /// before it closed.
    #[error("outside the allowed edit window (deadline {deadline})")]
    EditWindowClosed { deadline: DateTime<Utc> },

    #[error("{what} not found")]
    NotFound { what: &'static str },

    /// Optimistic-concurrency version mismatch. Safe to retry after
    /// re-reading current state.
    #[error("version conflict: expected {expected}, current {current}")]
    Conflict { expected: u64, current: u64 },

    /// A dependency (catalog, persistence) failed. Safe to retry with
    /// backoff.
    #[error("upstream unavailable: {what}")]
    UpstreamUnavailable { what: String },
}

impl EngineError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_failed",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::EditWindowClosed { .. } => "edit_window_closed",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "version_conflict",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

impl From<olab_pricing::PricingError> for EngineError {
    fn from(err: olab_pricing::PricingError) -> Self {
        Self::Validation {
            reason: err.to_string(),
        }
    }
}
