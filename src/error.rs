//! Planner error abstractions.

use thiserror::Error;

/// Planner error variants.
///
/// None of these are retried internally. A failed planning pass leaves the caller's state
/// untouched, and the caller is expected to correct its input and resubmit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// The operator's intent can not be satisfied as declared.
    #[error("invalid intent: {0}")]
    InvalidIntent(String),
    /// The given node set contradicts the given placement, or some other caller error.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    /// The metrics snapshot carried an upstream query error, passed through verbatim.
    #[error("{0}")]
    UpstreamQuery(String),
}

impl PlannerError {
    /// Build an `InvalidIntent` error from anything string-like.
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidIntent(msg.into())
    }

    /// Build an `InconsistentState` error from anything string-like.
    pub(crate) fn inconsistent(msg: impl Into<String>) -> Self {
        Self::InconsistentState(msg.into())
    }
}

/// A result type where the error is a `PlannerError`.
pub type PlannerResult<T> = ::std::result::Result<T, PlannerError>;
