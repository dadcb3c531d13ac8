//! Domain-specific errors.

use thiserror::Error;

/// Failure reported by the host's native expression engine.
///
/// The message is surfaced to the user verbatim and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvaluationError {
    pub message: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reasons the generator declines to produce a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// The node is detached, not an element, or belongs to the tool's own overlay.
    #[error("node cannot be selected")]
    NotSelectable,
    /// Every strategy failed verification, including the positional fallback.
    #[error("no locator resolves uniquely to the node")]
    NoLocatorPossible,
}
