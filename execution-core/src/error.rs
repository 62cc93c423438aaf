//! Errors surfaced by the public API. Transient execution failures (packet loss, an empty
//! book side) are never raised as errors: they are reified as `ExecutionResult { success: false, .. }`
//! and stay on the parent's execution history. Only validation and misuse surface here.

use common::ParentOrderId;
use thiserror::Error;

/// Recoverable errors from submitting or managing parent orders.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Submission failed validation; the parent was created and immediately entered
    /// `REJECTED` so `status()` can still report on it.
    #[error("parent {parent_id} rejected: {reason}")]
    Rejected {
        /// The rejected parent's id.
        parent_id: ParentOrderId,
        /// Why validation failed.
        reason: String,
    },

    /// No parent order exists with this id.
    #[error("parent order {0} not found")]
    ParentNotFound(ParentOrderId),

    /// The parent has already reached a terminal state and cannot be acted on further.
    #[error("parent order {0} is already in a terminal state")]
    AlreadyTerminal(ParentOrderId),
}

/// Result alias for the public API.
pub type CoreResult<T> = Result<T, CoreError>;
