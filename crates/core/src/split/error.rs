//! Error types for the split engine.

use thiserror::Error;

/// Errors raised while dividing an expense.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// An expense must have at least one participant.
    #[error("Participant list is empty")]
    EmptyParticipants,

    /// The total amount must be a positive number of minor units.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(i64),
}
