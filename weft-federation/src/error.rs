//! Error types for federated evaluation
//!
//! Two distinct failure families, per the evaluation model:
//!
//! - [`FederationError`]: fatal to the pipeline that observes it. Raised by a
//!   member or sub-evaluator, carried across the worker/consumer boundary as
//!   a value, and surfaced on the consumer's next pull with its cause chain
//!   intact.
//! - [`ConditionError`]: recoverable, scoped to a single candidate solution.
//!   An optional-join filter treats it as "condition false for this
//!   candidate" and keeps evaluating.

use std::sync::Arc;
use thiserror::Error;
use weft_core::MemberId;

/// Fatal evaluation errors
#[derive(Error, Debug)]
pub enum FederationError {
    /// A federation member failed while answering a sub-plan
    #[error("member '{member}' failed: {reason}")]
    Member {
        /// The member that failed
        member: MemberId,
        /// Member-reported failure description
        reason: String,
    },

    /// Evaluation of a plan node failed
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl FederationError {
    /// Convenience constructor for member failures
    pub fn member(member: MemberId, reason: impl Into<String>) -> Self {
        FederationError::Member {
            member,
            reason: reason.into(),
        }
    }
}

/// Result type for federated evaluation
pub type Result<T> = std::result::Result<T, FederationError>;

/// Recoverable per-solution condition failures
///
/// Distinct from [`FederationError`]: a condition error never terminates a
/// pipeline. It is reported for the one candidate solution being filtered
/// and evaluation continues with the next candidate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    /// A variable used by the condition is not bound in the candidate
    #[error("variable '?{0}' is not bound")]
    UnboundVariable(Arc<str>),

    /// The two operands cannot be ordered against each other
    #[error("cannot compare {left} with {right}")]
    TypeMismatch {
        /// Kind of the left operand
        left: &'static str,
        /// Kind of the right operand
        right: &'static str,
    },

    /// The condition produced a non-boolean value
    #[error("condition evaluated to {0}, expected a boolean")]
    NotBoolean(&'static str),
}
