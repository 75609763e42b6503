//! Member-access interface
//!
//! The federation layer never talks to members directly; it goes through a
//! [`FederationSource`]. Implementations own connection handling, retries,
//! and whatever wire protocol the members speak - none of which belongs
//! here.

use crate::algebra::{Operator, TriplePattern};
use crate::error::Result;
use crate::execute::PlanEvaluator;
use crate::stream::{BoxedStream, CompatibleFilterStream};
use async_trait::async_trait;
use std::sync::Arc;
use weft_core::{MemberId, Solution};

/// Access to the federation's members
#[async_trait]
pub trait FederationSource: Send + Sync {
    /// Evaluate a leaf triple pattern
    ///
    /// Emitted solutions carry the input solution's bindings merged with the
    /// pattern's matches. With `member` set, matching is restricted to that
    /// member's data; otherwise the whole federation answers.
    async fn evaluate_pattern(
        &self,
        pattern: &TriplePattern,
        input: &Solution,
        member: Option<&MemberId>,
    ) -> Result<BoxedStream>;

    /// Let a member evaluate an entire sub-plan it owns
    ///
    /// `Ok(None)` means the member offers no whole-plan evaluation for this
    /// sub-plan; the caller falls back to generic evaluation with pattern
    /// matching scoped to the member.
    async fn evaluate_member_owned(
        &self,
        member: &MemberId,
        plan: &Operator,
        input: &Solution,
    ) -> Result<Option<BoxedStream>>;

    /// Evaluate a left join that is not well-designed under the input
    ///
    /// Called when the input solution binds a variable that is free in the
    /// optional side but not in the required side, which makes the pipelined
    /// evaluation incorrect. The default strategy evaluates the left join
    /// against the input stripped of the problem variables - well-designed
    /// again, so it re-enters the pipelined path - and then keeps only
    /// results compatible with the full input, merged with it.
    async fn evaluate_badly_designed_left_join(
        &self,
        evaluator: &dyn PlanEvaluator,
        left_join: &Operator,
        input: &Solution,
        problem_variables: &[Arc<str>],
    ) -> Result<BoxedStream> {
        let reduced = input.without(problem_variables);
        let inner = evaluator.evaluate(left_join, &reduced).await?;
        Ok(Box::new(CompatibleFilterStream::new(inner, input.clone())))
    }
}
