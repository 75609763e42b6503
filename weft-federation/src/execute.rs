//! Plan evaluation dispatcher
//!
//! [`FederationEvaluator`] walks the plan tree and selects the evaluation
//! strategy per operator:
//!
//! - `Join` / `NaryJoin`: recursively evaluate the first argument, then wrap
//!   one concurrent join pipeline per remaining argument, left to right.
//!   Each pipeline's worker starts the moment it is constructed.
//! - `LeftJoin`: pipelined optional join when well-designed under the input
//!   solution; otherwise delegated to the source's badly-designed strategy.
//! - `Union`: both branches evaluated eagerly (independently, not pipelined
//!   against each other) and concatenated.
//! - `MemberOwned`: the member may evaluate the sub-plan wholesale; if it
//!   declines, generic evaluation proceeds with pattern matching scoped to
//!   that member.
//! - `Pattern`: handed to the federation source.
//!
//! Errors during pipeline construction (for example the left side failing
//! before any worker exists) propagate synchronously to the caller;
//! pipelines never swallow construction-time errors.
//!
//! The n-ary fold is strictly left-to-right with no reordering - operator
//! ordering is the upstream planner's job, not this layer's.

use crate::algebra::Operator;
use crate::config::FederationConfig;
use crate::error::Result;
use crate::join::ConcurrentJoinStream;
use crate::optional::ConcurrentLeftJoinStream;
use crate::source::FederationSource;
use crate::stream::{BoxedStream, ConcatStream, SingletonStream};
use async_trait::async_trait;
use std::sync::Arc;
use weft_core::{MemberId, Solution};

/// Recursive plan evaluation
///
/// The single operation the engine exposes, and the seam the pipelines
/// recurse through: a join worker evaluates its right sub-plan per left
/// solution by calling back into this trait.
///
/// Emitted solutions carry the input solution's bindings merged in. The
/// returned stream is finite (unless a member's data is infinite), single
/// consumer, and safe to close at any point.
#[async_trait]
pub trait PlanEvaluator: Send + Sync {
    /// Evaluate an operator subtree against an input solution
    async fn evaluate(&self, operator: &Operator, input: &Solution) -> Result<BoxedStream>;
}

/// Dispatching evaluator over a federation source
#[derive(Clone)]
pub struct FederationEvaluator {
    source: Arc<dyn FederationSource>,
    config: FederationConfig,
    /// Set while evaluating inside a member-owned subtree: leaf patterns
    /// match only this member's data.
    member_scope: Option<MemberId>,
}

impl FederationEvaluator {
    /// Create an evaluator with the default configuration
    pub fn new(source: Arc<dyn FederationSource>) -> Self {
        Self::with_config(source, FederationConfig::default())
    }

    /// Create an evaluator with an explicit configuration
    pub fn with_config(source: Arc<dyn FederationSource>, config: FederationConfig) -> Self {
        Self {
            source,
            config,
            member_scope: None,
        }
    }

    fn scoped_to(&self, member: MemberId) -> Self {
        let mut scoped = self.clone();
        scoped.member_scope = Some(member);
        scoped
    }

    fn shared(&self) -> Arc<dyn PlanEvaluator> {
        Arc::new(self.clone())
    }

    fn pipelined_join(&self, left: BoxedStream, right: &Operator) -> BoxedStream {
        Box::new(ConcurrentJoinStream::spawn(
            left,
            Arc::new(right.clone()),
            self.shared(),
            self.config.handoff_capacity,
        ))
    }
}

#[async_trait]
impl PlanEvaluator for FederationEvaluator {
    async fn evaluate(&self, operator: &Operator, input: &Solution) -> Result<BoxedStream> {
        match operator {
            Operator::Pattern(pattern) => {
                self.source
                    .evaluate_pattern(pattern, input, self.member_scope.as_ref())
                    .await
            }
            Operator::Join { left, right } => {
                let left_stream = self.evaluate(left, input).await?;
                Ok(self.pipelined_join(left_stream, right))
            }
            Operator::NaryJoin { args } => {
                let Some(first) = args.first() else {
                    // Joining nothing yields the input itself.
                    return Ok(Box::new(SingletonStream::new(input.clone())));
                };
                let mut stream = self.evaluate(first, input).await?;
                for arg in &args[1..] {
                    stream = self.pipelined_join(stream, arg);
                }
                Ok(stream)
            }
            Operator::LeftJoin {
                left,
                right,
                condition,
            } => {
                let problem_vars = problem_variables(input, left, right);
                if problem_vars.is_empty() {
                    let left_stream = self.evaluate(left, input).await?;
                    Ok(Box::new(ConcurrentLeftJoinStream::spawn(
                        left_stream,
                        Arc::new(right.as_ref().clone()),
                        condition.clone(),
                        operator.free_variables(),
                        self.shared(),
                        self.config.handoff_capacity,
                    )))
                } else {
                    tracing::debug!(
                        variables = ?problem_vars,
                        "left join not well-designed under input bindings, delegating"
                    );
                    self.source
                        .evaluate_badly_designed_left_join(self, operator, input, &problem_vars)
                        .await
                }
            }
            Operator::Union { left, right } => {
                let left_stream = self.evaluate(left, input).await?;
                let right_stream = match self.evaluate(right, input).await {
                    Ok(stream) => stream,
                    Err(error) => {
                        let mut left_stream = left_stream;
                        let _ = left_stream.close();
                        return Err(error);
                    }
                };
                Ok(Box::new(ConcatStream::new(vec![left_stream, right_stream])))
            }
            Operator::MemberOwned { member, arg } => {
                if let Some(stream) = self
                    .source
                    .evaluate_member_owned(member, arg, input)
                    .await?
                {
                    return Ok(stream);
                }
                let scoped = self.scoped_to(member.clone());
                scoped.evaluate(arg, input).await
            }
        }
    }
}

/// Variables that break well-designedness: bound by the input, free in the
/// optional side, and not free in the required side.
fn problem_variables(input: &Solution, left: &Operator, right: &Operator) -> Vec<Arc<str>> {
    let left_free = left.free_variables();
    let right_free = right.free_variables();
    let mut vars: Vec<Arc<str>> = input
        .bound_vars()
        .filter(|var| right_free.contains(*var) && !left_free.contains(*var))
        .cloned()
        .collect();
    vars.sort();
    vars
}
