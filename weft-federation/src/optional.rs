//! Concurrent left-join (OPTIONAL) pipeline
//!
//! Structurally the same producer/consumer pipeline as the inner join
//! (`join.rs`); only the per-left-solution inner stream differs. For each
//! left solution `s` the worker hands off
//!
//! ```text
//! FallbackStream(
//!     ScopedFilterStream(evaluate(right, s), condition, scope),
//!     SingletonStream(s),
//! )
//! ```
//!
//! so `s` surfaces merged with each right-hand match that passes the
//! condition, or unchanged exactly once if nothing matches - never zero
//! times, never both.
//!
//! Closing the output closes the *current* fallback stream, which in turn
//! closes both of its branches.

use crate::algebra::Operator;
use crate::error::Result;
use crate::execute::PlanEvaluator;
use crate::expression::Expression;
use crate::fallback::FallbackStream;
use crate::filter::ScopedFilterStream;
use crate::join::{spawn_pipeline, InnerStreamBuilder, PipelineCore};
use crate::stream::{BoxedStream, SingletonStream, SolutionStream};
use async_trait::async_trait;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use weft_core::Solution;

struct OptionalStreamBuilder {
    right: Arc<Operator>,
    condition: Option<Expression>,
    scope: Arc<FxHashSet<Arc<str>>>,
    evaluator: Arc<dyn PlanEvaluator>,
}

#[async_trait]
impl InnerStreamBuilder for OptionalStreamBuilder {
    async fn build(&mut self, left_solution: Solution) -> Result<BoxedStream> {
        let matches = self
            .evaluator
            .evaluate(&self.right, &left_solution)
            .await?;
        let filtered = ScopedFilterStream::new(
            matches,
            self.condition.clone(),
            self.scope.as_ref().clone(),
        );
        Ok(Box::new(FallbackStream::new(
            Box::new(filtered),
            Box::new(SingletonStream::new(left_solution)),
        )))
    }
}

/// Concurrent left-outer-join stream (OPTIONAL semantics)
///
/// Only valid for left joins that are well-designed under the input
/// solution; the dispatcher routes everything else elsewhere.
pub struct ConcurrentLeftJoinStream {
    core: PipelineCore,
}

impl ConcurrentLeftJoinStream {
    /// Start the pipeline; the worker begins iterating `left` immediately
    ///
    /// `scope` is the variable scope the condition may observe - the left
    /// join's own variables, not whatever else the input solution binds.
    pub fn spawn(
        left: BoxedStream,
        right: Arc<Operator>,
        condition: Option<Expression>,
        scope: FxHashSet<Arc<str>>,
        evaluator: Arc<dyn PlanEvaluator>,
        capacity: usize,
    ) -> Self {
        let builder = OptionalStreamBuilder {
            right,
            condition,
            scope: Arc::new(scope),
            evaluator,
        };
        Self {
            core: spawn_pipeline(left, builder, capacity),
        }
    }
}

#[async_trait]
impl SolutionStream for ConcurrentLeftJoinStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        self.core.next().await
    }

    fn close(&mut self) -> Result<()> {
        self.core.close()
    }
}
