//! Scoped condition filtering
//!
//! [`ScopedFilterStream`] post-filters an optional join's right-hand matches
//! with the join condition. The condition only sees variables inside the
//! join's own scope: bindings that exist merely as an artifact of the
//! evaluator's traversal (for example the outer query's bindings flowing
//! through the input solution) must not leak into the condition, or query
//! semantics silently change.
//!
//! A condition error on a candidate means "no match for this candidate",
//! not a failed stream - standard optional-join error semantics.

use crate::error::Result;
use crate::expression::{self, Expression};
use crate::stream::{BoxedStream, SolutionStream};
use async_trait::async_trait;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use weft_core::Solution;

/// Filters a stream with a condition evaluated over a restricted scope
pub struct ScopedFilterStream {
    inner: BoxedStream,
    condition: Option<Expression>,
    scope: FxHashSet<Arc<str>>,
    closed: bool,
}

impl ScopedFilterStream {
    /// Wrap `inner` with `condition` evaluated over `scope`
    ///
    /// With no condition the stream is a pass-through.
    pub fn new(
        inner: BoxedStream,
        condition: Option<Expression>,
        scope: FxHashSet<Arc<str>>,
    ) -> Self {
        Self {
            inner,
            condition,
            scope,
            closed: false,
        }
    }
}

#[async_trait]
impl SolutionStream for ScopedFilterStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let Some(solution) = self.inner.next().await? else {
                return Ok(None);
            };
            let Some(condition) = &self.condition else {
                return Ok(Some(solution));
            };
            let scoped = solution.project(&self.scope);
            match expression::evaluate(condition, &scoped) {
                Ok(true) => return Ok(Some(solution)),
                Ok(false) => {}
                Err(error) => {
                    tracing::trace!(%error, "condition error, candidate filtered out");
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }
}

impl Drop for ScopedFilterStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::IterStream;
    use weft_core::Value;

    fn sol(pairs: &[(&str, i64)]) -> Solution {
        pairs.iter().fold(Solution::new(), |s, (var, n)| {
            s.with(*var, Value::long(*n))
        })
    }

    fn scope(vars: &[&str]) -> FxHashSet<Arc<str>> {
        vars.iter().map(|v| Arc::from(*v)).collect()
    }

    #[tokio::test]
    async fn test_filters_by_condition() {
        let inner = IterStream::new(vec![
            sol(&[("age", 16)]),
            sol(&[("age", 21)]),
            sol(&[("age", 30)]),
        ]);
        let condition = Expression::gt(Expression::var("age"), Expression::value(Value::long(18)));
        let mut stream =
            ScopedFilterStream::new(Box::new(inner), Some(condition), scope(&["age"]));

        assert_eq!(stream.next().await.unwrap(), Some(sol(&[("age", 21)])));
        assert_eq!(stream.next().await.unwrap(), Some(sol(&[("age", 30)])));
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_condition_error_filters_candidate() {
        // Second candidate lacks ?age entirely: the unbound-variable error
        // must skip the candidate, not end the stream.
        let inner = IterStream::new(vec![
            sol(&[("age", 21)]),
            sol(&[("other", 1)]),
            sol(&[("age", 30)]),
        ]);
        let condition = Expression::gt(Expression::var("age"), Expression::value(Value::long(18)));
        let mut stream =
            ScopedFilterStream::new(Box::new(inner), Some(condition), scope(&["age"]));

        assert_eq!(stream.next().await.unwrap(), Some(sol(&[("age", 21)])));
        assert_eq!(stream.next().await.unwrap(), Some(sol(&[("age", 30)])));
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_out_of_scope_bindings_are_invisible() {
        // ?secret is bound in the solution but outside the scope: the
        // condition must see it as unbound, so the candidate is filtered.
        let inner = IterStream::new(vec![sol(&[("age", 21), ("secret", 1)])]);
        let condition = Expression::bound("secret");
        let mut stream =
            ScopedFilterStream::new(Box::new(inner), Some(condition), scope(&["age"]));

        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_condition_is_pass_through() {
        let inner = IterStream::new(vec![sol(&[("x", 1)]), sol(&[("x", 2)])]);
        let mut stream = ScopedFilterStream::new(Box::new(inner), None, scope(&[]));

        assert_eq!(stream.next().await.unwrap(), Some(sol(&[("x", 1)])));
        assert_eq!(stream.next().await.unwrap(), Some(sol(&[("x", 2)])));
        assert_eq!(stream.next().await.unwrap(), None);
    }
}
