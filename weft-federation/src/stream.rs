//! Lazy solution streams
//!
//! A [`SolutionStream`] is a pull-based, finite, non-restartable sequence of
//! solutions. `next()` may suspend (waiting on member I/O or a producer
//! task); `close()` releases resources and is idempotent. Streams also close
//! on drop, so a stream abandoned mid-flight (for example by a cancelled
//! worker) still tears down everything it owns.
//!
//! This module provides the trait plus the small combinators the pipelines
//! are assembled from.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use weft_core::Solution;

/// A lazy, finite, single-consumer stream of solutions
///
/// Contract:
/// - `next()` returns `Ok(None)` exactly once at end-of-stream, and keeps
///   returning `Ok(None)` afterwards and after `close()`.
/// - `close()` is safe to call at any point, including before full
///   consumption, and multiple times. It reports a pending evaluation
///   failure rather than suppressing it.
/// - Background work feeding a stream is cancelled by `close()` (or drop),
///   never by the consumer reaching into it.
#[async_trait]
pub trait SolutionStream: Send {
    /// Pull the next solution
    async fn next(&mut self) -> Result<Option<Solution>>;

    /// Release resources held by this stream
    fn close(&mut self) -> Result<()>;
}

/// Boxed stream for dynamic dispatch
pub type BoxedStream = Box<dyn SolutionStream>;

/// The empty stream
pub struct EmptyStream;

#[async_trait]
impl SolutionStream for EmptyStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A stream of exactly one solution
pub struct SingletonStream {
    solution: Option<Solution>,
}

impl SingletonStream {
    /// Create a stream yielding `solution` once
    pub fn new(solution: Solution) -> Self {
        Self {
            solution: Some(solution),
        }
    }
}

#[async_trait]
impl SolutionStream for SingletonStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        Ok(self.solution.take())
    }

    fn close(&mut self) -> Result<()> {
        self.solution = None;
        Ok(())
    }
}

/// A stream over already-materialized solutions
pub struct IterStream {
    solutions: std::vec::IntoIter<Solution>,
}

impl IterStream {
    /// Create a stream over `solutions`, in order
    pub fn new(solutions: Vec<Solution>) -> Self {
        Self {
            solutions: solutions.into_iter(),
        }
    }
}

#[async_trait]
impl SolutionStream for IterStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        Ok(self.solutions.next())
    }

    fn close(&mut self) -> Result<()> {
        self.solutions = Vec::new().into_iter();
        Ok(())
    }
}

/// Concatenation of streams: exhausts each in turn
///
/// Used for union branches. Every input stream is closed exactly once -
/// when it is exhausted, or at `close()` time for the ones not yet reached.
pub struct ConcatStream {
    streams: VecDeque<BoxedStream>,
    closed: bool,
}

impl ConcatStream {
    /// Create a concatenation over `streams`, in order
    pub fn new(streams: Vec<BoxedStream>) -> Self {
        Self {
            streams: streams.into(),
            closed: false,
        }
    }
}

#[async_trait]
impl SolutionStream for ConcatStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let Some(current) = self.streams.front_mut() else {
                return Ok(None);
            };
            if let Some(solution) = current.next().await? {
                return Ok(Some(solution));
            }
            if let Some(mut exhausted) = self.streams.pop_front() {
                exhausted.close()?;
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut result = Ok(());
        for stream in &mut self.streams {
            if let Err(e) = stream.close() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        self.streams.clear();
        result
    }
}

impl Drop for ConcatStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Keeps only solutions compatible with a reference solution, merged with it
///
/// Used by the badly-designed left-join strategy: the left join is evaluated
/// against a reduced input, and this stream re-imposes the full input
/// bindings on the way out.
pub struct CompatibleFilterStream {
    inner: BoxedStream,
    reference: Solution,
    closed: bool,
}

impl CompatibleFilterStream {
    /// Wrap `inner`, keeping solutions compatible with `reference`
    pub fn new(inner: BoxedStream, reference: Solution) -> Self {
        Self {
            inner,
            reference,
            closed: false,
        }
    }
}

#[async_trait]
impl SolutionStream for CompatibleFilterStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let Some(solution) = self.inner.next().await? else {
                return Ok(None);
            };
            if let Some(merged) = solution.merged(&self.reference) {
                return Ok(Some(merged));
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

impl Drop for CompatibleFilterStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::Value;

    fn sol(var: &str, n: i64) -> Solution {
        Solution::new().with(var, Value::long(n))
    }

    async fn drain(mut stream: impl SolutionStream) -> Vec<Solution> {
        let mut out = Vec::new();
        while let Some(s) = stream.next().await.unwrap() {
            out.push(s);
        }
        out
    }

    #[tokio::test]
    async fn test_singleton_yields_once() {
        let mut s = SingletonStream::new(sol("x", 1));
        assert_eq!(s.next().await.unwrap(), Some(sol("x", 1)));
        assert_eq!(s.next().await.unwrap(), None);
        assert_eq!(s.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concat_preserves_order() {
        let streams: Vec<BoxedStream> = vec![
            Box::new(IterStream::new(vec![sol("x", 1), sol("x", 2)])),
            Box::new(EmptyStream),
            Box::new(IterStream::new(vec![sol("x", 3)])),
        ];
        let out = drain(ConcatStream::new(streams)).await;
        assert_eq!(out, vec![sol("x", 1), sol("x", 2), sol("x", 3)]);
    }

    #[tokio::test]
    async fn test_concat_close_is_idempotent() {
        let streams: Vec<BoxedStream> = vec![Box::new(IterStream::new(vec![sol("x", 1)]))];
        let mut concat = ConcatStream::new(streams);
        concat.close().unwrap();
        concat.close().unwrap();
        assert_eq!(concat.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_compatible_filter_merges_reference() {
        let inner = IterStream::new(vec![
            sol("y", 1),
            sol("x", 9).with("y", Value::long(2)), // conflicts with reference ?x=1
            sol("y", 3),
        ]);
        let reference = sol("x", 1);
        let out = drain(CompatibleFilterStream::new(Box::new(inner), reference)).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("x"), Some(&Value::long(1)));
        assert_eq!(out[0].get("y"), Some(&Value::long(1)));
        assert_eq!(out[1].get("y"), Some(&Value::long(3)));
    }
}
