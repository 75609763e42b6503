//! Concurrent inner-join pipeline
//!
//! Evaluates `Join(left, right)` as a producer/consumer pipeline: a worker
//! task iterates the left stream and evaluates the right sub-plan per left
//! solution, while the consumer is still draining the right-hand results of
//! earlier solutions. Right-hand sub-streams travel from worker to consumer
//! through a bounded [`handoff`](crate::handoff); the consumer flattens them
//! into a single output stream.
//!
//! Output order is the sequential nested-loop order: left solutions in
//! production order, and within each, the right sub-plan's order. The
//! pipelining overlaps latency only - it never reorders.
//!
//! # Cancellation
//!
//! `close()` signals a watch channel the worker observes at every suspension
//! point, closes the handoff (unblocking a producer awaiting capacity), and
//! returns without waiting on the worker. The worker exits its loop, closes
//! the left stream itself, and never reports cancellation as an error.

use crate::algebra::Operator;
use crate::error::Result;
use crate::execute::PlanEvaluator;
use crate::handoff::{handoff, HandoffReceiver, HandoffSender};
use crate::stream::{BoxedStream, SolutionStream};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use weft_core::Solution;

/// Builds the per-left-solution inner stream a pipeline worker hands off
///
/// The inner join builds `evaluate(right, s)` directly; the optional join
/// wraps the same evaluation with its filter-or-fallback combinators.
#[async_trait]
pub(crate) trait InnerStreamBuilder: Send {
    /// Build the inner stream for one left solution
    async fn build(&mut self, left_solution: Solution) -> Result<BoxedStream>;
}

/// Consumer half shared by the join and optional-join pipelines: flattens
/// the worker's sub-streams in arrival order.
pub(crate) struct PipelineCore {
    inner_streams: HandoffReceiver<BoxedStream>,
    current: Option<BoxedStream>,
    cancel: watch::Sender<bool>,
    closed: bool,
}

/// Spawn a pipeline worker and return the consumer half
///
/// Must be called within a tokio runtime; the worker starts immediately.
pub(crate) fn spawn_pipeline<B>(left: BoxedStream, builder: B, capacity: usize) -> PipelineCore
where
    B: InnerStreamBuilder + 'static,
{
    let (tx, rx) = handoff(capacity);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(pipeline_worker(left, builder, tx, cancel_rx));
    PipelineCore {
        inner_streams: rx,
        current: None,
        cancel: cancel_tx,
        closed: false,
    }
}

/// One worker per pipeline: iterates the left stream, builds the inner
/// stream per solution, hands it to the consumer. Exits on left exhaustion,
/// cancellation, error, or a consumer that has closed the handoff.
async fn pipeline_worker<B>(
    mut left: BoxedStream,
    mut builder: B,
    mut out: HandoffSender<BoxedStream>,
    mut cancel: watch::Receiver<bool>,
) where
    B: InnerStreamBuilder,
{
    loop {
        let pulled = tokio::select! {
            biased;
            _ = cancel.changed() => break,
            pulled = left.next() => pulled,
        };
        let left_solution = match pulled {
            Ok(Some(solution)) => solution,
            Ok(None) => break,
            Err(error) => {
                out.fail(error).await;
                break;
            }
        };

        let built = tokio::select! {
            biased;
            _ = cancel.changed() => break,
            built = builder.build(left_solution) => built,
        };
        let inner = match built {
            Ok(stream) => stream,
            Err(error) => {
                out.fail(error).await;
                break;
            }
        };

        // A dropped send future (cancellation) or rejected send (consumer
        // closed) drops the inner stream, which closes it.
        let delivered = tokio::select! {
            biased;
            _ = cancel.changed() => break,
            delivered = out.send(inner) => delivered,
        };
        if !delivered {
            break;
        }
    }

    if let Err(error) = left.close() {
        tracing::debug!(%error, "left stream close failed in pipeline worker");
    }
    tracing::trace!("pipeline worker exited");
    out.finish();
}

impl PipelineCore {
    pub(crate) async fn next(&mut self) -> Result<Option<Solution>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(solution) = current.next().await? {
                    return Ok(Some(solution));
                }
                if let Some(mut exhausted) = self.current.take() {
                    exhausted.close()?;
                }
            }
            match self.inner_streams.recv().await? {
                Some(stream) => self.current = Some(stream),
                None => return Ok(None),
            }
        }
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Wake the worker at its next suspension point; it may already be
        // gone, which is fine.
        let _ = self.cancel.send(true);

        let mut result = Ok(());
        if let Some(mut current) = self.current.take() {
            if let Err(error) = current.close() {
                result = Err(error);
            }
        }
        if let Err(error) = self.inner_streams.close() {
            if result.is_ok() {
                result = Err(error);
            }
        }
        result
    }
}

impl Drop for PipelineCore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

struct JoinStreamBuilder {
    right: Arc<Operator>,
    evaluator: Arc<dyn PlanEvaluator>,
}

#[async_trait]
impl InnerStreamBuilder for JoinStreamBuilder {
    async fn build(&mut self, left_solution: Solution) -> Result<BoxedStream> {
        self.evaluator.evaluate(&self.right, &left_solution).await
    }
}

/// Concurrent inner-join stream
///
/// Flattens, in order, the right sub-plan's results for every left
/// solution. Equivalent to the sequential nested-loop join
/// `flatten(map(s -> evaluate(right, s), left))`.
pub struct ConcurrentJoinStream {
    core: PipelineCore,
}

impl ConcurrentJoinStream {
    /// Start the pipeline; the worker begins iterating `left` immediately
    pub fn spawn(
        left: BoxedStream,
        right: Arc<Operator>,
        evaluator: Arc<dyn PlanEvaluator>,
        capacity: usize,
    ) -> Self {
        let builder = JoinStreamBuilder { right, evaluator };
        Self {
            core: spawn_pipeline(left, builder, capacity),
        }
    }
}

#[async_trait]
impl SolutionStream for ConcurrentJoinStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        self.core.next().await
    }

    fn close(&mut self) -> Result<()> {
        self.core.close()
    }
}
