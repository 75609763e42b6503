//! Bounded producer/consumer handoff
//!
//! The handoff carries lazily-produced items from exactly one producer task
//! to exactly one consumer, with a fixed queue depth. It is created per
//! pipeline and never shared across pipelines.
//!
//! Built on a bounded mpsc channel of `Result` items:
//!
//! - end-of-stream is the channel closing (producer dropped or
//!   [`HandoffSender::finish`]), not a sentinel value;
//! - failures travel in-band, in order with items, so a failure reported
//!   concurrently with end-of-stream still reaches the consumer;
//! - consumer-side [`HandoffReceiver::close`] stops accepting items, drains
//!   the queue without blocking, and reports the first pending failure
//!   instead of suppressing it. A producer awaiting queue capacity is
//!   unblocked by the close and observes a rejected send.

use crate::error::{FederationError, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Default queue depth: large enough to let the producer run well ahead of
/// a slow consumer without unbounded memory growth.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Create a bounded handoff with the given queue depth (clamped to >= 1)
///
/// Capacity affects concurrency and throughput only, never results or
/// their order.
pub fn handoff<T: Send>(capacity: usize) -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        HandoffSender { tx: Some(tx) },
        HandoffReceiver { rx, done: false },
    )
}

/// Producer half of a handoff
pub struct HandoffSender<T> {
    tx: Option<mpsc::Sender<Result<T>>>,
}

impl<T: Send> HandoffSender<T> {
    /// Hand one item to the consumer
    ///
    /// Suspends while the queue is full. Returns `false` - dropping the
    /// item, without error - once the consumer has closed the handoff; the
    /// producer should stop at that point.
    pub async fn send(&mut self, item: T) -> bool {
        match &self.tx {
            Some(tx) => tx.send(Ok(item)).await.is_ok(),
            None => false,
        }
    }

    /// Report a failure to be raised on the consumer side
    ///
    /// Failures queue in order with items; each is raised by the pull that
    /// reaches it. Returns `false` if the consumer is gone.
    pub async fn fail(&mut self, error: FederationError) -> bool {
        match &self.tx {
            Some(tx) => tx.send(Err(error)).await.is_ok(),
            None => false,
        }
    }

    /// Mark end-of-stream: no further `send` or `fail` will occur
    ///
    /// Dropping the sender has the same effect; `finish` just makes the
    /// intent explicit at the producer's exit point.
    pub fn finish(&mut self) {
        self.tx = None;
    }
}

/// Consumer half of a handoff
pub struct HandoffReceiver<T> {
    rx: mpsc::Receiver<Result<T>>,
    done: bool,
}

impl<T: Send> HandoffReceiver<T> {
    /// Pull the next item
    ///
    /// Suspends while the queue is empty and the producer is still running.
    /// Raises a pending failure in queue order. Returns `Ok(None)` at
    /// end-of-stream, and keeps doing so on subsequent calls.
    pub async fn recv(&mut self) -> Result<Option<T>> {
        if self.done {
            return Ok(None);
        }
        match self.rx.recv().await {
            Some(Ok(item)) => Ok(Some(item)),
            Some(Err(error)) => Err(error),
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }

    /// Close the handoff from the consumer side
    ///
    /// Rejects any further sends (unblocking a producer awaiting capacity),
    /// discards buffered items without blocking, and returns the first
    /// pending failure found in the queue, if any.
    pub fn close(&mut self) -> Result<()> {
        self.rx.close();
        let mut pending = None;
        loop {
            match self.rx.try_recv() {
                Ok(Ok(item)) => drop(item),
                Ok(Err(error)) => {
                    if pending.is_none() {
                        pending = Some(error);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.done = true;
        match pending {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
