//! Primary-or-fallback stream selection
//!
//! An optional join needs "the right-hand matches, or the left solution
//! unchanged if there are none". [`FallbackStream`] implements exactly that
//! choice: the first pull decides - once - whether the primary yields
//! anything, and the stream serves the chosen branch for the rest of its
//! lifetime. Sequences are single-pass, so a primary that was empty on the
//! first pull can never become non-empty later.

use crate::error::Result;
use crate::stream::{BoxedStream, SolutionStream};
use async_trait::async_trait;
use weft_core::Solution;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Committed {
    Primary,
    Fallback,
}

/// Serves the primary stream if it yields anything, else the fallback
pub struct FallbackStream {
    primary: BoxedStream,
    fallback: BoxedStream,
    committed: Option<Committed>,
    closed: bool,
}

impl FallbackStream {
    /// Create a fallback stream
    pub fn new(primary: BoxedStream, fallback: BoxedStream) -> Self {
        Self {
            primary,
            fallback,
            committed: None,
            closed: false,
        }
    }
}

#[async_trait]
impl SolutionStream for FallbackStream {
    async fn next(&mut self) -> Result<Option<Solution>> {
        if self.closed {
            return Ok(None);
        }
        match self.committed {
            None => match self.primary.next().await? {
                Some(solution) => {
                    self.committed = Some(Committed::Primary);
                    Ok(Some(solution))
                }
                None => {
                    self.committed = Some(Committed::Fallback);
                    self.fallback.next().await
                }
            },
            Some(Committed::Primary) => self.primary.next().await,
            Some(Committed::Fallback) => self.fallback.next().await,
        }
    }

    /// Closes **both** branches, regardless of which one was chosen: the
    /// unchosen branch may still hold open resources (an unread member
    /// connection, a running pipeline).
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let primary = self.primary.close();
        let fallback = self.fallback.close();
        primary.and(fallback)
    }
}

impl Drop for FallbackStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
