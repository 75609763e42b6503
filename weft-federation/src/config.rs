//! Federation evaluation configuration

use crate::handoff::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};

/// Configuration for federated evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Queue depth between each join pipeline's worker and its consumer.
    ///
    /// Bounds how far a worker can run ahead of a slow consumer, and with
    /// it the pipeline's memory footprint (queued stream handles, not their
    /// materialized results). Affects throughput only - results and their
    /// order are identical at any capacity.
    pub handoff_capacity: usize,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            handoff_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl FederationConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handoff queue depth (clamped to >= 1)
    pub fn with_handoff_capacity(mut self, capacity: usize) -> Self {
        self.handoff_capacity = capacity.max(1);
        self
    }
}
