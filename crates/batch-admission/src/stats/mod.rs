//! # Batch statistics
//!
//! Observed execution costs of past batches, keyed by the batch size they
//! were executed at. The admission policy only ever reads from here through
//! the [`CostModel`] trait; whichever component executes batches is expected
//! to feed samples in.

mod cost_tracker;
mod model_batch_stats;
mod registry;

use std::time::Duration;

pub use cost_tracker::CostTracker;
pub use model_batch_stats::{BatchSizeStats, ModelBatchStats};
pub use registry::BatchStatsRegistry;

/// Read access to the mean execution cost of batches at a given size.
///
/// Implementations must be safe to query while other threads record new
/// samples, and a query must observe either the old or the new mean, never a
/// mix of both.
pub trait CostModel: Send + Sync {
    /// Mean cost of a batch executed at `batch_size`, or `None` when no batch
    /// of that size has been observed yet.
    fn mean_cost(&self, batch_size: usize) -> Option<Duration>;
}

impl<C: CostModel + ?Sized> CostModel for std::sync::Arc<C> {
    fn mean_cost(&self, batch_size: usize) -> Option<Duration> {
        (**self).mean_cost(batch_size)
    }
}

impl<C: CostModel + ?Sized> CostModel for &C {
    fn mean_cost(&self, batch_size: usize) -> Option<Duration> {
        (**self).mean_cost(batch_size)
    }
}
