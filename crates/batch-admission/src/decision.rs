//! # Batch-down decision
//!
//! Decides, once per formed batch, whether to leave it for the execution layer
//! to pad up or to trim it down to a smaller allowed batch size.

use std::time::Duration;
use tracing::{debug, error, trace};
use crate::batch::Batch;
use crate::error::AdmissionError;
use crate::policy::BatchPaddingPolicy;
use crate::sizes::{next_allowed_batch_size, prev_allowed_batch_size};
use crate::stats::CostModel;

/// Why a batch was left as formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The policy is [`BatchPaddingPolicy::PadUp`].
    PolicyPadsUp,
    /// Cost-based trimming was requested without any batch statistics.
    MissingCostModel,
    /// The batch already sits on an allowed size, or cannot be padded.
    AlreadyAllowed,
    /// No allowed size is smaller than the batch.
    NoSmallerSize,
    /// At least one candidate size has no cost observations yet.
    InsufficientStatistics,
    /// Padding up costs less per real request than trimming down.
    PadUpCheaper,
}

/// Result of [`maybe_batch_down`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchDownOutcome {
    Unchanged(SkipReason),
    Trimmed { from: usize, to: usize },
}

impl BatchDownOutcome {
    pub fn is_trimmed(&self) -> bool {
        matches!(self, BatchDownOutcome::Trimmed { .. })
    }
}

/// Trims `batch` down to the previous allowed batch size when `policy` asks
/// for it.
///
/// Trimmed tasks are appended to `out_trimmed_tasks` in the order they had in
/// the batch; the caller is responsible for re-queuing them. `stats` is only
/// consulted by [`BatchPaddingPolicy::MinimizeCostPerRequest`]. This function
/// never fails: every problem leaves the batch untouched so the execution
/// layer pads it up as usual.
pub fn maybe_batch_down<T>(
    batch: &mut Batch<T>,
    allowed_batch_sizes: &[usize],
    disable_padding: bool,
    policy: BatchPaddingPolicy,
    stats: Option<&dyn CostModel>,
    out_trimmed_tasks: &mut Vec<T>,
) -> BatchDownOutcome {
    let cost_model = match policy {
        // Padding up is what the execution layer does on its own.
        BatchPaddingPolicy::PadUp => {
            return BatchDownOutcome::Unchanged(SkipReason::PolicyPadsUp);
        }
        BatchPaddingPolicy::BatchDown => None,
        BatchPaddingPolicy::MinimizeCostPerRequest => match stats {
            Some(stats) => Some(stats),
            None => {
                error!(error = %AdmissionError::MissingCostModel, "batch padding misconfigured");
                return BatchDownOutcome::Unchanged(SkipReason::MissingCostModel);
            }
        },
    };

    let batch_size = batch.size();

    let pad_up_size = next_allowed_batch_size(batch_size, allowed_batch_sizes, disable_padding);
    if pad_up_size == batch_size {
        return BatchDownOutcome::Unchanged(SkipReason::AlreadyAllowed);
    }

    let batch_down_size = prev_allowed_batch_size(batch_size, allowed_batch_sizes, disable_padding);
    if batch_down_size == batch_size || batch_down_size == 0 {
        return BatchDownOutcome::Unchanged(SkipReason::NoSmallerSize);
    }

    if let Some(cost_model) = cost_model {
        let (Some(down_batch_cost), Some(up_batch_cost)) = (
            cost_model.mean_cost(batch_down_size),
            cost_model.mean_cost(pad_up_size),
        ) else {
            trace!(batch_size, batch_down_size, pad_up_size, "no batch cost data yet; padding up");
            return BatchDownOutcome::Unchanged(SkipReason::InsufficientStatistics);
        };

        // Padding does no useful work, so the pad-up cost is spread over the
        // real requests only.
        let batch_down_cost_per_request = cost_per_request(down_batch_cost, batch_down_size);
        let pad_up_cost_per_request = cost_per_request(up_batch_cost, batch_size);

        if pad_up_cost_per_request < batch_down_cost_per_request {
            trace!(
                batch_size,
                ?pad_up_cost_per_request,
                ?batch_down_cost_per_request,
                "padding up is cheaper per request"
            );
            return BatchDownOutcome::Unchanged(SkipReason::PadUpCheaper);
        }
    }

    if !batch.try_trim_to_new_size(batch_down_size, out_trimmed_tasks) {
        return BatchDownOutcome::Unchanged(SkipReason::NoSmallerSize);
    }
    debug!(from = batch_size, to = batch_down_size, %policy, "batched down");
    BatchDownOutcome::Trimmed { from: batch_size, to: batch_down_size }
}

#[inline]
fn cost_per_request(batch_cost: Duration, requests: usize) -> Duration {
    batch_cost / u32::try_from(requests).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use proptest::prelude::*;
    use crate::stats::ModelBatchStats;

    struct FixedCosts(HashMap<usize, Duration>);

    impl FixedCosts {
        fn new(costs: &[(usize, u64)]) -> Self {
            Self(costs.iter().map(|&(size, ms)| (size, Duration::from_millis(ms))).collect())
        }
    }

    impl CostModel for FixedCosts {
        fn mean_cost(&self, batch_size: usize) -> Option<Duration> {
            self.0.get(&batch_size).copied()
        }
    }

    fn batch_of(size: usize) -> Batch<usize> {
        (0..size).collect()
    }

    #[test]
    fn test_pad_up_never_trims() {
        let mut batch = batch_of(5);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[2, 4, 8], false, BatchPaddingPolicy::PadUp, None, &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::PolicyPadsUp));
        assert_eq!(batch.size(), 5);
        assert!(trimmed.is_empty());
    }

    #[test]
    fn test_batch_down_trims_to_previous_size() {
        let mut batch = batch_of(5);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[2, 4, 8], false, BatchPaddingPolicy::BatchDown, None, &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Trimmed { from: 5, to: 4 });
        assert_eq!(batch.tasks(), &[0, 1, 2, 3]);
        assert_eq!(trimmed, vec![4]);
    }

    #[test]
    fn test_batch_down_on_allowed_size_is_noop() {
        let mut batch = batch_of(4);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[2, 4, 8], false, BatchPaddingPolicy::BatchDown, None, &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::AlreadyAllowed));
        assert_eq!(batch.size(), 4);
        assert!(trimmed.is_empty());
    }

    #[test]
    fn test_batch_down_without_smaller_size() {
        let mut batch = batch_of(3);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[4, 8], false, BatchPaddingPolicy::BatchDown, None, &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::NoSmallerSize));
        assert_eq!(batch.size(), 3);
    }

    #[test]
    fn test_batch_down_above_largest_size_is_noop() {
        let mut batch = batch_of(10);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[2, 4, 8], false, BatchPaddingPolicy::BatchDown, None, &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::AlreadyAllowed));
        assert_eq!(batch.size(), 10);
    }

    #[test]
    fn test_batch_down_with_padding_disabled_is_noop() {
        let mut batch = batch_of(5);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[2, 4, 8], true, BatchPaddingPolicy::BatchDown, None, &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::AlreadyAllowed));
        assert_eq!(batch.size(), 5);
    }

    #[test]
    fn test_minimize_cost_without_stats_falls_back_to_pad_up() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut batch = batch_of(5);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[4, 8], false, BatchPaddingPolicy::MinimizeCostPerRequest, None, &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::MissingCostModel));
        assert_eq!(batch.size(), 5);
        assert!(trimmed.is_empty());
    }

    #[test]
    fn test_minimize_cost_trims_when_down_is_cheaper() {
        let costs = FixedCosts::new(&[(4, 10), (8, 14)]);
        let mut batch = batch_of(5);
        let mut trimmed = vec![];

        // 10ms / 4 = 2.5ms per request down, 14ms / 5 = 2.8ms per request up.
        let outcome = maybe_batch_down(
            &mut batch, &[4, 8], false, BatchPaddingPolicy::MinimizeCostPerRequest, Some(&costs), &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Trimmed { from: 5, to: 4 });
        assert_eq!(trimmed, vec![4]);
    }

    #[test]
    fn test_minimize_cost_pads_up_when_up_is_cheaper() {
        let costs = FixedCosts::new(&[(4, 10), (8, 10)]);
        let mut batch = batch_of(5);
        let mut trimmed = vec![];

        // 10ms / 5 = 2ms per request up beats 2.5ms down.
        let outcome = maybe_batch_down(
            &mut batch, &[4, 8], false, BatchPaddingPolicy::MinimizeCostPerRequest, Some(&costs), &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::PadUpCheaper));
        assert_eq!(batch.size(), 5);
        assert!(trimmed.is_empty());
    }

    #[test]
    fn test_minimize_cost_trims_on_equal_cost() {
        // 8ms / 4 = 2ms down, 12ms / 6 = 2ms up.
        let costs = FixedCosts::new(&[(4, 8), (8, 12)]);
        let mut batch = batch_of(6);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[4, 8], false, BatchPaddingPolicy::MinimizeCostPerRequest, Some(&costs), &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Trimmed { from: 6, to: 4 });
        assert_eq!(trimmed, vec![4, 5]);
    }

    #[test]
    fn test_minimize_cost_without_observations_is_noop() {
        for costs in [FixedCosts::new(&[]), FixedCosts::new(&[(4, 10)]), FixedCosts::new(&[(8, 10)])] {
            let mut batch = batch_of(5);
            let mut trimmed = vec![];

            let outcome = maybe_batch_down(
                &mut batch, &[4, 8], false, BatchPaddingPolicy::MinimizeCostPerRequest, Some(&costs), &mut trimmed,
            );

            assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::InsufficientStatistics));
            assert_eq!(batch.size(), 5);
        }
    }

    #[test]
    fn test_zero_allowed_size_is_never_a_target() {
        let costs = FixedCosts::new(&[(0, 1), (4, 10)]);
        let mut batch = batch_of(2);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[0, 4], false, BatchPaddingPolicy::MinimizeCostPerRequest, Some(&costs), &mut trimmed,
        );

        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::NoSmallerSize));
        assert_eq!(batch.size(), 2);
        assert!(trimmed.is_empty());

        let mut batch = batch_of(3);
        let outcome = maybe_batch_down(
            &mut batch, &[0, 4], false, BatchPaddingPolicy::BatchDown, None, &mut trimmed,
        );
        assert_eq!(outcome, BatchDownOutcome::Unchanged(SkipReason::NoSmallerSize));
    }

    #[test]
    fn test_minimize_cost_with_model_batch_stats() {
        let stats = ModelBatchStats::new();
        stats.batch_size(4).tpu_cost().register(Duration::from_millis(10));
        stats.batch_size(8).tpu_cost().register(Duration::from_millis(14));
        let mut batch = batch_of(5);
        let mut trimmed = vec![];

        let outcome = maybe_batch_down(
            &mut batch, &[8, 4], false, BatchPaddingPolicy::MinimizeCostPerRequest, Some(&stats), &mut trimmed,
        );

        assert!(outcome.is_trimmed());
        assert_eq!(batch.size(), 4);
    }

    proptest! {
        #[test]
        fn prop_trim_preserves_order(
            size in 1usize..64,
            allowed in proptest::collection::vec(1usize..64, 1..8),
        ) {
            let mut batch = batch_of(size);
            let mut trimmed = vec![];

            let outcome = maybe_batch_down(
                &mut batch, &allowed, false, BatchPaddingPolicy::BatchDown, None, &mut trimmed,
            );

            let kept = batch.size();
            prop_assert_eq!(kept + trimmed.len(), size);
            prop_assert_eq!(batch.tasks(), &(0..kept).collect::<Vec<_>>()[..]);
            prop_assert_eq!(trimmed, (kept..size).collect::<Vec<_>>());
            if let BatchDownOutcome::Trimmed { to, .. } = outcome {
                prop_assert!(allowed.contains(&to));
                prop_assert_eq!(to, kept);
            } else {
                prop_assert_eq!(kept, size);
            }
        }

        #[test]
        fn prop_second_decision_is_noop(
            size in 1usize..64,
            allowed in proptest::collection::vec(1usize..64, 1..8),
        ) {
            let mut batch = batch_of(size);
            let mut trimmed = vec![];
            maybe_batch_down(&mut batch, &allowed, false, BatchPaddingPolicy::BatchDown, None, &mut trimmed);
            let after_first = batch.clone();

            let mut trimmed_again = vec![];
            let outcome = maybe_batch_down(
                &mut batch, &allowed, false, BatchPaddingPolicy::BatchDown, None, &mut trimmed_again,
            );

            prop_assert!(!outcome.is_trimmed());
            prop_assert_eq!(batch, after_first);
            prop_assert!(trimmed_again.is_empty());
        }
    }
}
