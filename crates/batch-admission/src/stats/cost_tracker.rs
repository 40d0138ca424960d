use std::time::Duration;
use parking_lot::Mutex;

/// Running mean of execution costs.
///
/// The sum and the sample count sit behind a single lock so the mean is
/// always computed from a consistent pair.
#[derive(Debug, Default)]
pub struct CostTracker {
    inner: Mutex<CostSamples>,
}

#[derive(Debug, Default, Clone, Copy)]
struct CostSamples {
    total: Duration,
    count: u64,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observed cost.
    pub fn register(&self, cost: Duration) {
        let mut samples = self.inner.lock();
        samples.total = samples.total.saturating_add(cost);
        samples.count += 1;
    }

    /// Mean of all registered costs, `None` before the first sample.
    pub fn mean(&self) -> Option<Duration> {
        let samples = *self.inner.lock();
        if samples.count == 0 {
            return None;
        }
        let mean_nanos = samples.total.as_nanos() / u128::from(samples.count);
        Some(Duration::from_nanos(u64::try_from(mean_nanos).unwrap_or(u64::MAX)))
    }

    /// Number of registered samples.
    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }
}
