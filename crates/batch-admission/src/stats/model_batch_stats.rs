use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use super::CostModel;
use super::cost_tracker::CostTracker;

/// Statistics for batches executed at one particular size.
#[derive(Debug, Default)]
pub struct BatchSizeStats {
    tpu_cost: CostTracker,
}

impl BatchSizeStats {
    /// Cost of executing a batch of this size on the accelerator.
    pub fn tpu_cost(&self) -> &CostTracker {
        &self.tpu_cost
    }
}

type BatchSizeMap = HashMap<usize, Arc<BatchSizeStats>>;

/// # ModelBatchStats
///
/// Per-model batch statistics, keyed by executed batch size.
///
/// Lookups go through an `ArcSwap` snapshot of the size map and never take a
/// lock. Inserting a size that has not been seen before copies the map under
/// a writer lock; this only happens once per distinct size.
#[derive(Debug)]
pub struct ModelBatchStats {
    batch_sizes: ArcSwap<BatchSizeMap>,
    write_lock: Mutex<()>,
    cumulative_processed_size: AtomicU64,
}

impl ModelBatchStats {
    pub fn new() -> Self {
        Self {
            batch_sizes: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
            cumulative_processed_size: AtomicU64::new(0),
        }
    }

    /// Returns the statistics for `batch_size`, creating an empty entry on
    /// first use.
    pub fn batch_size(&self, batch_size: usize) -> Arc<BatchSizeStats> {
        if let Some(stats) = self.batch_sizes.load().get(&batch_size) {
            return stats.clone();
        }

        let _guard = self.write_lock.lock();
        let current = self.batch_sizes.load();
        if let Some(stats) = current.get(&batch_size) {
            return stats.clone();
        }
        let stats = Arc::new(BatchSizeStats::default());
        let mut updated: BatchSizeMap = (**current).clone();
        updated.insert(batch_size, stats.clone());
        self.batch_sizes.store(Arc::new(updated));
        stats
    }

    /// Statistics for `batch_size` if any have been created.
    pub fn get(&self, batch_size: usize) -> Option<Arc<BatchSizeStats>> {
        self.batch_sizes.load().get(&batch_size).cloned()
    }

    /// Every batch size that has an entry, in ascending order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.batch_sizes.load().keys().copied().collect();
        sizes.sort_unstable();
        sizes
    }

    /// Adds the number of real requests processed by one batch.
    pub fn register_processed_size(&self, size: u64) {
        self.cumulative_processed_size.fetch_add(size, Ordering::Relaxed);
    }

    /// Total number of real requests processed so far.
    pub fn cumulative_processed_size(&self) -> u64 {
        self.cumulative_processed_size.load(Ordering::Relaxed)
    }
}

impl Default for ModelBatchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CostModel for ModelBatchStats {
    fn mean_cost(&self, batch_size: usize) -> Option<Duration> {
        self.get(batch_size)?.tpu_cost().mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_batch_size_returns_same_entry() {
        let stats = ModelBatchStats::new();
        let first = stats.batch_size(4);
        let second = stats.batch_size(4);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stats.batch_sizes(), vec![4]);
    }

    #[test]
    fn test_mean_cost_absent_without_samples() {
        let stats = ModelBatchStats::new();
        assert_eq!(stats.mean_cost(4), None);

        // An entry with no samples still reports no data.
        stats.batch_size(4);
        assert_eq!(stats.mean_cost(4), None);
    }

    #[test]
    fn test_mean_cost_lookup_does_not_create_entries() {
        let stats = ModelBatchStats::new();
        assert_eq!(stats.mean_cost(16), None);
        assert!(stats.batch_sizes().is_empty());
    }

    #[test]
    fn test_mean_cost_reads_tpu_cost() {
        let stats = ModelBatchStats::new();
        stats.batch_size(8).tpu_cost().register(Duration::from_millis(12));
        stats.batch_size(8).tpu_cost().register(Duration::from_millis(16));
        stats.batch_size(2).tpu_cost().register(Duration::from_millis(3));

        assert_eq!(stats.mean_cost(8), Some(Duration::from_millis(14)));
        assert_eq!(stats.mean_cost(2), Some(Duration::from_millis(3)));
        assert_eq!(stats.batch_sizes(), vec![2, 8]);
    }

    #[test]
    fn test_concurrent_inserts_keep_existing_entries_readable() {
        let stats = Arc::new(ModelBatchStats::new());
        stats.batch_size(4).tpu_cost().register(Duration::from_millis(10));

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let size = 100 + writer * 50 + i;
                        stats.batch_size(size).tpu_cost().register(Duration::from_millis(size as u64));
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..2)
            .map(|_| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        assert_eq!(stats.mean_cost(4), Some(Duration::from_millis(10)));
                        assert_eq!(stats.mean_cost(8), None);
                    }
                })
            })
            .collect();
        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        let sizes = stats.batch_sizes();
        assert_eq!(sizes.len(), 201);
        assert_eq!(sizes.first(), Some(&4));
        assert_eq!(sizes.last(), Some(&299));
        assert_eq!(stats.mean_cost(4), Some(Duration::from_millis(10)));
        assert_eq!(stats.mean_cost(150), Some(Duration::from_millis(150)));
    }

    #[test]
    fn test_cumulative_processed_size() {
        let stats = ModelBatchStats::new();
        stats.register_processed_size(5);
        stats.register_processed_size(3);
        assert_eq!(stats.cumulative_processed_size(), 8);
    }
}
