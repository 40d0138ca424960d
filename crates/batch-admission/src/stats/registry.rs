use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use super::model_batch_stats::ModelBatchStats;

type StatsKey = (String, String);
type StatsMap = HashMap<StatsKey, Arc<ModelBatchStats>>;

/// Batch statistics for every (model, op) pair served by the process.
///
/// Reads are lock-free through `ArcSwap`; registering a new pair copies the
/// map under a writer lock.
#[derive(Debug)]
pub struct BatchStatsRegistry {
    models: ArcSwap<StatsMap>,
    write_lock: Mutex<()>,
}

impl BatchStatsRegistry {
    pub fn new() -> Self {
        Self {
            models: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static BatchStatsRegistry {
        static GLOBAL: OnceLock<BatchStatsRegistry> = OnceLock::new();
        GLOBAL.get_or_init(BatchStatsRegistry::new)
    }

    /// Returns the statistics for `model_name` / `op_name`, creating them on
    /// first use.
    pub fn model(&self, model_name: &str, op_name: &str) -> Arc<ModelBatchStats> {
        let key = (model_name.to_string(), op_name.to_string());
        if let Some(stats) = self.models.load().get(&key) {
            return stats.clone();
        }

        let _guard = self.write_lock.lock();
        let current = self.models.load();
        if let Some(stats) = current.get(&key) {
            return stats.clone();
        }
        let stats = Arc::new(ModelBatchStats::new());
        let mut updated: StatsMap = (**current).clone();
        updated.insert(key, stats.clone());
        self.models.store(Arc::new(updated));
        stats
    }

    /// Names of every registered (model, op) pair.
    pub fn model_and_op_names(&self) -> Vec<(String, String)> {
        let mut names: Vec<StatsKey> = self.models.load().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for BatchStatsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
