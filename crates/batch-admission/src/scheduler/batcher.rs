use std::collections::VecDeque;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};
use crate::config::SharedPaddingConfig;
use crate::stats::ModelBatchStats;
use super::batch_loop::{batching_loop, WaitingQueue};
use super::handler::BatchHandler;
use super::item::Item;
use super::queue_item::QueueItem;
use super::worker::BatchWorkerHandle;

/// Submits requests to a batching scheduler.
#[async_trait]
pub trait Batcher<T, Q> {
    /// Queues `item` for processing.
    ///
    /// # Returns
    ///
    /// An `Item` that resolves to the output once the batch containing the
    /// request has been executed
    async fn run(&self, item: T) -> Item<Q>;
}

/// # PaddedBatchScheduler
///
/// Batches requests for a [`BatchHandler`], trimming every formed batch
/// according to a live [`SharedPaddingConfig`] and recording per-size execution
/// costs into [`ModelBatchStats`].
///
/// `S` is the largest number of requests taken from the queue for one batch.
///
/// # Example
///
/// ```ignore
/// let config = PaddingConfig::builder()
///     .allowed_batch_sizes([2, 4, 8])
///     .policy(BatchPaddingPolicy::MinimizeCostPerRequest)
///     .build()?;
/// let stats = BatchStatsRegistry::global().model("resnet", "serve");
/// let scheduler = PaddedBatchScheduler::<_, 8>::new(MyHandler, config, stats);
///
/// let output = scheduler.run(input).await.await?;
/// ```
pub struct PaddedBatchScheduler<H: BatchHandler, const S: usize> {
    waiting_requests: WaitingQueue<H>,
    config: SharedPaddingConfig,
    stats: Arc<ModelBatchStats>,
    handle: BatchWorkerHandle,
}

impl<H: BatchHandler, const S: usize> PaddedBatchScheduler<H, S> {
    /// Starts the batching loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new(
        handler: H,
        config: impl Into<SharedPaddingConfig>,
        stats: Arc<ModelBatchStats>,
    ) -> Self {
        let waiting_requests: WaitingQueue<H> = Arc::new(Mutex::new(VecDeque::new()));
        let config = config.into();

        let handle = BatchWorkerHandle::spawn({
            let waiting_requests = waiting_requests.clone();
            let config = config.clone();
            let stats = stats.clone();
            move |running, notifier| async move {
                batching_loop::<H, S>(
                    &handler,
                    running,
                    notifier,
                    waiting_requests,
                    config,
                    stats,
                ).await;
            }
        });

        Self {
            waiting_requests,
            config,
            stats,
            handle,
        }
    }

    /// The live configuration; storing a new one affects the next batch.
    pub fn config(&self) -> &SharedPaddingConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<ModelBatchStats> {
        &self.stats
    }

    /// Number of requests waiting for a batch slot.
    pub async fn queued(&self) -> usize {
        self.waiting_requests.lock().await.len()
    }
}

#[async_trait]
impl<H: BatchHandler, const S: usize> Batcher<H::Input, H::Output> for PaddedBatchScheduler<H, S> {
    async fn run(&self, item: H::Input) -> Item<H::Output> {
        let (tx, rx) = oneshot::channel();
        let queue_item = QueueItem::new(item, tx);
        {
            let mut requests = self.waiting_requests.lock().await;
            requests.push_back(queue_item);
        }
        self.handle.notify();
        Item::new(rx)
    }
}
