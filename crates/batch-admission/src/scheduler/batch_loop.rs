use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use futures::FutureExt;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio::time::error::Elapsed;
use tracing::{debug, error, trace, warn};
use crate::batch::Batch;
use crate::config::SharedPaddingConfig;
use crate::stats::ModelBatchStats;
use super::handler::BatchHandler;
use super::queue_item::QueueItem;

pub(crate) type WaitingQueue<H> = Arc<Mutex<VecDeque<QueueItem<<H as BatchHandler>::Input, <H as BatchHandler>::Output>>>>;

/// Forms, trims and executes batches until `running` is cleared.
///
/// Each iteration takes up to `S` requests from the head of the queue, applies
/// the admission policy from the current configuration snapshot and puts any
/// trimmed requests back at the head of the queue, ahead of everything that
/// arrived later.
pub(crate) async fn batching_loop<H: BatchHandler, const S: usize>(
    handler: &H,
    running: Arc<AtomicBool>,
    notifier: Arc<Notify>,
    waiting_requests: WaitingQueue<H>,
    config: SharedPaddingConfig,
    stats: Arc<ModelBatchStats>,
) {
    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        if !has_waiting_requests(&waiting_requests).await {
            // No work to do, wait for notification or check periodically
            let timeout = timeout_await_notifier(&notifier).await;
            if timeout.is_err() {
                continue;
            }
        }

        let mut batch = drain_possible_requests(S, &waiting_requests).await;
        if batch.is_empty() {
            continue;
        }

        let config = config.load();
        let mut overflow = Vec::new();
        let outcome = config.maybe_batch_down(&mut batch, Some(&*stats), &mut overflow);
        trace!(?outcome, size = batch.size(), "admission decision");
        requeue_front(&waiting_requests, overflow).await;

        let padded_size = config.padded_size(batch.size());
        process_batch(handler, batch, padded_size, &stats).await;
    }
}

/// Executes one batch, replies to each request and records the batch cost
/// under the size it was executed at.
async fn process_batch<H: BatchHandler>(
    handler: &H,
    batch: Batch<QueueItem<H::Input, H::Output>>,
    padded_size: usize,
    stats: &ModelBatchStats,
) {
    let size = batch.size();
    let (inputs, senders): (Vec<_>, Vec<_>) = batch.into_iter()
        .map(QueueItem::into_parts)
        .unzip();

    let start = Instant::now();
    let outputs = match AssertUnwindSafe(handler.process(inputs, padded_size)).catch_unwind().await {
        Ok(outputs) => outputs,
        Err(_) => {
            // Dropping the senders fails every request of this batch; the
            // loop itself keeps serving the queue.
            error!(size, padded_size, "batch handler panicked; dropping batch");
            return;
        }
    };
    let cost = start.elapsed();

    stats.batch_size(padded_size).tpu_cost().register(cost);
    stats.register_processed_size(size as u64);
    debug!(size, padded_size, ?cost, "processed batch");

    if outputs.len() != senders.len() {
        warn!(
            expected = senders.len(),
            actual = outputs.len(),
            "batch handler returned a mismatched number of outputs"
        );
    }
    for (sender, output) in senders.into_iter().zip(outputs) {
        if sender.send(output).is_err() {
            warn!("failed to send output; receiver likely dropped");
        }
    }
}

#[inline]
async fn has_waiting_requests<T>(waiting_requests: &Mutex<VecDeque<T>>) -> bool {
    !waiting_requests.lock().await.is_empty()
}

#[inline]
async fn timeout_await_notifier(notifier: &Notify) -> Result<(), Elapsed> {
    tokio::time::timeout(
        Duration::from_millis(100),
        notifier.notified(),
    ).await
}

async fn drain_possible_requests<T>(
    batch_size: usize,
    waiting_requests: &Mutex<VecDeque<T>>,
) -> Batch<T> {
    let mut requests = waiting_requests.lock().await;
    let items_to_take = std::cmp::min(batch_size, requests.len());
    requests.drain(..items_to_take).collect()
}

/// Puts trimmed requests back at the head of the queue in their original order.
async fn requeue_front<Q, T>(
    waiting_requests: &Mutex<VecDeque<QueueItem<Q, T>>>,
    overflow: Vec<QueueItem<Q, T>>,
) {
    if overflow.is_empty() {
        return;
    }
    let mut requests = waiting_requests.lock().await;
    for item in overflow.into_iter().rev() {
        trace!(id = %item.id(), "re-queued trimmed request");
        requests.push_front(item);
    }
}
