//! Background task that drives the batching loop.

use std::future::Future;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use tokio::{task::JoinHandle, sync::Notify};
use tracing::debug;

/// A handle to the spawned batching loop.
///
/// The loop is expected to poll `running` between batches and to wait on the
/// notifier when the queue is empty. Dropping the handle stops the loop.
pub(crate) struct BatchWorkerHandle {
    /// Cleared to ask the loop to exit
    running: Arc<AtomicBool>,

    /// `None` once shutdown has been initiated
    handle: Option<JoinHandle<()>>,

    /// Wakes the loop when new requests are queued
    notifier: Arc<Notify>,
}

impl BatchWorkerHandle {
    /// Spawns the future built by `task` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub(crate) fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>, Arc<Notify>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let notifier = Arc::new(Notify::new());
        let handle = tokio::spawn(task(running.clone(), notifier.clone()));

        Self {
            running,
            handle: Some(handle),
            notifier,
        }
    }

    /// Wakes the loop so it picks up newly queued requests.
    pub(crate) fn notify(&self) {
        self.notifier.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the loop to stop.
    ///
    /// The loop finishes the batch it is currently executing; requests still
    /// waiting in the queue are dropped along with it.
    pub(crate) fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.notifier.notify_one();

        if let Some(handle) = self.handle.take() {
            debug!("shutting down batch worker");
            // Outside a runtime the task is simply detached.
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = handle.await;
                });
            }
        }
    }
}

impl Drop for BatchWorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
