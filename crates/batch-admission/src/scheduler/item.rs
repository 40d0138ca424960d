use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use futures::FutureExt;
use tokio::sync::oneshot;

/// # Item
///
/// The pending reply to a request submitted to the scheduler.
///
/// Resolves to an error if the request was dropped without a reply, e.g.
/// because the handler returned fewer outputs than inputs or panicked.
pub struct Item<T> {
    receiver: oneshot::Receiver<T>
}

impl<T> Item<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<T>) -> Self {
        Self {
            receiver,
        }
    }
}

impl<T> Future for Item<T> {
    type Output = Result<T, oneshot::error::RecvError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().receiver.poll_unpin(cx)
    }
}
