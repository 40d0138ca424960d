use tokio::sync::oneshot::Sender;
use uuid::Uuid;

/// # QueueItem
///
/// A request waiting for a batch slot: the input to process and the channel
/// its output is sent back on.
///
/// The id only exists so a request can be followed through trims and
/// re-queues in the logs.
pub struct QueueItem<Q, T> {
    id: Uuid,

    input: Q,

    sender: Sender<T>
}

impl<Q, T> QueueItem<Q, T> {
    pub fn new(input: Q, sender: Sender<T>) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            sender
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    #[cfg(test)]
    pub fn input(&self) -> &Q {
        &self.input
    }

    /// Splits the item into its input and reply channel.
    pub fn into_parts(self) -> (Q, Sender<T>) {
        (self.input, self.sender)
    }
}
