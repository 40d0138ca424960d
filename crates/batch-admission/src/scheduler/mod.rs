//! # Padded batch scheduler
//!
//! An asynchronous batching front end that applies the admission policy to
//! every batch it forms.
//!
//! ## Module Structure
//!
//! * [`worker`] - Owns the background task that runs the batching loop and
//!   shuts it down when dropped.
//!
//! * [`handler`] - The [`BatchHandler`] trait implemented by whatever executes
//!   a finalized batch.
//!
//! * [`batch_loop`] - Forms batches from the waiting queue, trims them with
//!   the current [`PaddingConfig`](crate::PaddingConfig), re-queues overflow at
//!   the head of the queue and records execution costs.
//!
//! * [`batcher`] - [`PaddedBatchScheduler`], the public entry point that
//!   queues requests and hands back an awaitable [`Item`].
//!
//! Batches are cut greedily: whenever work is waiting, up to `S` requests are
//! taken from the head of the queue.

mod batch_loop;
mod batcher;
mod handler;
mod item;
mod queue_item;
mod worker;

pub use batcher::{Batcher, PaddedBatchScheduler};
pub use handler::BatchHandler;
pub use item::Item;
