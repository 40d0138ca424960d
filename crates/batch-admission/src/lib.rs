//! # Batch Admission
//!
//! A batch-size **admission policy** for inference batching on hardware that is
//! tuned for a fixed set of batch sizes.
//!
//! ## Overview
//!
//! Accelerators are usually compiled for a handful of batch sizes. A batch
//! whose size falls between two of them either has to be padded up to the next
//! allowed size with filler, or trimmed down to the previous one with the excess
//! requests deferred to a later batch. This crate makes that call, once per
//! batch, without blocking.
//!
//! Key components include:
//!
//! - [`next_allowed_batch_size`] and [`prev_allowed_batch_size`], the lookups
//!   over the allowed batch sizes
//! - [`BatchPaddingPolicy`], the configurable strategy (`PAD_UP`,
//!   `BATCH_DOWN`, `MINIMIZE_TPU_COST_PER_REQUEST`)
//! - [`maybe_batch_down`], the decision itself, which trims a [`Batch`] in
//!   place and hands back the displaced tasks in order
//! - [`CostModel`] and [`ModelBatchStats`], the observed per-size batch costs
//!   used by the cost-minimizing policy
//! - [`PaddingConfig`] and [`SharedPaddingConfig`], configuration that can be
//!   reloaded atomically between decisions
//!
//! ## Failure Model
//!
//! A decision never fails. A missing cost model is logged as an error and
//! treated as `PAD_UP`; missing cost observations simply mean no trim. The only
//! error surfaced to callers is an invalid configuration, see
//! [`AdmissionError`].
//!
//! ## Features
//!
//! - **scheduler** (default) - Enables [`scheduler`], an async batching front end
//!   that applies the policy to every batch it forms
//! - **serde** - Enables (de)serialization of [`BatchPaddingPolicy`] and
//!   [`PaddingConfig`]
//!
//! ## Example
//!
//! ```
//! use batch_admission::{maybe_batch_down, Batch, BatchDownOutcome, BatchPaddingPolicy};
//!
//! let mut batch: Batch<&str> = vec!["a", "b", "c", "d", "e"].into();
//! let mut overflow = Vec::new();
//!
//! let outcome = maybe_batch_down(
//!     &mut batch,
//!     &[2, 4, 8],
//!     false,
//!     "BATCH_DOWN".parse::<BatchPaddingPolicy>().unwrap(),
//!     None,
//!     &mut overflow,
//! );
//!
//! assert_eq!(outcome, BatchDownOutcome::Trimmed { from: 5, to: 4 });
//! assert_eq!(overflow, vec!["e"]);
//! ```

mod batch;
mod config;
mod decision;
mod error;
mod policy;
mod sizes;

pub mod stats;

#[cfg(feature = "scheduler")]
pub mod scheduler;

pub use batch::Batch;
pub use config::{PaddingConfig, PaddingConfigBuilder, SharedPaddingConfig};
pub use decision::{maybe_batch_down, BatchDownOutcome, SkipReason};
pub use error::AdmissionError;
pub use policy::BatchPaddingPolicy;
pub use sizes::{next_allowed_batch_size, prev_allowed_batch_size, AllowedBatchSizes};
pub use stats::{CostModel, ModelBatchStats};
