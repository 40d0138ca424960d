use thiserror::Error;

/// Errors raised while configuring or running the admission policy.
///
/// Only configuration-time variants are ever returned to callers. A decision
/// on the serving path absorbs its failures and leaves the batch as formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// A padding policy string did not match any canonical token.
    #[error(
        "unrecognized batch padding policy {token:?}; expected one of \"PAD_UP\", \"BATCH_DOWN\" or \"MINIMIZE_TPU_COST_PER_REQUEST\""
    )]
    InvalidPolicyToken { token: String },

    /// Allowed batch sizes must be positive.
    #[error("allowed batch sizes must be positive, got 0")]
    ZeroBatchSize,

    /// The cost-minimizing policy was selected without any batch statistics.
    #[error(
        "MINIMIZE_TPU_COST_PER_REQUEST batching policy has been chosen but no batch statistics were passed to the batch scheduler; falling back on the PAD_UP policy"
    )]
    MissingCostModel,
}
