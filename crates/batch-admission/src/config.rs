use std::sync::Arc;
use arc_swap::ArcSwap;
use crate::batch::Batch;
use crate::decision::{maybe_batch_down, BatchDownOutcome};
use crate::error::AdmissionError;
use crate::policy::BatchPaddingPolicy;
use crate::sizes::AllowedBatchSizes;
use crate::stats::CostModel;

/// # PaddingConfig
///
/// Everything the admission policy needs to know besides the batch itself and
/// the observed batch costs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPaddingConfig", into = "RawPaddingConfig"))]
pub struct PaddingConfig {
    allowed_batch_sizes: AllowedBatchSizes,
    disable_padding: bool,
    policy: BatchPaddingPolicy,
}

impl PaddingConfig {
    pub fn builder() -> PaddingConfigBuilder {
        PaddingConfigBuilder::default()
    }

    pub fn allowed_batch_sizes(&self) -> &AllowedBatchSizes {
        &self.allowed_batch_sizes
    }

    pub fn disable_padding(&self) -> bool {
        self.disable_padding
    }

    pub fn policy(&self) -> BatchPaddingPolicy {
        self.policy
    }

    /// Size the execution layer will run a batch of `batch_size` tasks at.
    pub fn padded_size(&self, batch_size: usize) -> usize {
        self.allowed_batch_sizes.next(batch_size, self.disable_padding)
    }

    /// Runs [`maybe_batch_down`] with this configuration.
    pub fn maybe_batch_down<T>(
        &self,
        batch: &mut Batch<T>,
        stats: Option<&dyn CostModel>,
        out_trimmed_tasks: &mut Vec<T>,
    ) -> BatchDownOutcome {
        maybe_batch_down(
            batch,
            self.allowed_batch_sizes.as_slice(),
            self.disable_padding,
            self.policy,
            stats,
            out_trimmed_tasks,
        )
    }
}

/// Builder for [`PaddingConfig`].
#[derive(Debug, Default)]
pub struct PaddingConfigBuilder {
    allowed_batch_sizes: Vec<usize>,
    disable_padding: bool,
    policy: BatchPaddingPolicy,
}

impl PaddingConfigBuilder {
    pub fn allowed_batch_sizes(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.allowed_batch_sizes = sizes.into_iter().collect();
        self
    }

    pub fn disable_padding(mut self, disable_padding: bool) -> Self {
        self.disable_padding = disable_padding;
        self
    }

    pub fn policy(mut self, policy: BatchPaddingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the policy from its configuration token.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InvalidPolicyToken`] for an unknown token.
    pub fn policy_token(mut self, token: &str) -> Result<Self, AdmissionError> {
        self.policy = token.parse()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`AdmissionError::ZeroBatchSize`] if any allowed size is zero.
    pub fn build(self) -> Result<PaddingConfig, AdmissionError> {
        if self.allowed_batch_sizes.contains(&0) {
            return Err(AdmissionError::ZeroBatchSize);
        }
        Ok(PaddingConfig {
            allowed_batch_sizes: AllowedBatchSizes::new(self.allowed_batch_sizes),
            disable_padding: self.disable_padding,
            policy: self.policy,
        })
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawPaddingConfig {
    #[serde(default)]
    allowed_batch_sizes: Vec<usize>,
    #[serde(default)]
    disable_padding: bool,
    #[serde(default)]
    policy: BatchPaddingPolicy,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPaddingConfig> for PaddingConfig {
    type Error = AdmissionError;

    fn try_from(raw: RawPaddingConfig) -> Result<Self, Self::Error> {
        PaddingConfig::builder()
            .allowed_batch_sizes(raw.allowed_batch_sizes)
            .disable_padding(raw.disable_padding)
            .policy(raw.policy)
            .build()
    }
}

#[cfg(feature = "serde")]
impl From<PaddingConfig> for RawPaddingConfig {
    fn from(config: PaddingConfig) -> Self {
        Self {
            allowed_batch_sizes: config.allowed_batch_sizes.iter().collect(),
            disable_padding: config.disable_padding,
            policy: config.policy,
        }
    }
}

/// # SharedPaddingConfig
///
/// A [`PaddingConfig`] that can be replaced while batches are being decided.
///
/// Readers take a whole snapshot with [`SharedPaddingConfig::load`]; a reload
/// swaps the entire configuration at once, so a decision never sees sizes from
/// one configuration and a policy from another.
#[derive(Debug, Clone)]
pub struct SharedPaddingConfig {
    inner: Arc<ArcSwap<PaddingConfig>>,
}

impl SharedPaddingConfig {
    pub fn new(config: PaddingConfig) -> Self {
        Self { inner: Arc::new(ArcSwap::from_pointee(config)) }
    }

    /// Current configuration snapshot.
    pub fn load(&self) -> Arc<PaddingConfig> {
        self.inner.load_full()
    }

    /// Publishes a new configuration, returning the previous one.
    pub fn store(&self, config: PaddingConfig) -> Arc<PaddingConfig> {
        self.inner.swap(Arc::new(config))
    }

    /// Changes only the policy, keeping the other fields of the current
    /// configuration.
    pub fn set_policy(&self, policy: BatchPaddingPolicy) {
        self.inner.rcu(|current| {
            let mut updated = PaddingConfig::clone(current);
            updated.policy = policy;
            updated
        });
    }
}

impl Default for SharedPaddingConfig {
    fn default() -> Self {
        Self::new(PaddingConfig::default())
    }
}

impl From<PaddingConfig> for SharedPaddingConfig {
    fn from(config: PaddingConfig) -> Self {
        Self::new(config)
    }
}
