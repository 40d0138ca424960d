use std::fmt;
use std::str::FromStr;
use crate::error::AdmissionError;

/// # BatchPaddingPolicy
///
/// Selects what happens to a batch whose size falls between two allowed
/// batch sizes.
///
/// * `PadUp` - leave the batch alone; the execution layer pads it up to the
///   next allowed size. This is the default.
/// * `BatchDown` - always trim the batch to the previous allowed size and
///   return the excess tasks to the queue.
/// * `MinimizeCostPerRequest` - trim only when the observed cost per request
///   of the smaller size is no worse than padding up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BatchPaddingPolicy {
    #[default]
    PadUp,
    BatchDown,
    MinimizeCostPerRequest,
}

impl BatchPaddingPolicy {
    /// Every policy, in declaration order.
    pub const ALL: [BatchPaddingPolicy; 3] = [
        BatchPaddingPolicy::PadUp,
        BatchPaddingPolicy::BatchDown,
        BatchPaddingPolicy::MinimizeCostPerRequest,
    ];

    /// The canonical configuration token for this policy.
    pub const fn as_token(&self) -> &'static str {
        match self {
            BatchPaddingPolicy::PadUp => "PAD_UP",
            BatchPaddingPolicy::BatchDown => "BATCH_DOWN",
            BatchPaddingPolicy::MinimizeCostPerRequest => "MINIMIZE_TPU_COST_PER_REQUEST",
        }
    }
}

impl FromStr for BatchPaddingPolicy {
    type Err = AdmissionError;

    /// Parses a case-sensitive policy token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
            .find(|policy| policy.as_token() == s)
            .ok_or_else(|| AdmissionError::InvalidPolicyToken { token: s.to_string() })
    }
}

impl fmt::Display for BatchPaddingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BatchPaddingPolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_token())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BatchPaddingPolicy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
