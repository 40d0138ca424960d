//! Lookups over the set of batch sizes the execution hardware is tuned for.

/// Returns the smallest allowed batch size greater than or equal to `batch_size`.
///
/// `batch_size` is returned unchanged when padding is disabled, when
/// `allowed_batch_sizes` is empty, or when `batch_size` exceeds every allowed
/// size (the batch then runs oversized). The slice does not need to be sorted.
pub fn next_allowed_batch_size(
    batch_size: usize,
    allowed_batch_sizes: &[usize],
    disable_padding: bool,
) -> usize {
    if disable_padding {
        return batch_size;
    }
    allowed_batch_sizes.iter()
        .copied()
        .filter(|&allowed| allowed >= batch_size)
        .min()
        .unwrap_or(batch_size)
}

/// Returns the largest allowed batch size smaller than or equal to `batch_size`.
///
/// Returns `batch_size` when padding is disabled, when `allowed_batch_sizes`
/// is empty, or when no such size exists. A zero entry is never a valid
/// target and is skipped.
pub fn prev_allowed_batch_size(
    batch_size: usize,
    allowed_batch_sizes: &[usize],
    disable_padding: bool,
) -> usize {
    if disable_padding {
        return batch_size;
    }
    allowed_batch_sizes.iter()
        .copied()
        .filter(|&allowed| allowed > 0 && allowed <= batch_size)
        .max()
        .unwrap_or(batch_size)
}

/// # AllowedBatchSizes
///
/// The batch sizes an execution engine is compiled or tuned for.
///
/// Sizes are kept sorted and de-duplicated. An empty set is valid and turns
/// every padding decision into a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AllowedBatchSizes {
    sizes: Vec<usize>,
}

impl AllowedBatchSizes {
    /// Builds the set from any collection of sizes, in any order.
    pub fn new(sizes: impl IntoIterator<Item = usize>) -> Self {
        let mut sizes: Vec<usize> = sizes.into_iter().collect();
        sizes.sort_unstable();
        sizes.dedup();
        Self { sizes }
    }

    /// Smallest allowed size `>= batch_size`, see [`next_allowed_batch_size`].
    pub fn next(&self, batch_size: usize, disable_padding: bool) -> usize {
        next_allowed_batch_size(batch_size, &self.sizes, disable_padding)
    }

    /// Largest allowed size `<= batch_size`, see [`prev_allowed_batch_size`].
    pub fn prev(&self, batch_size: usize, disable_padding: bool) -> usize {
        prev_allowed_batch_size(batch_size, &self.sizes, disable_padding)
    }

    pub fn contains(&self, batch_size: usize) -> bool {
        self.sizes.binary_search(&batch_size).is_ok()
    }

    /// The largest allowed size, if any.
    pub fn max(&self) -> Option<usize> {
        self.sizes.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.sizes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.sizes
    }
}

impl From<Vec<usize>> for AllowedBatchSizes {
    fn from(sizes: Vec<usize>) -> Self {
        Self::new(sizes)
    }
}

impl<const N: usize> From<[usize; N]> for AllowedBatchSizes {
    fn from(sizes: [usize; N]) -> Self {
        Self::new(sizes)
    }
}

impl AsRef<[usize]> for AllowedBatchSizes {
    fn as_ref(&self) -> &[usize] {
        &self.sizes
    }
}
