use async_trait::async_trait;

/// Executes finalized batches.
///
/// # Implementation Notes
///
/// Implementations should return exactly one output per input, in input
/// order. Inputs without a matching output have their reply channel dropped.
///
/// # Example
///
/// ```ignore
/// use batch_admission::scheduler::BatchHandler;
/// use async_trait::async_trait;
///
/// struct Doubler;
///
/// #[async_trait]
/// impl BatchHandler for Doubler {
///     type Input = u32;
///     type Output = u32;
///
///     async fn process(&self, inputs: Vec<u32>, _padded_size: usize) -> Vec<u32> {
///         inputs.into_iter().map(|x| x * 2).collect()
///     }
/// }
/// ```
#[async_trait]
pub trait BatchHandler: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Runs one batch.
    ///
    /// # Parameters
    ///
    /// * `inputs` - The real requests of the batch, in queue order
    /// * `padded_size` - The allowed batch size the batch should be executed
    ///   at; the handler fills `padded_size - inputs.len()` slots with filler
    async fn process(&self, inputs: Vec<Self::Input>, padded_size: usize) -> Vec<Self::Output>;
}
