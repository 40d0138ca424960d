/// # Batch
///
/// An ordered group of tasks that will be executed together.
///
/// Every task contributes exactly one slot to the batch size. The batch owns
/// its tasks until they are either handed to execution via [`Batch::into_tasks`]
/// or trimmed out with [`Batch::try_trim_to_new_size`], at which point the
/// caller takes them back for re-queuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    tasks: Vec<T>,
}

impl<T> Batch<T> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { tasks: Vec::with_capacity(capacity) }
    }

    /// Appends a task to the end of the batch.
    pub fn add_task(&mut self, task: T) {
        self.tasks.push(task);
    }

    /// Number of tasks currently in the batch.
    pub fn size(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, index: usize) -> Option<&T> {
        self.tasks.get(index)
    }

    pub fn tasks(&self) -> &[T] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.tasks.iter()
    }

    pub fn into_tasks(self) -> Vec<T> {
        self.tasks
    }

    /// Shrinks the batch to its first `new_size` tasks.
    ///
    /// The removed suffix is appended to `out_trimmed_tasks` in its original
    /// order. Nothing happens when `new_size` is zero or not smaller than the
    /// current size; the return value tells whether a trim took place.
    pub fn try_trim_to_new_size(&mut self, new_size: usize, out_trimmed_tasks: &mut Vec<T>) -> bool {
        if new_size == 0 || new_size >= self.tasks.len() {
            return false;
        }
        out_trimmed_tasks.extend(self.tasks.drain(new_size..));
        true
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Batch<T> {
    fn from(tasks: Vec<T>) -> Self {
        Self { tasks }
    }
}

impl<T> FromIterator<T> for Batch<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self { tasks: iter.into_iter().collect() }
    }
}

impl<T> Extend<T> for Batch<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tasks.extend(iter);
    }
}

impl<T> IntoIterator for Batch<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

impl<T> AsRef<[T]> for Batch<T> {
    fn as_ref(&self) -> &[T] {
        &self.tasks
    }
}
