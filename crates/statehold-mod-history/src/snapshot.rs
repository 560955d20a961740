/// Read-only view of an [`UndoSequence`](crate::UndoSequence) at one point in time.
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSnapshot<T> {
    elements: Arc<Vec<T>>,
    redoable_count: usize,
}

impl<T> SequenceSnapshot<T> {
    pub(crate) fn new(elements: Arc<Vec<T>>, redoable_count: usize) -> Self {
        Self {
            elements,
            redoable_count,
        }
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn redoable_count(&self) -> usize {
        self.redoable_count
    }

    /// Whether two snapshots share the same element buffer.
    ///
    /// Snapshots taken with no mutation in between always do.
    pub fn shares_elements_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.elements, &other.elements)
    }
}
