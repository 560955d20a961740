/// Ordered collection with undo/redo.
///
/// `push` appends, `undo` moves the tail into the undone list, `redo` moves
/// it back. Any new `push` discards the whole undone list, so there is no
/// redo across a branch.
use std::sync::Arc;

use statehold_core::{Subscribers, SubscriptionId};

use crate::snapshot::SequenceSnapshot;

/// Undoable sequence of `T`.
///
/// Elements are held copy-on-write: a [`SequenceSnapshot`] taken before a
/// mutation keeps seeing the old elements.
pub struct UndoSequence<T> {
    /// Current visible data.
    elements: Arc<Vec<T>>,
    /// Removed-but-recoverable data, oldest removal first.
    undone: Vec<T>,
    subscribers: Subscribers<SequenceSnapshot<T>>,
}

impl<T> std::fmt::Debug for UndoSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoSequence")
            .field("len", &self.elements.len())
            .field("redoable", &self.undone.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T: Clone> Default for UndoSequence<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone> From<Vec<T>> for UndoSequence<T> {
    fn from(initial: Vec<T>) -> Self {
        Self::new(initial)
    }
}

impl<T: Clone> UndoSequence<T> {
    /// Creates a sequence seeded with `initial` and nothing to redo.
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            elements: Arc::new(initial),
            undone: Vec::new(),
            subscribers: Subscribers::new(),
        }
    }

    /// Current elements, oldest first.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Number of elements that `redo` can restore.
    pub fn redoable_count(&self) -> usize {
        self.undone.len()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.elements.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Returns an immutable view of the current state.
    pub fn snapshot(&self) -> SequenceSnapshot<T> {
        SequenceSnapshot::new(Arc::clone(&self.elements), self.undone.len())
    }

    /// Appends `value` and clears everything that could have been redone.
    pub fn push(&mut self, value: T) {
        Arc::make_mut(&mut self.elements).push(value);
        if !self.undone.is_empty() {
            tracing::debug!(dropped = self.undone.len(), "push discarded redo history");
            self.undone.clear();
        }
        self.notify();
    }

    /// Moves the last element to the undone list.
    ///
    /// Returns `false` without side effects when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(last) = Arc::make_mut(&mut self.elements).pop() else {
            return false;
        };
        self.undone.push(last);
        self.notify();
        true
    }

    /// Restores the most recently undone element.
    ///
    /// Returns `false` without side effects when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(last) = self.undone.pop() else {
            return false;
        };
        Arc::make_mut(&mut self.elements).push(last);
        self.notify();
        true
    }

    /// Clears both the elements and the undone list.
    pub fn reset(&mut self) {
        if self.elements.is_empty() && self.undone.is_empty() {
            return;
        }
        self.elements = Arc::new(Vec::new());
        self.undone.clear();
        self.notify();
    }

    /// Registers a callback invoked after every state change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SequenceSnapshot<T>) + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers.notify(&snapshot);
    }
}
