/// Synchronous observer list.
///
/// A container owns a `Subscribers<S>` and calls `notify` after each
/// mutation, passing a snapshot of its state. Callbacks run in registration
/// order on the caller's thread, before the mutating call returns.
use std::fmt;

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered list of change callbacks for a single container.
pub struct Subscribers<S: ?Sized> {
    entries: Vec<(SubscriptionId, Box<dyn FnMut(&S)>)>,
    next_id: u64,
}

impl<S: ?Sized> fmt::Debug for Subscribers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<S: ?Sized> Default for Subscribers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Subscribers<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a callback. It is invoked on every subsequent `notify`.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&S) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Removes a callback. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        before != self.entries.len()
    }

    /// Invokes every callback with `state`, in registration order.
    pub fn notify(&mut self, state: &S) {
        tracing::trace!(subscribers = self.entries.len(), "notifying subscribers");
        for (_, callback) in &mut self.entries {
            callback(state);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
