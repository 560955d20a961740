/// Undoable ordered collections.
///
/// Provides an `UndoSequence` that keeps the current elements plus the
/// elements removed by `undo`, so they can be restored with `redo` until the
/// next `push` invalidates them.
pub mod sequence;
pub mod snapshot;

pub use sequence::UndoSequence;
pub use snapshot::SequenceSnapshot;
pub use statehold_core::SubscriptionId;
