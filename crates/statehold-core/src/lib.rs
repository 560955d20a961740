/// Shared building blocks for statehold containers.
///
/// Currently this is the synchronous observer list that both the undo
/// sequence and the persistent store use to notify their consumers.
pub mod observe;

pub use observe::{SubscriptionId, Subscribers};
