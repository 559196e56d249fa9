//! Stateful side of the commit timeline: pagination, repository polling and
//! the view that ties them to the graph derivations.

pub mod events;
pub mod pagination;
pub mod poller;
pub mod view;

#[cfg(test)]
mod testing;

pub use events::{EventBus, TimelineEvent};
pub use pagination::{LoadOutcome, PaginationCoordinator, PaginationSnapshot};
pub use poller::{PollerHandle, RepositorySnapshot, RepositoryStatePoller};
pub use view::TimelineView;
