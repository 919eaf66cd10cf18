//! Sectioned list reconciliation.
//!
//! [`Snapshot`] is the declarative target, [`diff`] is the pure
//! identity-based comparison, and [`ListSyncEngine`] applies diffs to a
//! [`ListView`] one transaction at a time. [`TrackedList`] builds the
//! "currently watching" list on top of it.

pub mod diff;
pub mod engine;
pub mod events;
pub mod snapshot;
pub mod store;
pub mod tracked;

pub use diff::{Changeset, Move, SectionChanges, diff};
pub use engine::{ListSyncEngine, ListView};
pub use events::{DEFAULT_EVENT_CAPACITY, ListEvent, ListEventBus};
pub use snapshot::{ListItem, Section, Snapshot};
pub use store::{InMemoryTrackedItemStore, TrackedItemStore};
pub use tracked::{TrackedList, TrackedSection, TrackedSnapshot};
