use marquee_model::TrackedItemId;
use tokio::sync::broadcast;

use crate::{error::PersistenceFailure, sort::SortCriterion};

/// Notifications raised by a tracked list for navigation and UI chrome.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    ItemSelected(TrackedItemId),
    /// The deletion was persisted.
    ItemDeleted(TrackedItemId),
    SortChanged(SortCriterion),
    /// A change was rolled back; show a transient notice.
    PersistenceFailed(PersistenceFailure),
}

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Fan-out of [`ListEvent`]s to any number of observers.
#[derive(Debug, Clone)]
pub struct ListEventBus {
    sender: broadcast::Sender<ListEvent>,
}

impl Default for ListEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl ListEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ListEvent) {
        let _ = self.sender.send(event);
    }
}
