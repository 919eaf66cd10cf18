//! The "currently watching" list: sort, selection and optimistic edits on
//! top of [`ListSyncEngine`].

use std::sync::Arc;

use marquee_model::{TrackedItem, TrackedItemId, TrackingState};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use super::{
    engine::{ListSyncEngine, ListView},
    events::{ListEvent, ListEventBus},
    snapshot::{ListItem, Snapshot},
    store::TrackedItemStore,
};
use crate::{
    error::{CoreError, PersistenceFailure, Result},
    sort::{SortCriterion, SortPolicy},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedSection {
    Watching,
}

impl ListItem for TrackedItem {
    type Id = TrackedItemId;

    fn id(&self) -> TrackedItemId {
        self.id
    }
}

pub type TrackedSnapshot = Snapshot<TrackedSection, TrackedItem>;

#[derive(Debug, Clone, Default)]
struct ListState {
    /// Store order; finished items are kept but not shown.
    items: Vec<TrackedItem>,
    criterion: SortCriterion,
}

impl ListState {
    fn snapshot(&self) -> Result<TrackedSnapshot> {
        let watching: Vec<TrackedItem> = self
            .items
            .iter()
            .filter(|item| !item.is_finished())
            .cloned()
            .collect();
        let sorted = SortPolicy::apply(&watching, self.criterion);
        Ok(Snapshot::from_sections([(TrackedSection::Watching, sorted)])?)
    }

    fn position(&self, id: TrackedItemId) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(CoreError::NotFound(id))
    }
}

/// Controller for the tracked-items list.
///
/// Edits are optimistic: the view changes first, then the store is written.
/// If the write fails the edit is reverted (unless something newer already
/// replaced it) and [`ListEvent::PersistenceFailed`] is published.
pub struct TrackedList<V> {
    store: Arc<dyn TrackedItemStore>,
    engine: ListSyncEngine<TrackedSection, TrackedItem, V>,
    state: Mutex<ListState>,
    events: ListEventBus,
}

impl<V> std::fmt::Debug for TrackedList<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedList")
            .field("store", &self.store)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<V> TrackedList<V>
where
    V: ListView<TrackedSection, TrackedItem>,
{
    pub fn new(
        store: Arc<dyn TrackedItemStore>,
        view: V,
        criterion: SortCriterion,
    ) -> Self {
        Self {
            store,
            engine: ListSyncEngine::new(view),
            state: Mutex::new(ListState {
                items: Vec::new(),
                criterion,
            }),
            events: ListEventBus::default(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    pub fn engine(&self) -> &ListSyncEngine<TrackedSection, TrackedItem, V> {
        &self.engine
    }

    pub async fn criterion(&self) -> SortCriterion {
        self.state.lock().await.criterion
    }

    /// All known items, finished ones included, in store order.
    pub async fn items(&self) -> Vec<TrackedItem> {
        self.state.lock().await.items.clone()
    }

    /// The watching list as currently displayed.
    pub async fn visible(&self) -> Vec<TrackedItem> {
        self.engine
            .snapshot()
            .await
            .section(&TrackedSection::Watching)
            .map(<[TrackedItem]>::to_vec)
            .unwrap_or_default()
    }

    pub async fn selection(&self) -> Option<TrackedItemId> {
        self.engine.selection().await
    }

    /// Replace the list with the store's contents. Returns the number of
    /// items shown.
    pub async fn load(&self) -> Result<usize> {
        let items = match self.store.load_tracked_items().await {
            Ok(items) => items,
            Err(failure) => return Err(self.report(failure)),
        };

        let mut state = self.state.lock().await;
        let next = ListState {
            items,
            criterion: state.criterion,
        };
        self.commit(&mut state, next).await?;

        let shown = state.items.iter().filter(|i| !i.is_finished()).count();
        info!("tracked list loaded: {} items, {} watching", state.items.len(), shown);
        Ok(shown)
    }

    pub async fn set_sort(&self, criterion: SortCriterion) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.criterion == criterion {
            return Ok(());
        }

        let next = ListState {
            items: state.items.clone(),
            criterion,
        };
        self.commit(&mut state, next).await?;
        drop(state);

        self.events.publish(ListEvent::SortChanged(criterion));
        Ok(())
    }

    pub async fn select(&self, id: TrackedItemId) -> Result<()> {
        if !self.engine.select(id).await {
            return Err(CoreError::NotFound(id));
        }
        self.events.publish(ListEvent::ItemSelected(id));
        Ok(())
    }

    /// Remove an item from the list, then from the store.
    pub async fn delete(&self, id: TrackedItemId) -> Result<()> {
        let (index, removed) = {
            let mut state = self.state.lock().await;
            let index = state.position(id)?;
            let mut next = state.clone();
            let removed = next.items.remove(index);
            self.commit(&mut state, next).await?;
            (index, removed)
        };

        match self.store.delete_tracked_item(id).await {
            Ok(()) => {
                debug!("tracked item {} deleted", id);
                self.events.publish(ListEvent::ItemDeleted(id));
                Ok(())
            }
            Err(failure) => {
                let mut state = self.state.lock().await;
                if state.position(id).is_err() {
                    let mut next = state.clone();
                    let at = index.min(next.items.len());
                    next.items.insert(at, removed);
                    if let Err(e) = self.commit(&mut state, next).await {
                        warn!("failed to restore tracked item {id}: {e}");
                    }
                }
                drop(state);
                Err(self.report(failure))
            }
        }
    }

    /// Change an item's progress in place and persist it.
    pub async fn update_progress(&self, id: TrackedItemId, progress: f64) -> Result<()> {
        let (previous, updated) = {
            let mut state = self.state.lock().await;
            let index = state.position(id)?;
            let mut next = state.clone();
            let item = &mut next.items[index];
            let previous = item.progress;
            item.set_progress(progress)?;
            let updated = item.clone();
            self.commit(&mut state, next).await?;
            (previous, updated)
        };

        if let Err(failure) = self.store.save_tracked_items(&[updated]).await {
            self.revert(id, |item| {
                if item.progress == progress {
                    item.progress = previous;
                    true
                } else {
                    false
                }
            })
            .await;
            return Err(self.report(failure));
        }
        Ok(())
    }

    /// Move an item out of the watching list.
    pub async fn mark_finished(&self, id: TrackedItemId) -> Result<()> {
        let updated = {
            let mut state = self.state.lock().await;
            let index = state.position(id)?;
            if state.items[index].is_finished() {
                return Ok(());
            }
            let mut next = state.clone();
            next.items[index].state = TrackingState::Finished;
            let updated = next.items[index].clone();
            self.commit(&mut state, next).await?;
            updated
        };

        if let Err(failure) = self.store.save_tracked_items(&[updated]).await {
            self.revert(id, |item| {
                if item.is_finished() {
                    item.state = TrackingState::Watching;
                    true
                } else {
                    false
                }
            })
            .await;
            return Err(self.report(failure));
        }
        Ok(())
    }

    async fn commit(&self, state: &mut ListState, next: ListState) -> Result<()> {
        let snapshot = next.snapshot()?;
        self.engine.reconcile(snapshot).await?;
        *state = next;
        Ok(())
    }

    /// Undo an optimistic edit. `undo` returns `false` when the item has
    /// since been changed by something else and should be left alone.
    async fn revert(&self, id: TrackedItemId, undo: impl FnOnce(&mut TrackedItem) -> bool) {
        let mut state = self.state.lock().await;
        let Ok(index) = state.position(id) else {
            return;
        };
        let mut next = state.clone();
        if !undo(&mut next.items[index]) {
            return;
        }
        if let Err(e) = self.commit(&mut state, next).await {
            warn!("failed to revert tracked item {id}: {e}");
        }
    }

    fn report(&self, failure: PersistenceFailure) -> CoreError {
        warn!("tracked items persistence failed: {failure}");
        self.events
            .publish(ListEvent::PersistenceFailed(failure.clone()));
        CoreError::Persistence(failure)
    }
}
