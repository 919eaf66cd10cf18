use std::fmt;

use async_trait::async_trait;
use marquee_model::{TrackedItem, TrackedItemId};
use tokio::sync::RwLock;

use crate::error::PersistenceFailure;

/// Persistence for the user's tracked items.
#[async_trait]
pub trait TrackedItemStore: Send + Sync + fmt::Debug {
    async fn load_tracked_items(&self) -> Result<Vec<TrackedItem>, PersistenceFailure>;

    /// Insert or replace the given items by id.
    async fn save_tracked_items(
        &self,
        items: &[TrackedItem],
    ) -> Result<(), PersistenceFailure>;

    async fn delete_tracked_item(&self, id: TrackedItemId) -> Result<(), PersistenceFailure>;
}

/// Process-local store, insertion ordered.
#[derive(Debug, Default)]
pub struct InMemoryTrackedItemStore {
    items: RwLock<Vec<TrackedItem>>,
}

impl InMemoryTrackedItemStore {
    pub fn with_items(items: Vec<TrackedItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    pub async fn items(&self) -> Vec<TrackedItem> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl TrackedItemStore for InMemoryTrackedItemStore {
    async fn load_tracked_items(&self) -> Result<Vec<TrackedItem>, PersistenceFailure> {
        Ok(self.items.read().await.clone())
    }

    async fn save_tracked_items(
        &self,
        items: &[TrackedItem],
    ) -> Result<(), PersistenceFailure> {
        let mut guard = self.items.write().await;
        for item in items {
            match guard.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => guard.push(item.clone()),
            }
        }
        Ok(())
    }

    async fn delete_tracked_item(&self, id: TrackedItemId) -> Result<(), PersistenceFailure> {
        let mut guard = self.items.write().await;
        let before = guard.len();
        guard.retain(|item| item.id != id);
        if guard.len() == before {
            return Err(PersistenceFailure::Delete {
                id,
                reason: "no such item".into(),
            });
        }
        Ok(())
    }
}
