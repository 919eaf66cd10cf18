use std::{fmt, hash::Hash};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{
    diff::{Changeset, diff},
    snapshot::{ListItem, Snapshot},
};
use crate::error::ViewRejected;

/// The rendering side of a reconciled list.
pub trait ListView<S, T: ListItem>: Send {
    /// Apply every change as one visual transaction.
    fn apply(
        &mut self,
        changes: &Changeset<S, T::Id>,
        target: &Snapshot<S, T>,
    ) -> Result<(), ViewRejected>;

    /// Replace the contents wholesale, without animation.
    fn reload(&mut self, snapshot: &Snapshot<S, T>);
}

struct EngineState<S, T: ListItem, V> {
    view: V,
    committed: Snapshot<S, T>,
    selection: Option<T::Id>,
}

/// Drives a [`ListView`] from successive snapshots.
///
/// Calls are serialized per engine: each reconcile diffs against the last
/// snapshot the view accepted. A rejected update reloads that snapshot, so
/// the view never rests on a half-applied state.
pub struct ListSyncEngine<S, T: ListItem, V> {
    state: Mutex<EngineState<S, T, V>>,
}

impl<S, T, V> fmt::Debug for ListSyncEngine<S, T, V>
where
    T: ListItem,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSyncEngine").finish_non_exhaustive()
    }
}

impl<S, T, V> ListSyncEngine<S, T, V>
where
    S: Clone + Eq + Hash + fmt::Debug,
    T: ListItem,
    V: ListView<S, T>,
{
    pub fn new(view: V) -> Self {
        Self {
            state: Mutex::new(EngineState {
                view,
                committed: Snapshot::new(),
                selection: None,
            }),
        }
    }

    /// Move the view to `next`.
    ///
    /// Returns the changeset that was applied; an empty changeset means the
    /// view was not touched.
    pub async fn reconcile(
        &self,
        next: Snapshot<S, T>,
    ) -> Result<Changeset<S, T::Id>, ViewRejected> {
        let mut state = self.state.lock().await;

        let changes = diff(&state.committed, &next);
        if changes.is_empty() {
            state.committed = next;
            return Ok(changes);
        }

        if let Err(rejected) = state.view.apply(&changes, &next) {
            warn!("list update rejected, restoring last good snapshot: {rejected}");
            let EngineState {
                view, committed, ..
            } = &mut *state;
            view.reload(committed);
            return Err(rejected);
        }

        debug!(
            "list reconciled: {} mutations, {} items",
            changes.mutation_count(),
            next.item_count()
        );
        state.committed = next;

        if let Some(selected) = &state.selection
            && !state.committed.contains(selected)
        {
            debug!("selection {:?} left the list", selected);
            state.selection = None;
        }

        Ok(changes)
    }

    /// The snapshot the view currently shows.
    pub async fn snapshot(&self) -> Snapshot<S, T> {
        self.state.lock().await.committed.clone()
    }

    /// Select an item; returns `false` if it is not in the list.
    pub async fn select(&self, id: T::Id) -> bool {
        let mut state = self.state.lock().await;
        if state.committed.contains(&id) {
            state.selection = Some(id);
            true
        } else {
            false
        }
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selection = None;
    }

    pub async fn selection(&self) -> Option<T::Id> {
        self.state.lock().await.selection.clone()
    }

    pub async fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.state.lock().await.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(u32, &'static str);

    impl ListItem for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.0
        }
    }

    #[derive(Debug, Default)]
    struct RecordingView {
        transactions: Vec<usize>,
        reloads: usize,
        shown: Vec<u32>,
        reject_next: bool,
    }

    impl ListView<&'static str, Row> for RecordingView {
        fn apply(
            &mut self,
            changes: &Changeset<&'static str, u32>,
            target: &Snapshot<&'static str, Row>,
        ) -> Result<(), ViewRejected> {
            if std::mem::take(&mut self.reject_next) {
                return Err(ViewRejected("batch update failed".into()));
            }
            self.transactions.push(changes.mutation_count());
            self.shown = target.item_ids();
            Ok(())
        }

        fn reload(&mut self, snapshot: &Snapshot<&'static str, Row>) {
            self.reloads += 1;
            self.shown = snapshot.item_ids();
        }
    }

    fn snapshot(rows: &[(u32, &'static str)]) -> Snapshot<&'static str, Row> {
        Snapshot::from_sections([(
            "main",
            rows.iter().map(|&(id, v)| Row(id, v)).collect(),
        )])
        .unwrap()
    }

    #[tokio::test]
    async fn reconciling_the_same_snapshot_touches_nothing() {
        let engine = ListSyncEngine::new(RecordingView::default());
        let a = snapshot(&[(1, "a"), (2, "b")]);

        engine.reconcile(a.clone()).await.unwrap();
        let changes = engine.reconcile(a).await.unwrap();

        assert!(changes.is_empty());
        assert_eq!(engine.with_view(|v| v.transactions.len()).await, 1);
    }

    #[tokio::test]
    async fn rejected_update_reloads_last_good_snapshot() {
        let engine = ListSyncEngine::new(RecordingView::default());
        let good = snapshot(&[(1, "a"), (2, "b")]);
        engine.reconcile(good.clone()).await.unwrap();

        engine.state.lock().await.view.reject_next = true;
        let result = engine.reconcile(snapshot(&[(2, "b")])).await;

        assert!(result.is_err());
        assert_eq!(engine.snapshot().await, good);
        assert_eq!(engine.with_view(|v| (v.reloads, v.shown.clone())).await, (1, vec![1, 2]));
    }

    #[tokio::test]
    async fn selection_survives_moves_and_clears_on_removal() {
        let engine = ListSyncEngine::new(RecordingView::default());
        engine.reconcile(snapshot(&[(1, "a"), (2, "b")])).await.unwrap();
        assert!(engine.select(2).await);
        assert!(!engine.select(9).await);

        engine.reconcile(snapshot(&[(2, "b2"), (1, "a")])).await.unwrap();
        assert_eq!(engine.selection().await, Some(2));

        engine.reconcile(snapshot(&[(1, "a")])).await.unwrap();
        assert_eq!(engine.selection().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reconciles_are_serialized() {
        let engine = Arc::new(ListSyncEngine::new(RecordingView::default()));
        let targets = [
            snapshot(&[(1, "a")]),
            snapshot(&[(1, "a"), (2, "b")]),
            snapshot(&[(2, "b"), (3, "c")]),
            snapshot(&[(3, "c"), (1, "a"), (2, "b")]),
        ];

        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|target| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.reconcile(target).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Whatever order they ran in, the view matches the committed snapshot.
        let committed = engine.snapshot().await;
        assert!(targets.contains(&committed));
        assert_eq!(engine.with_view(|v| v.shown.clone()).await, committed.item_ids());
    }
}
