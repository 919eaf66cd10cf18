//! Identity-based diff between two snapshots.
//!
//! Indices follow batch-update conventions: `removed` and `Move::from` refer
//! to the old snapshot, `inserted`, `Move::to` and `updated` to the new one.
//! Items of inserted or removed sections are implied by the section change
//! and not listed individually. An item that changes section shows up as a
//! removal in one and an insertion in the other.

use std::{collections::HashMap, fmt, hash::Hash};

use super::snapshot::{ListItem, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move<Id> {
    pub id: Id,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionChanges<S, Id> {
    pub section: S,
    pub removed: Vec<(usize, Id)>,
    pub inserted: Vec<(usize, Id)>,
    pub moved: Vec<Move<Id>>,
    /// Same identity, different content.
    pub updated: Vec<(usize, Id)>,
}

impl<S, Id> SectionChanges<S, Id> {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.inserted.is_empty()
            && self.moved.is_empty()
            && self.updated.is_empty()
    }

    pub fn mutation_count(&self) -> usize {
        self.removed.len() + self.inserted.len() + self.moved.len() + self.updated.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset<S, Id> {
    pub sections_removed: Vec<(usize, S)>,
    pub sections_inserted: Vec<(usize, S)>,
    pub sections_moved: Vec<Move<S>>,
    /// Item changes for sections present in both snapshots. Sections without
    /// changes are omitted.
    pub sections: Vec<SectionChanges<S, Id>>,
}

impl<S, Id> Default for Changeset<S, Id> {
    fn default() -> Self {
        Self {
            sections_removed: Vec::new(),
            sections_inserted: Vec::new(),
            sections_moved: Vec::new(),
            sections: Vec::new(),
        }
    }
}

impl<S, Id> Changeset<S, Id> {
    pub fn is_empty(&self) -> bool {
        self.sections_removed.is_empty()
            && self.sections_inserted.is_empty()
            && self.sections_moved.is_empty()
            && self.sections.is_empty()
    }

    /// Number of visual mutations a view performs for this changeset.
    pub fn mutation_count(&self) -> usize {
        self.sections_removed.len()
            + self.sections_inserted.len()
            + self.sections_moved.len()
            + self
                .sections
                .iter()
                .map(SectionChanges::mutation_count)
                .sum::<usize>()
    }

    pub fn section(&self, id: &S) -> Option<&SectionChanges<S, Id>>
    where
        S: PartialEq,
    {
        self.sections.iter().find(|c| &c.section == id)
    }
}

/// Compute the changes that turn `old` into `new`.
pub fn diff<S, T>(old: &Snapshot<S, T>, new: &Snapshot<S, T>) -> Changeset<S, T::Id>
where
    S: Clone + Eq + Hash + fmt::Debug,
    T: ListItem,
{
    let old_ids: Vec<S> = old.section_ids().cloned().collect();
    let new_ids: Vec<S> = new.section_ids().cloned().collect();
    let ordering = reorder(&old_ids, &new_ids);

    let sections = new
        .sections()
        .iter()
        .filter_map(|new_section| {
            let old_items = old.section(&new_section.id)?;
            let changes = diff_section(new_section.id.clone(), old_items, &new_section.items);
            (!changes.is_empty()).then_some(changes)
        })
        .collect();

    Changeset {
        sections_removed: ordering.removed,
        sections_inserted: ordering.inserted,
        sections_moved: ordering.moved,
        sections,
    }
}

fn diff_section<S, T>(section: S, old: &[T], new: &[T]) -> SectionChanges<S, T::Id>
where
    T: ListItem,
{
    let old_ids: Vec<T::Id> = old.iter().map(ListItem::id).collect();
    let new_ids: Vec<T::Id> = new.iter().map(ListItem::id).collect();
    let ordering = reorder(&old_ids, &new_ids);

    let old_positions: HashMap<&T::Id, usize> =
        old_ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
    let updated = new
        .iter()
        .enumerate()
        .filter_map(|(to, item)| {
            let from = *old_positions.get(&new_ids[to])?;
            (old[from] != *item).then(|| (to, new_ids[to].clone()))
        })
        .collect();

    SectionChanges {
        section,
        removed: ordering.removed,
        inserted: ordering.inserted,
        moved: ordering.moved,
        updated,
    }
}

struct Reorder<K> {
    removed: Vec<(usize, K)>,
    inserted: Vec<(usize, K)>,
    moved: Vec<Move<K>>,
}

/// Removals, insertions and the fewest moves that turn `old` into `new`.
///
/// Keys present in both keep their relative order along a longest increasing
/// subsequence of old positions; everything else among them is a move.
fn reorder<K: Clone + Eq + Hash>(old: &[K], new: &[K]) -> Reorder<K> {
    let old_positions: HashMap<&K, usize> =
        old.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let new_positions: HashMap<&K, usize> =
        new.iter().enumerate().map(|(i, k)| (k, i)).collect();

    let removed = old
        .iter()
        .enumerate()
        .filter(|(_, k)| !new_positions.contains_key(k))
        .map(|(i, k)| (i, k.clone()))
        .collect();

    let mut inserted = Vec::new();
    let mut retained = Vec::new();
    for (to, key) in new.iter().enumerate() {
        match old_positions.get(key) {
            Some(&from) => retained.push((from, to)),
            None => inserted.push((to, key.clone())),
        }
    }

    let sources: Vec<usize> = retained.iter().map(|&(from, _)| from).collect();
    let stays = longest_increasing(&sources);
    let moved = retained
        .iter()
        .zip(stays)
        .filter(|(_, stays)| !stays)
        .map(|(&(from, to), _)| Move {
            id: new[to].clone(),
            from,
            to,
        })
        .collect();

    Reorder {
        removed,
        inserted,
        moved,
    }
}

/// Marks the members of one longest strictly increasing subsequence.
fn longest_increasing(seq: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < value);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut keep = vec![false; seq.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = prev[i];
    }
    keep
}
