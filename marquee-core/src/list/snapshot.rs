use std::{collections::HashSet, fmt, hash::Hash};

use crate::error::SnapshotError;

/// A value that can appear in a list snapshot.
///
/// `id` is the identity used for diffing; the rest of the value is compared
/// with `PartialEq` to detect in-place content updates.
pub trait ListItem: Clone + PartialEq {
    type Id: Clone + Eq + Hash + fmt::Debug;

    fn id(&self) -> Self::Id;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section<S, T> {
    pub id: S,
    pub items: Vec<T>,
}

/// Declarative target state of a sectioned list.
///
/// Section ids are unique, and item ids are unique within their section.
/// Both invariants are enforced on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<S, T> {
    sections: Vec<Section<S, T>>,
}

impl<S, T> Default for Snapshot<S, T> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
        }
    }
}

impl<S, T> Snapshot<S, T>
where
    S: Clone + Eq + Hash + fmt::Debug,
    T: ListItem,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sections<I>(sections: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (S, Vec<T>)>,
    {
        let mut snapshot = Self::new();
        for (id, items) in sections {
            snapshot.append_section(id)?;
            let last = snapshot.sections.len() - 1;
            snapshot.push_items(last, items)?;
        }
        Ok(snapshot)
    }

    pub fn append_section(&mut self, id: S) -> Result<(), SnapshotError> {
        if self.sections.iter().any(|s| s.id == id) {
            return Err(SnapshotError::DuplicateSection(format!("{id:?}")));
        }
        self.sections.push(Section {
            id,
            items: Vec::new(),
        });
        Ok(())
    }

    pub fn append_items<I>(&mut self, section: &S, items: I) -> Result<(), SnapshotError>
    where
        I: IntoIterator<Item = T>,
    {
        let index = self
            .sections
            .iter()
            .position(|s| &s.id == section)
            .ok_or_else(|| SnapshotError::UnknownSection(format!("{section:?}")))?;
        self.push_items(index, items)
    }

    fn push_items<I>(&mut self, index: usize, items: I) -> Result<(), SnapshotError>
    where
        I: IntoIterator<Item = T>,
    {
        let section = &mut self.sections[index];
        let batch: Vec<T> = items.into_iter().collect();
        let mut seen: HashSet<T::Id> = section.items.iter().map(ListItem::id).collect();
        let duplicate = batch
            .iter()
            .map(ListItem::id)
            .find(|id| !seen.insert(id.clone()));
        if let Some(duplicate) = duplicate {
            return Err(SnapshotError::DuplicateItem {
                section: format!("{:?}", section.id),
                item: format!("{duplicate:?}"),
            });
        }
        section.items.extend(batch);
        Ok(())
    }

    pub fn sections(&self) -> &[Section<S, T>] {
        &self.sections
    }

    pub fn section(&self, id: &S) -> Option<&[T]> {
        self.sections
            .iter()
            .find(|s| &s.id == id)
            .map(|s| s.items.as_slice())
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &S> {
        self.sections.iter().map(|s| &s.id)
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.sections
            .iter()
            .any(|s| s.items.iter().any(|item| &item.id() == id))
    }

    /// Item ids in display order across all sections.
    pub fn item_ids(&self) -> Vec<T::Id> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().map(ListItem::id))
            .collect()
    }
}
