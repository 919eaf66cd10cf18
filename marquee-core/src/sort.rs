//! Ordering of tracked items for display.

use std::{cmp::Reverse, fmt, str::FromStr};

use marquee_model::TrackedItem;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    /// Case-insensitive on display name.
    #[default]
    Alphabetical,
    /// Ascending progress.
    LeastAdvanced,
    /// Descending progress.
    MoreAdvanced,
}

impl SortCriterion {
    pub const ALL: [SortCriterion; 3] = [
        SortCriterion::Alphabetical,
        SortCriterion::LeastAdvanced,
        SortCriterion::MoreAdvanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortCriterion::Alphabetical => "alphabetical",
            SortCriterion::LeastAdvanced => "least_advanced",
            SortCriterion::MoreAdvanced => "more_advanced",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort criterion: {s}"))
    }
}

/// Extracted comparison key; built once per item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Name(String),
    Ascending(OrderedFloat<f64>),
    Descending(Reverse<OrderedFloat<f64>>),
}

impl SortKey {
    fn extract(item: &TrackedItem, criterion: SortCriterion) -> Self {
        match criterion {
            SortCriterion::Alphabetical => {
                SortKey::Name(item.display_name.to_lowercase())
            }
            SortCriterion::LeastAdvanced => {
                SortKey::Ascending(OrderedFloat(item.progress))
            }
            SortCriterion::MoreAdvanced => {
                SortKey::Descending(Reverse(OrderedFloat(item.progress)))
            }
        }
    }
}

/// Pure, stable ordering of tracked items.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortPolicy;

impl SortPolicy {
    /// Return `items` ordered by `criterion`. Equal keys keep their input
    /// order, so applying the same criterion twice is a no-op.
    pub fn apply(items: &[TrackedItem], criterion: SortCriterion) -> Vec<TrackedItem> {
        let mut sorted = items.to_vec();
        Self::sort_in_place(&mut sorted, criterion);
        sorted
    }

    pub fn sort_in_place(items: &mut [TrackedItem], criterion: SortCriterion) {
        // `sort_by_cached_key` is stable.
        items.sort_by_cached_key(|item| SortKey::extract(item, criterion));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::TrackedItemId;

    fn item(name: &str, progress: f64) -> TrackedItem {
        TrackedItem::new(TrackedItemId::new(), name, progress).unwrap()
    }

    fn names(items: &[TrackedItem]) -> Vec<&str> {
        items.iter().map(|i| i.display_name.as_str()).collect()
    }

    #[test]
    fn alphabetical_ignores_case() {
        let items = vec![item("bravo", 0.1), item("Alpha", 0.2), item("charlie", 0.3)];
        let sorted = SortPolicy::apply(&items, SortCriterion::Alphabetical);
        assert_eq!(names(&sorted), vec!["Alpha", "bravo", "charlie"]);
    }

    #[test]
    fn progress_orders_both_directions() {
        let items = vec![item("A", 0.2), item("B", 0.8), item("C", 0.5)];
        assert_eq!(
            names(&SortPolicy::apply(&items, SortCriterion::MoreAdvanced)),
            vec!["B", "C", "A"]
        );
        assert_eq!(
            names(&SortPolicy::apply(&items, SortCriterion::LeastAdvanced)),
            vec!["A", "C", "B"]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let items = vec![
            item("first", 0.5),
            item("second", 0.5),
            item("FIRST", 0.1),
            item("third", 0.5),
        ];

        let by_progress = SortPolicy::apply(&items, SortCriterion::MoreAdvanced);
        assert_eq!(names(&by_progress), vec!["first", "second", "third", "FIRST"]);

        let by_name = SortPolicy::apply(&items, SortCriterion::Alphabetical);
        assert_eq!(names(&by_name), vec!["first", "FIRST", "second", "third"]);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let items = vec![item("d", 0.3), item("b", 0.3), item("a", 0.9), item("c", 0.0)];
        for criterion in SortCriterion::ALL {
            let once = SortPolicy::apply(&items, criterion);
            let twice = SortPolicy::apply(&once, criterion);
            assert_eq!(once, twice, "{criterion}");
        }
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(SortPolicy::apply(&[], SortCriterion::Alphabetical).is_empty());
    }

    #[test]
    fn criterion_parses_and_serializes() {
        assert_eq!(
            "More_Advanced".parse::<SortCriterion>(),
            Ok(SortCriterion::MoreAdvanced)
        );
        assert!("newest".parse::<SortCriterion>().is_err());
        assert_eq!(
            serde_json::to_string(&SortCriterion::LeastAdvanced).unwrap(),
            "\"least_advanced\""
        );
    }
}
