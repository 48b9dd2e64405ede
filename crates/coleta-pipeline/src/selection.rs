//! Multi-select membership with pure toggling.

use std::collections::BTreeSet;

/// An ordered set of selected identifiers.
///
/// [`SelectionSet::toggle`] returns a new set instead of mutating in place,
/// so a caller can keep the previous value around, compare the two, or hand
/// snapshots to a query trigger without cloning defensively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<T: Ord> {
    entries: BTreeSet<T>,
}

impl<T: Ord> SelectionSet<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeSet::new(),
        }
    }

    pub fn contains(&self, id: &T) -> bool {
        self.entries.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate the selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// A new set with `id` removed if present, inserted otherwise.
    #[must_use]
    pub fn toggle(&self, id: T) -> Self
    where
        T: Clone,
    {
        let mut entries = self.entries.clone();
        if !entries.remove(&id) {
            entries.insert(id);
        }
        Self { entries }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.entries.iter().cloned().collect()
    }
}

impl<T: Ord> Default for SelectionSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for SelectionSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, T: Ord> IntoIterator for &'a SelectionSet<T> {
    type Item = &'a T;
    type IntoIter = std::collections::btree_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_inserts_then_removes() {
        let empty: SelectionSet<u64> = SelectionSet::new();
        let with_two = empty.toggle(2);
        assert!(with_two.contains(&2));
        assert_eq!(with_two.len(), 1);

        let back_to_empty = with_two.toggle(2);
        assert!(back_to_empty.is_empty());
    }

    #[test]
    fn test_toggle_leaves_the_original_untouched() {
        let first = SelectionSet::from_iter([1u64, 3]);
        let second = first.toggle(5);
        assert_eq!(first.to_vec(), vec![1, 3]);
        assert_eq!(second.to_vec(), vec![1, 3, 5]);
    }

    #[test]
    fn test_double_toggle_round_trips() {
        let set = SelectionSet::from_iter([4u64, 9]);
        let round_tripped = set.toggle(7).toggle(7);
        assert_eq!(round_tripped, set);
    }

    #[test]
    fn test_iteration_is_ordered() {
        let set = SelectionSet::from_iter([9u64, 1, 5]);
        assert_eq!(set.to_vec(), vec![1, 5, 9]);
    }
}
