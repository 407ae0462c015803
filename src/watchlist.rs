use crate::error::CatalogResult;
use crate::models::{Entry, EntryId};
use std::collections::HashMap;
use tracing::debug;

const COMPACT_MIN_SLOTS: usize = 32;

/// Session-scoped set of kept entries, keyed by id, in insertion order.
///
/// Removal leaves a tombstone in `slots`; the vector is compacted once more
/// than half of it is dead, which keeps every operation amortised O(1).
#[derive(Debug, Default, Clone)]
pub struct Watchlist {
    slots: Vec<Option<Entry>>,
    index: HashMap<EntryId, usize>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.index
            .get(id)
            .and_then(|pos| self.slots.get(*pos))
            .and_then(Option::as_ref)
    }

    pub fn add(&mut self, entry: Entry) -> CatalogResult<()> {
        entry.validate()?;
        if self.index.contains_key(&entry.id) {
            return Ok(());
        }
        debug!(id = %entry.id, title = %entry.title, "watchlist add");
        self.index.insert(entry.id.clone(), self.slots.len());
        self.slots.push(Some(entry));
        Ok(())
    }

    pub fn remove(&mut self, id: &EntryId) {
        let Some(pos) = self.index.remove(id) else {
            return;
        };
        debug!(id = %id, "watchlist remove");
        if let Some(slot) = self.slots.get_mut(pos) {
            *slot = None;
        }
        self.compact_if_sparse();
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, entry: Entry) -> CatalogResult<bool> {
        entry.validate()?;
        if self.contains(&entry.id) {
            self.remove(&entry.id);
            Ok(false)
        } else {
            self.add(entry)?;
            Ok(true)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn snapshot(&self) -> Vec<Entry> {
        self.iter().cloned().collect()
    }

    fn compact_if_sparse(&mut self) {
        let dead = self.slots.len() - self.index.len();
        if self.slots.len() < COMPACT_MIN_SLOTS || dead * 2 <= self.slots.len() {
            return;
        }
        self.slots.retain(Option::is_some);
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot {
                self.index.insert(entry.id.clone(), pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    fn entry(id: i64) -> Entry {
        Entry::new(id, format!("Movie {id}"))
    }

    fn ids(list: &Watchlist) -> Vec<EntryId> {
        list.snapshot().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn add_is_idempotent() {
        let mut list = Watchlist::new();
        list.add(entry(1)).unwrap();
        list.add(entry(1)).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.contains(&EntryId::Num(1)));
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut list = Watchlist::new();
        list.remove(&EntryId::Num(7));
        list.add(entry(1)).unwrap();
        list.remove(&EntryId::Num(1));
        list.remove(&EntryId::Num(1));
        assert!(list.is_empty());
    }

    #[test]
    fn toggle_flips_membership() {
        let mut list = Watchlist::new();
        assert!(list.toggle(entry(5)).unwrap());
        assert!(list.contains(&EntryId::Num(5)));
        assert!(!list.toggle(entry(5)).unwrap());
        assert!(!list.contains(&EntryId::Num(5)));
    }

    #[test]
    fn snapshot_keeps_insertion_order() {
        let mut list = Watchlist::new();
        for id in [3, 1, 2] {
            list.add(entry(id)).unwrap();
        }
        list.remove(&EntryId::Num(1));
        list.add(entry(1)).unwrap();
        assert_eq!(
            ids(&list),
            vec![EntryId::Num(3), EntryId::Num(2), EntryId::Num(1)]
        );
    }

    #[test]
    fn membership_follows_net_parity() {
        // (op, id): 'a' add, 'r' remove, 't' toggle
        let ops = [
            ('a', 1),
            ('a', 2),
            ('t', 1),
            ('t', 3),
            ('a', 3),
            ('r', 2),
            ('r', 2),
            ('t', 2),
            ('t', 1),
            ('r', 3),
        ];
        let mut list = Watchlist::new();
        let mut expected: HashMap<i64, bool> = HashMap::new();
        for (op, id) in ops {
            let present = expected.entry(id).or_insert(false);
            match op {
                'a' => {
                    list.add(entry(id)).unwrap();
                    *present = true;
                }
                'r' => {
                    list.remove(&EntryId::Num(id));
                    *present = false;
                }
                _ => {
                    let now = list.toggle(entry(id)).unwrap();
                    *present = !*present;
                    assert_eq!(now, *present);
                }
            }
        }
        for (id, present) in expected {
            assert_eq!(list.contains(&EntryId::Num(id)), present, "id {id}");
        }
    }

    #[test]
    fn compaction_preserves_order_and_lookup() {
        let mut list = Watchlist::new();
        for id in 0..100 {
            list.add(entry(id)).unwrap();
        }
        for id in (0..100).filter(|id| id % 4 != 0) {
            list.remove(&EntryId::Num(id));
        }
        assert_eq!(list.len(), 25);
        assert!(list.slots.len() < 100);
        let expected: Vec<EntryId> = (0..100)
            .filter(|id| id % 4 == 0)
            .map(EntryId::Num)
            .collect();
        assert_eq!(ids(&list), expected);
        for id in &expected {
            assert_eq!(list.get(id).map(|e| &e.id), Some(id));
        }
    }

    #[test]
    fn malformed_entry_fails_fast() {
        let mut list = Watchlist::new();
        let bad = Entry::new(EntryId::Text(String::new()), "No id");
        assert!(matches!(
            list.add(bad.clone()),
            Err(CatalogError::InvalidArgument(_))
        ));
        assert!(matches!(
            list.toggle(bad),
            Err(CatalogError::InvalidArgument(_))
        ));
        assert!(list.is_empty());
    }
}
