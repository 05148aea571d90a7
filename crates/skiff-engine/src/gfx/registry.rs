//! Resource tables.
//!
//! Each resource kind lives in its own [`ResourceTable`]. Ids start at 1 and
//! are never reused. Removal is two-phase: `retire` moves the entry to a
//! graveyard where draw commands recorded earlier in the frame can still
//! resolve it; `purge` drops the graveyard once the frame's work has been
//! submitted.

use std::collections::HashMap;

pub(crate) struct ResourceTable<T> {
    live: HashMap<u32, T>,
    retired: HashMap<u32, T>,
    next_id: u32,
}

impl<T> ResourceTable<T> {
    pub fn new() -> Self {
        Self {
            live: HashMap::new(),
            retired: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn insert(&mut self, value: T) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, value);
        id
    }

    /// Live entries only.
    pub fn get(&self, id: u32) -> Option<&T> {
        self.live.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.live.get_mut(&id)
    }

    /// Live or retired entries; used during command replay so that resources
    /// destroyed mid-frame stay valid for draws recorded before the destroy.
    pub fn resolve(&self, id: u32) -> Option<&T> {
        self.live.get(&id).or_else(|| self.retired.get(&id))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.live.contains_key(&id)
    }

    /// Moves an entry to the graveyard. Returns whether the id was live.
    pub fn retire(&mut self, id: u32) -> bool {
        match self.live.remove(&id) {
            Some(v) => {
                self.retired.insert(id, v);
                true
            }
            None => false,
        }
    }

    /// Ids currently sitting in the graveyard.
    pub fn retired_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.retired.keys().copied()
    }

    /// Drops everything retired since the last purge.
    pub fn purge(&mut self) {
        self.retired.clear();
    }
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_do_not_repeat() {
        let mut table = ResourceTable::new();
        let a = table.insert("a");
        let b = table.insert("b");
        assert_eq!(a, 1);
        assert_eq!(b, 2);

        assert!(table.retire(a));
        let c = table.insert("c");
        assert_eq!(c, 3);
    }

    #[test]
    fn retired_entries_resolve_until_purge() {
        let mut table = ResourceTable::new();
        let id = table.insert(42);

        assert!(table.retire(id));
        assert!(table.get(id).is_none());
        assert_eq!(table.resolve(id), Some(&42));
        assert!(!table.contains(id));

        table.purge();
        assert!(table.resolve(id).is_none());
    }

    #[test]
    fn retire_unknown_id_is_a_noop() {
        let mut table: ResourceTable<u32> = ResourceTable::new();
        assert!(!table.retire(7));
        assert!(!table.contains(7));
    }

    #[test]
    fn retired_ids_lists_the_graveyard() {
        let mut table = ResourceTable::new();
        let a = table.insert(1);
        let b = table.insert(2);
        table.retire(b);

        let retired: Vec<u32> = table.retired_ids().collect();
        assert_eq!(retired, vec![b]);
        assert!(table.contains(a));

        table.purge();
        assert_eq!(table.retired_ids().count(), 0);
    }
}
