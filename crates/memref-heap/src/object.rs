//! Weak table of host objects written into memory.
//!
//! Writing an object stores an [`ObjectId`] in memory and records only a
//! weak reference here. Once every strong reference is dropped, the id no
//! longer resolves.

use std::any::Any;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use memref_core::{HostObject, MemoryError, ObjectId};

/// Maps object ids to weakly-held host objects.
pub struct ObjectTable {
    entries: IndexMap<ObjectId, Weak<dyn Any + Send + Sync>>,
    next: u64,
}

impl ObjectTable {
    /// Create an empty table. The first id issued is 1.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            next: 1,
        }
    }

    /// Record a weak reference to `object` and return its id.
    pub fn insert(&mut self, object: &HostObject) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        self.entries.insert(id, Arc::downgrade(object));
        id
    }

    /// Resolve an id to its object, if still alive.
    pub fn get(&self, id: ObjectId) -> Result<HostObject, MemoryError> {
        self.entries
            .get(&id)
            .and_then(|weak| weak.upgrade())
            .ok_or(MemoryError::ObjectReclaimed { object: id })
    }

    /// Drop entries whose objects are gone. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of recorded entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memref_core::host_object;

    #[test]
    fn ids_start_at_one() {
        let mut table = ObjectTable::new();
        let obj = host_object(1u8);
        assert_eq!(table.insert(&obj), ObjectId(1));
        assert_eq!(table.insert(&obj), ObjectId(2));
    }

    #[test]
    fn live_object_resolves() {
        let mut table = ObjectTable::new();
        let obj = host_object(String::from("hello"));
        let id = table.insert(&obj);
        let back = table.get(id).unwrap();
        assert!(Arc::ptr_eq(&obj, &back));
        assert_eq!(back.downcast_ref::<String>().unwrap(), "hello");
    }

    #[test]
    fn table_does_not_keep_objects_alive() {
        let mut table = ObjectTable::new();
        let id = table.insert(&host_object(5u32));
        assert_eq!(
            table.get(id).unwrap_err(),
            MemoryError::ObjectReclaimed { object: id }
        );
    }

    #[test]
    fn unknown_id_is_reclaimed() {
        let table = ObjectTable::new();
        assert!(table.get(ObjectId(0)).is_err());
    }

    #[test]
    fn sweep_removes_dead_entries() {
        let mut table = ObjectTable::new();
        let keep = host_object(1u8);
        table.insert(&keep);
        table.insert(&host_object(2u8));
        assert_eq!(table.len(), 2);
        assert_eq!(table.sweep(), 1);
        assert_eq!(table.len(), 1);
    }
}
