//! Keyed snapshot of one entity type.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Entities stored in a snapshot are keyed by their stringified id.
pub trait Keyed {
    fn key(&self) -> String;
}

/// Mapping from `id.to_string()` to entity.
///
/// Ordered so that the serialized form, and therefore the published file, only
/// changes when the content does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Keyed + PartialEq> Snapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `record` under its key.
    ///
    /// Returns `true` when the record was absent or differed from the stored one.
    pub fn upsert(&mut self, record: T) -> bool {
        match self.entries.entry(record.key()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            btree_map::Entry::Occupied(mut slot) => {
                let changed = *slot.get() != record;
                slot.insert(record);
                changed
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Entries whose key does not match their id.
    pub fn misplaced_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(key, value)| **key != value.key())
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl<T: Keyed + PartialEq> FromIterator<T> for Snapshot<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for record in iter {
            snapshot.upsert(record);
        }
        snapshot
    }
}
