//! Single-key property index mapping values to the elements that hold them.

use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHasher;

use crate::collections::CompactSet;
use crate::error::Result;
use crate::model::Element;
use crate::primitives::concurrency::{LockId, WriteLock, WritePermit};
use crate::types::{IndexValue, PropValue};

type EntryMap<T> = DashMap<IndexValue, Arc<CompactSet<T>>, BuildHasherDefault<FxHasher>>;

/// Index over a single property key.
///
/// A value is mapped if and only if at least one indexed element currently
/// holds it. Lookups clone the value's `Arc<CompactSet<T>>` out of the map
/// and iterate it after the shard lock is released, so a reader keeps a
/// consistent snapshot of one value while the writer moves on.
pub struct Index<T: Element> {
    key: Arc<str>,
    entries: EntryMap<T>,
    owner: LockId,
}

impl<T: Element> Index<T> {
    /// Creates an empty index on `key`, mutable only under permits issued by `lock`.
    pub fn new(key: &str, lock: &WriteLock) -> Self {
        Self {
            key: Arc::from(key),
            entries: DashMap::with_hasher(BuildHasherDefault::default()),
            owner: lock.id(),
        }
    }

    /// Indexed property key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Indexed value of `element`; `None` when the element does not apply
    /// (property missing or null).
    pub fn value_of(&self, element: &T) -> Option<IndexValue> {
        element.property(&self.key).and_then(IndexValue::from_prop)
    }

    /// Copy of `element` safe to hand to a caller.
    pub fn detach(&self, element: &T) -> T {
        element.detached()
    }

    /// Bulk population; equivalent to calling [`Index::add`] for each element,
    /// so soft-deleted elements are left out.
    pub fn load<'e, I>(&self, permit: &WritePermit<'_>, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = &'e T>,
    {
        permit.check(self.owner)?;
        for element in elements {
            self.insert(element);
        }
        Ok(())
    }

    /// Adds `element` under its current value. No-op when it has none or is soft-deleted.
    pub fn add(&self, permit: &WritePermit<'_>, element: &T) -> Result<()> {
        permit.check(self.owner)?;
        self.insert(element);
        Ok(())
    }

    /// Removes `element` from its current value, dropping the value once no element holds it.
    pub fn remove(&self, permit: &WritePermit<'_>, element: &T) -> Result<()> {
        permit.check(self.owner)?;
        let Some(value) = self.value_of(element) else {
            return Ok(());
        };
        if let Entry::Occupied(mut entry) = self.entries.entry(value) {
            if !entry.get().contains(element) {
                return Ok(());
            }
            if entry.get().len() == 1 {
                entry.remove();
            } else {
                Arc::make_mut(entry.get_mut()).remove_present(element);
            }
        }
        Ok(())
    }

    /// Detached copies of every element holding `value`; empty when none does.
    pub fn get(&self, value: &PropValue) -> Vec<T> {
        let Some(value) = Option::<IndexValue>::from(value) else {
            return Vec::new();
        };
        let set = self.entries.get(&value).map(|entry| Arc::clone(entry.value()));
        match set {
            Some(set) => set.elements().iter().map(|e| self.detach(e)).collect(),
            None => Vec::new(),
        }
    }

    /// Shared set behind `value`, if mapped.
    pub fn set_for(&self, value: &IndexValue) -> Option<Arc<CompactSet<T>>> {
        self.entries.get(value).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of distinct mapped values.
    pub fn distinct_values(&self) -> usize {
        self.entries.len()
    }

    /// Number of indexed elements.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether no element is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets of every mapped value, in unspecified order.
    pub fn sets(&self) -> Vec<Arc<CompactSet<T>>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    fn insert(&self, element: &T) {
        if element.is_removed() {
            return;
        }
        let Some(value) = self.value_of(element) else {
            return;
        };
        match self.entries.entry(value) {
            Entry::Occupied(mut entry) => {
                if !entry.get().contains(element) {
                    Arc::make_mut(entry.get_mut()).insert(element.clone());
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(CompactSet::singleton(element.clone())));
            }
        }
    }
}

impl<T: Element> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("key", &self.key)
            .field("kind", &T::KIND)
            .field("values", &self.entries.len())
            .finish()
    }
}
