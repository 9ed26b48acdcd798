//! Per-element-type registry of property indexes.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::property::Index;
use crate::error::{IndexError, Result};
use crate::metrics::IndexMetrics;
use crate::model::{Element, ElementKind};
use crate::options::RegistryOptions;
use crate::primitives::concurrency::{WriteLock, WritePermit};
use crate::types::PropValue;

type IndexMap<T> = FxHashMap<String, Arc<Index<T>>>;

/// Every index defined for one element type.
///
/// The key → index map is republished whole on each create/drop, so
/// [`IndexRegistry::get`], [`IndexRegistry::indexed_keys`] and
/// [`IndexRegistry::has_index`] never lock. All mutations go through a
/// [`RegistryWriter`], which holds the registry's write lock for as long as
/// it lives.
pub struct IndexRegistry<T: Element> {
    indices: ArcSwap<IndexMap<T>>,
    lock: WriteLock,
    metrics: Arc<dyn IndexMetrics>,
}

/// Exclusive write access to an [`IndexRegistry`].
pub struct RegistryWriter<'a, T: Element> {
    registry: &'a IndexRegistry<T>,
    permit: WritePermit<'a>,
}

impl<T: Element> IndexRegistry<T> {
    /// Creates an empty registry with default options.
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Creates an empty registry.
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            indices: ArcSwap::from_pointee(IndexMap::default()),
            lock: WriteLock::new(),
            metrics: options.metrics,
        }
    }

    /// Element type this registry indexes.
    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    /// Blocks until no other writer is active and returns the writer handle.
    pub fn write(&self) -> RegistryWriter<'_, T> {
        RegistryWriter {
            registry: self,
            permit: self.lock.acquire(),
        }
    }

    /// Detached copies of the elements whose `key` property equals `value`.
    ///
    /// Fails with [`IndexError::MissingIndex`] when `key` is not indexed; the
    /// error lists the keys that are.
    pub fn get(&self, key: &str, value: &PropValue) -> Result<Vec<T>> {
        let indices = self.indices.load();
        match indices.get(key) {
            Some(index) => {
                self.metrics.index_hit();
                Ok(index.get(value))
            }
            None => {
                self.metrics.index_miss();
                let mut known: Vec<String> = indices.keys().cloned().collect();
                known.sort_unstable();
                Err(IndexError::MissingIndex {
                    key: key.to_owned(),
                    known,
                })
            }
        }
    }

    /// Names of the indexed keys. The set is a copy.
    pub fn indexed_keys(&self) -> BTreeSet<String> {
        self.indices.load().keys().cloned().collect()
    }

    /// Whether `key` is indexed.
    pub fn has_index(&self, key: &str) -> bool {
        self.indices.load().contains_key(key)
    }

    /// The index registered for `key`.
    pub fn index(&self, key: &str) -> Option<Arc<Index<T>>> {
        self.indices.load().get(key).cloned()
    }

    pub(crate) fn metrics(&self) -> &dyn IndexMetrics {
        self.metrics.as_ref()
    }
}

impl<T: Element> Default for IndexRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> fmt::Debug for IndexRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("kind", &T::KIND)
            .field("keys", &self.indexed_keys())
            .finish()
    }
}

impl<T: Element> RegistryWriter<'_, T> {
    /// Builds an index on `key` over `elements` and registers it.
    ///
    /// Fails with [`IndexError::IndexAlreadyExists`] when `key` is already
    /// indexed; the existing index is left as is.
    pub fn create_index<'e, I>(&mut self, key: &str, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = &'e T>,
    {
        if self.registry.has_index(key) {
            return Err(IndexError::IndexAlreadyExists {
                key: key.to_owned(),
            });
        }
        let index = Index::new(key, &self.registry.lock);
        index.load(&self.permit, elements)?;
        debug!(
            kind = %T::KIND,
            key,
            values = index.distinct_values(),
            "index_registry.create"
        );
        let mut next = IndexMap::clone(&self.registry.indices.load());
        next.insert(key.to_owned(), Arc::new(index));
        self.registry.indices.store(Arc::new(next));
        Ok(())
    }

    /// Unregisters the index on `key`. Returns whether one existed.
    pub fn drop_index(&mut self, key: &str) -> bool {
        let mut next = IndexMap::clone(&self.registry.indices.load());
        if next.remove(key).is_none() {
            return false;
        }
        debug!(kind = %T::KIND, key, "index_registry.drop");
        self.registry.indices.store(Arc::new(next));
        true
    }

    /// Adds `element` to every registered index.
    pub fn add(&self, element: &T) -> Result<()> {
        for index in self.registry.indices.load().values() {
            index.add(&self.permit, element)?;
        }
        Ok(())
    }

    /// Removes `element` from every registered index.
    pub fn remove(&self, element: &T) -> Result<()> {
        for index in self.registry.indices.load().values() {
            index.remove(&self.permit, element)?;
        }
        Ok(())
    }

    /// Re-indexes an element whose properties changed from `old` to `new`.
    pub fn replace(&self, old: &T, new: &T) -> Result<()> {
        self.remove(old)?;
        self.add(new)
    }

    /// The permit this writer holds, for driving an [`Index`] directly.
    pub fn permit(&self) -> &WritePermit<'_> {
        &self.permit
    }
}
