//! Elements partitioned into [`CompactSet`] cells by a classifier function.
//!
//! The table is a power-of-two array of buckets keyed by the classifier's
//! hash; each bucket chains the cells whose classifiers collide. The bucket
//! count follows the number of occupied cells, doubling above the grow
//! watermark and halving below the shrink watermark. Watermarks count cells
//! (distinct classifiers), not elements: 10,000 elements under 8 classifiers
//! stay in a 16-bucket table.
//!
//! Cells hold `Arc<CompactSet<T>>`, so cloning a multiset (for example when a
//! [`crate::Published`] writer stages a change) copies bucket pointers only,
//! and a cell's set is copied the first time the new multiset changes it.

use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::sync::Arc;

use rustc_hash::FxHasher;
use smallvec::SmallVec;
use tracing::debug;

use super::compact_set::{CompactSet, Elements};
use crate::error::Result;
use crate::options::MultisetOptions;

#[derive(Clone)]
struct Cell<K, T> {
    key: K,
    set: Arc<CompactSet<T>>,
}

type Bucket<K, T> = SmallVec<[Cell<K, T>; 1]>;

/// Multiset of `T` grouped by classifier `K`.
#[derive(Clone)]
pub struct ClassifierMultiset<K, T> {
    buckets: Box<[Bucket<K, T>]>,
    occupied: usize,
    len: usize,
    options: MultisetOptions,
}

impl<K, T> ClassifierMultiset<K, T>
where
    K: Clone + Eq + Hash,
    T: Clone + Eq + Hash,
{
    /// Creates an empty multiset with default sizing.
    pub fn new() -> Self {
        Self::build(MultisetOptions::default())
    }

    /// Creates an empty multiset with validated sizing options.
    pub fn with_options(options: MultisetOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: MultisetOptions) -> Self {
        Self {
            buckets: empty_buckets(options.bucket_floor()),
            occupied: 0,
            len: 0,
            options,
        }
    }

    /// Adds `value` to the cell of `classifier(&value)`. Returns `false` if already present.
    pub fn add<F>(&mut self, value: T, classifier: F) -> bool
    where
        F: Fn(&T) -> K,
    {
        let key = classifier(&value);
        let idx = self.bucket_of(&key);
        let bucket = &mut self.buckets[idx];
        if let Some(cell) = bucket.iter_mut().find(|cell| cell.key == key) {
            if cell.set.contains(&value) {
                return false;
            }
            Arc::make_mut(&mut cell.set).insert(value);
            self.len += 1;
            return true;
        }
        bucket.push(Cell {
            key,
            set: Arc::new(CompactSet::singleton(value)),
        });
        self.len += 1;
        self.occupied += 1;
        self.maybe_grow();
        true
    }

    /// Removes `value` from the cell of `classifier(value)`; an emptied cell is dropped.
    pub fn remove<F>(&mut self, value: &T, classifier: F) -> bool
    where
        F: Fn(&T) -> K,
    {
        let key = classifier(value);
        let idx = self.bucket_of(&key);
        let bucket = &mut self.buckets[idx];
        let Some(pos) = bucket.iter().position(|cell| cell.key == key) else {
            return false;
        };
        let cell = &mut bucket[pos];
        if !cell.set.contains(value) {
            return false;
        }
        if cell.set.len() == 1 {
            bucket.swap_remove(pos);
            self.occupied -= 1;
        } else {
            Arc::make_mut(&mut cell.set).remove_present(value);
        }
        self.len -= 1;
        self.maybe_shrink();
        true
    }

    /// Elements whose classifier equals `key`; an empty view if there are none.
    ///
    /// The view may be sparse (see [`Elements`]); iterate it to skip holes.
    pub fn super_set_with_classifier(&self, key: &K) -> Elements<'_, T> {
        Elements::of(self.cell(key).map(|set| &**set))
    }

    /// The shared set behind `key`'s cell.
    pub fn cell(&self, key: &K) -> Option<&Arc<CompactSet<T>>> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|cell| cell.key == *key)
            .map(|cell| &cell.set)
    }

    /// Number of non-empty cells, i.e. distinct classifiers in use.
    pub fn occupied_cells(&self) -> usize {
        self.occupied
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the multiset holds no element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Classifiers with at least one element, in unspecified order.
    pub fn classifiers(&self) -> impl Iterator<Item = &K> + '_ {
        self.buckets.iter().flatten().map(|cell| &cell.key)
    }

    /// Every element, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.buckets
            .iter()
            .flatten()
            .flat_map(|cell| cell.set.elements().iter())
    }

    fn bucket_of(&self, key: &K) -> usize {
        let hash = BuildHasherDefault::<FxHasher>::default().hash_one(key);
        (hash as usize) & (self.buckets.len() - 1)
    }

    fn maybe_grow(&mut self) {
        let capacity = self.buckets.len();
        if self.occupied as f64 > self.options.grow_load * capacity as f64 {
            self.resize(capacity * 2);
        }
    }

    fn maybe_shrink(&mut self) {
        let capacity = self.buckets.len();
        let half = capacity / 2;
        if half >= self.options.bucket_floor()
            && (self.occupied as f64) < self.options.shrink_load * capacity as f64
        {
            self.resize(half);
        }
    }

    fn resize(&mut self, capacity: usize) {
        debug!(
            from = self.buckets.len(),
            to = capacity,
            occupied = self.occupied,
            "multiset.resize"
        );
        let old = std::mem::replace(&mut self.buckets, empty_buckets(capacity));
        for cell in old.into_vec().into_iter().flatten() {
            let idx = self.bucket_of(&cell.key);
            self.buckets[idx].push(cell);
        }
    }
}

impl<K, T> Default for ClassifierMultiset<K, T>
where
    K: Clone + Eq + Hash,
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, T> fmt::Debug for ClassifierMultiset<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierMultiset")
            .field("len", &self.len)
            .field("occupied", &self.occupied)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

fn empty_buckets<K, T>(capacity: usize) -> Box<[Bucket<K, T>]> {
    std::iter::repeat_with(SmallVec::new)
        .take(capacity)
        .collect::<Vec<_>>()
        .into_boxed_slice()
}
