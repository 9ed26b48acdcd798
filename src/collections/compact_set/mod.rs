//! Size-tiered copy-on-write set tuned for buckets that usually hold one or a
//! few elements.
//!
//! A set is always handled as `Option<Arc<CompactSet<T>>>`: `None` is the
//! empty set, and no zero-element `CompactSet` is ever constructed. The
//! representation depends only on cardinality:
//!
//! | cardinality | tier              |
//! |-------------|-------------------|
//! | 1           | [`Tier::Single`]  |
//! | 2..=24      | [`Tier::Fixed`] with capacity 2, 3, 4, 6, 8, 12 or 24 |
//! | 25..        | [`Tier::Overflow`] open-addressed table |
//!
//! Mutations go through [`CompactSet::add`] and [`CompactSet::remove`], which
//! clone a representation that may still be visible to readers before
//! changing it. Readers holding an older `Arc` never observe the change.

mod overflow;

use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::trace;

use overflow::OverflowTable;
pub use overflow::{Slot, MIN_CAPACITY as OVERFLOW_MIN_CAPACITY};

/// Capacities of the fixed tiers, smallest first.
pub const FIXED_CAPACITIES: [usize; 7] = [2, 3, 4, 6, 8, 12, 24];

/// Largest cardinality held without hashing.
pub const MAX_FIXED_CAPACITY: usize = 24;

/// Representation class of a non-empty [`CompactSet`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tier {
    /// A bare element.
    Single,
    /// Inline storage with the given capacity.
    Fixed(usize),
    /// Open-addressed hash table.
    Overflow,
}

impl Tier {
    /// Tier that represents a set of `len` elements, `None` for the empty set.
    pub fn for_len(len: usize) -> Option<Tier> {
        match len {
            0 => None,
            1 => Some(Tier::Single),
            n if n <= MAX_FIXED_CAPACITY => FIXED_CAPACITIES
                .iter()
                .copied()
                .find(|&cap| cap >= n)
                .map(Tier::Fixed),
            _ => Some(Tier::Overflow),
        }
    }

    /// Largest cardinality the tier holds; `None` for the unbounded overflow tier.
    pub fn capacity(self) -> Option<usize> {
        match self {
            Tier::Single => Some(1),
            Tier::Fixed(cap) => Some(cap),
            Tier::Overflow => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Single => write!(f, "1"),
            Tier::Fixed(cap) => write!(f, "{cap}"),
            Tier::Overflow => write!(f, "overflow"),
        }
    }
}

#[derive(Clone)]
enum Repr<T> {
    Single(T),
    Fixed { capacity: usize, items: Vec<T> },
    Overflow(OverflowTable<T>),
}

/// Non-empty set of distinct elements in one of the size tiers.
#[derive(Clone)]
pub struct CompactSet<T> {
    repr: Repr<T>,
}

/// Number of elements in a possibly absent set.
pub fn size<T>(set: Option<&CompactSet<T>>) -> usize {
    set.map_or(0, CompactSet::len)
}

impl<T> CompactSet<T> {
    /// Number of live elements.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Single(_) => 1,
            Repr::Fixed { items, .. } => items.len(),
            Repr::Overflow(table) => table.len(),
        }
    }

    /// Always `false`: an empty set is represented by `None`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Current representation class.
    pub fn tier(&self) -> Tier {
        match &self.repr {
            Repr::Single(_) => Tier::Single,
            Repr::Fixed { capacity, .. } => Tier::Fixed(*capacity),
            Repr::Overflow(_) => Tier::Overflow,
        }
    }

    /// Read-only view of the backing storage.
    ///
    /// Only the overflow tier yields a [`Elements::Sparse`] view, whose holes
    /// must be skipped; [`Elements::iter`] does so.
    pub fn elements(&self) -> Elements<'_, T> {
        match &self.repr {
            Repr::Single(value) => Elements::Dense(std::slice::from_ref(value)),
            Repr::Fixed { items, .. } => Elements::Dense(items),
            Repr::Overflow(table) => Elements::Sparse(table.slots()),
        }
    }

    /// Vacated overflow slots not yet reclaimed by a rebuild.
    pub fn holes(&self) -> usize {
        match &self.repr {
            Repr::Overflow(table) => table.vacated(),
            Repr::Single(_) | Repr::Fixed { .. } => 0,
        }
    }
}

impl<T: Clone + Eq + Hash> CompactSet<T> {
    /// Set holding exactly `value`.
    pub fn singleton(value: T) -> Self {
        Self {
            repr: Repr::Single(value),
        }
    }

    /// Builds a set from `values`, ignoring duplicates. `None` if `values` is empty.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Option<Self> {
        let mut values = values.into_iter();
        let mut set = Self::singleton(values.next()?);
        for value in values {
            set.insert(value);
        }
        Some(set)
    }

    /// Returns whether `value` is in the set.
    ///
    /// Single and fixed tiers scan linearly; the overflow tier hashes.
    pub fn contains(&self, value: &T) -> bool {
        match &self.repr {
            Repr::Single(existing) => existing == value,
            Repr::Fixed { items, .. } => items.contains(value),
            Repr::Overflow(table) => table.contains(value),
        }
    }

    /// Adds `value` to a privately owned set. Returns `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.insert_absent(value);
        true
    }

    /// Returns a set that also contains `value`.
    ///
    /// The input `Arc` comes back unchanged when `value` is already present.
    /// Otherwise the representation is cloned if anyone else can still see
    /// it, and promoted to the next tier if it is full.
    pub fn add(set: Option<Arc<Self>>, value: T) -> Arc<Self> {
        match set {
            None => Arc::new(Self::singleton(value)),
            Some(set) if set.contains(&value) => set,
            Some(mut set) => {
                Arc::make_mut(&mut set).insert_absent(value);
                set
            }
        }
    }

    /// Returns a set without `value`; `None` once the last element is gone.
    ///
    /// The input `Arc` comes back unchanged when `value` is absent.
    pub fn remove(set: Option<Arc<Self>>, value: &T) -> Option<Arc<Self>> {
        let mut set = set?;
        if !set.contains(value) {
            return Some(set);
        }
        if set.len() == 1 {
            return None;
        }
        Arc::make_mut(&mut set).remove_present(value);
        Some(set)
    }

    /// [`CompactSet::add`] for writers that do not share a lock.
    ///
    /// Runs a read-copy-update loop: build the successor from the observed
    /// set, publish it only if the slot still holds what was observed, retry
    /// otherwise. The loop is unbounded; a lost race means another writer
    /// published, so some writer always makes progress.
    pub fn add_safe(slot: &ArcSwapOption<Self>, value: T) -> Arc<Self> {
        let mut attempts = 0u32;
        let mut published = None;
        slot.rcu(|current| {
            attempts += 1;
            let next = Self::add(current.clone(), value.clone());
            published = Some(Arc::clone(&next));
            Some(next)
        });
        if attempts > 1 {
            trace!(retries = attempts - 1, "compact_set.add_safe.contended");
        }
        published.unwrap_or_else(|| Self::add(slot.load_full(), value))
    }

    /// Removes `value`, which must be present, from a set of at least two elements.
    pub(crate) fn remove_present(&mut self, value: &T) {
        let next_len = self.len() - 1;
        let target = Tier::for_len(next_len);
        let repr = std::mem::replace(&mut self.repr, Repr::placeholder());
        self.repr = match repr {
            Repr::Single(existing) => Repr::Single(existing),
            Repr::Fixed {
                capacity,
                mut items,
            } => {
                if let Some(pos) = items.iter().position(|item| item == value) {
                    items.swap_remove(pos);
                }
                match target {
                    Some(Tier::Fixed(cap)) if cap == capacity => Repr::Fixed { capacity, items },
                    _ => {
                        trace!(from = capacity, len = next_len, "compact_set.demote");
                        Repr::canonical(items)
                    }
                }
            }
            Repr::Overflow(mut table) => {
                table.remove(value);
                if target == Some(Tier::Overflow) {
                    Repr::Overflow(table)
                } else {
                    trace!(len = next_len, "compact_set.demote_overflow");
                    Repr::canonical(table.into_values().collect())
                }
            }
        };
    }

    fn insert_absent(&mut self, value: T) {
        let next_len = self.len() + 1;
        let repr = std::mem::replace(&mut self.repr, Repr::placeholder());
        self.repr = match repr {
            Repr::Fixed {
                capacity,
                mut items,
            } if items.len() < capacity => {
                items.push(value);
                Repr::Fixed { capacity, items }
            }
            Repr::Overflow(mut table) => {
                table.insert_absent(value);
                Repr::Overflow(table)
            }
            Repr::Single(existing) => Repr::canonical(vec![existing, value]),
            Repr::Fixed { capacity, mut items } => {
                trace!(from = capacity, len = next_len, "compact_set.promote");
                items.push(value);
                Repr::canonical(items)
            }
        };
    }
}

impl<T: Eq + Hash> Repr<T> {
    fn placeholder() -> Self {
        Repr::Fixed {
            capacity: 0,
            items: Vec::new(),
        }
    }

    /// Representation for `items` (distinct, at least one) in the tier its length selects.
    fn canonical(mut items: Vec<T>) -> Self {
        match Tier::for_len(items.len()) {
            Some(Tier::Single) | None => match items.pop() {
                Some(value) => Repr::Single(value),
                None => Repr::placeholder(),
            },
            Some(Tier::Fixed(capacity)) => {
                let mut sized = Vec::with_capacity(capacity);
                sized.extend(items);
                Repr::Fixed {
                    capacity,
                    items: sized,
                }
            }
            Some(Tier::Overflow) => Repr::Overflow(OverflowTable::from_distinct(items)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CompactSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactSet")
            .field("tier", &self.tier())
            .field("elements", &self.elements().iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Clone + Eq + Hash> PartialEq for CompactSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.elements().iter().all(|value| other.contains(value))
    }
}

impl<T: Clone + Eq + Hash> Eq for CompactSet<T> {}

/// Read-only view over a set's backing storage.
#[derive(Debug)]
pub enum Elements<'a, T> {
    /// Hole-free storage of the single and fixed tiers.
    Dense(&'a [T]),
    /// Overflow-tier slots; `Empty` and `Vacated` slots are holes.
    Sparse(&'a [Slot<T>]),
}

impl<T> Clone for Elements<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Elements<'_, T> {}

impl<'a, T> Elements<'a, T> {
    /// View with no elements, used for absent sets.
    pub fn empty() -> Self {
        Elements::Dense(&[])
    }

    /// View of a possibly absent set.
    pub fn of(set: Option<&'a CompactSet<T>>) -> Self {
        set.map_or_else(Self::empty, CompactSet::elements)
    }

    /// Iterates live elements, skipping holes.
    pub fn iter(&self) -> Iter<'a, T> {
        match *self {
            Elements::Dense(items) => Iter::Dense(items.iter()),
            Elements::Sparse(slots) => Iter::Sparse(slots.iter()),
        }
    }

    /// Raw storage length, holes included.
    pub fn slot_count(&self) -> usize {
        match self {
            Elements::Dense(items) => items.len(),
            Elements::Sparse(slots) => slots.len(),
        }
    }

    /// Whether the view contains no live element.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Clones the live elements into a vector.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for Elements<'a, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the live elements of an [`Elements`] view.
#[derive(Debug)]
pub enum Iter<'a, T> {
    /// Over dense storage.
    Dense(std::slice::Iter<'a, T>),
    /// Over overflow slots.
    Sparse(std::slice::Iter<'a, Slot<T>>),
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        match self {
            Iter::Dense(items) => items.next(),
            Iter::Sparse(slots) => slots.find_map(Slot::get),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Dense(items) => items.size_hint(),
            Iter::Sparse(slots) => (0, Some(slots.len())),
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}
