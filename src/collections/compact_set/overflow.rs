use std::hash::{BuildHasher, BuildHasherDefault, Hash};

use rustc_hash::FxHasher;
use tracing::debug;

/// Smallest slot count an overflow table is ever built with.
pub const MIN_CAPACITY: usize = 64;

type FxBuild = BuildHasherDefault<FxHasher>;

/// One slot of the overflow tier's open-addressed table.
///
/// `Empty` and `Vacated` are both holes. `Vacated` additionally marks a slot
/// that once held an element, so probes continue past it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<T> {
    /// Never occupied since the last rebuild.
    Empty,
    /// Occupied once, element since removed.
    Vacated,
    /// Holds a live element.
    Occupied(T),
}

impl<T> Slot<T> {
    /// Returns the element if the slot is occupied.
    pub fn get(&self) -> Option<&T> {
        match self {
            Slot::Occupied(value) => Some(value),
            Slot::Empty | Slot::Vacated => None,
        }
    }

    /// Returns `true` for `Empty` and `Vacated` slots.
    pub fn is_hole(&self) -> bool {
        !matches!(self, Slot::Occupied(_))
    }
}

/// Linear-probing hash table backing sets larger than the biggest fixed tier.
///
/// Capacity is always a power of two. The table grows when live plus vacated
/// slots would pass 3/4 of capacity and shrinks when live slots drop below 1/4.
#[derive(Clone, Debug)]
pub(crate) struct OverflowTable<T> {
    slots: Box<[Slot<T>]>,
    len: usize,
    vacated: usize,
}

impl<T> OverflowTable<T> {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn vacated(&self) -> usize {
        self.vacated
    }

    pub(crate) fn slots(&self) -> &[Slot<T>] {
        &self.slots
    }
}

impl<T: Eq + Hash> OverflowTable<T> {
    /// Builds a table holding `items`, which must be pairwise distinct.
    pub(crate) fn from_distinct(items: impl IntoIterator<Item = T>) -> Self {
        let items: Vec<T> = items.into_iter().collect();
        let mut table = Self::with_capacity(capacity_for(items.len()));
        for item in items {
            table.place(item);
        }
        table
    }

    fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let slots = std::iter::repeat_with(|| Slot::Empty)
            .take(capacity)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            len: 0,
            vacated: 0,
        }
    }

    pub(crate) fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    fn home(&self, value: &T) -> usize {
        let hash = finalize(FxBuild::default().hash_one(value));
        (hash as usize) & (self.slots.len() - 1)
    }

    fn find(&self, value: &T) -> Option<usize> {
        let mask = self.slots.len() - 1;
        let mut idx = self.home(value);
        for _ in 0..self.slots.len() {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied(existing) if existing == value => return Some(idx),
                Slot::Occupied(_) | Slot::Vacated => {}
            }
            idx = (idx + 1) & mask;
        }
        None
    }

    /// Inserts a value known to be absent, resizing first if the high
    /// watermark would be crossed.
    pub(crate) fn insert_absent(&mut self, value: T) {
        if exceeds_high_watermark(self.len + self.vacated + 1, self.capacity()) {
            let target = if exceeds_high_watermark(self.len + 1, self.capacity()) {
                self.capacity() * 2
            } else {
                self.capacity()
            };
            self.rebuild(target);
        }
        self.place(value);
    }

    /// Removes `value` if present, leaving a vacated hole in its slot.
    pub(crate) fn remove(&mut self, value: &T) -> bool {
        let Some(idx) = self.find(value) else {
            return false;
        };
        self.slots[idx] = Slot::Vacated;
        self.len -= 1;
        self.vacated += 1;
        let half = self.capacity() / 2;
        if half >= MIN_CAPACITY && self.len * 4 < self.capacity() {
            self.rebuild(half);
        }
        true
    }

    /// Drains every live element, dropping the table.
    pub(crate) fn into_values(self) -> impl Iterator<Item = T> {
        self.slots.into_vec().into_iter().filter_map(|slot| match slot {
            Slot::Occupied(value) => Some(value),
            Slot::Empty | Slot::Vacated => None,
        })
    }

    fn place(&mut self, value: T) {
        let mask = self.slots.len() - 1;
        let mut idx = self.home(&value);
        loop {
            match self.slots[idx] {
                Slot::Empty => break,
                Slot::Vacated => {
                    self.vacated -= 1;
                    break;
                }
                Slot::Occupied(_) => idx = (idx + 1) & mask,
            }
        }
        self.slots[idx] = Slot::Occupied(value);
        self.len += 1;
    }

    fn rebuild(&mut self, capacity: usize) {
        debug!(
            from = self.capacity(),
            to = capacity,
            len = self.len,
            vacated = self.vacated,
            "compact_set.overflow.rebuild"
        );
        let old = std::mem::replace(self, Self::with_capacity(capacity));
        for value in old.into_values() {
            self.place(value);
        }
    }
}

/// fmix64 finalizer: spreads every input bit into the low bits that pick the home slot.
fn finalize(mut hash: u64) -> u64 {
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51_afd7_ed55_8ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    hash ^ (hash >> 33)
}

fn exceeds_high_watermark(used: usize, capacity: usize) -> bool {
    used * 4 > capacity * 3
}

fn capacity_for(len: usize) -> usize {
    let mut capacity = MIN_CAPACITY;
    while exceeds_high_watermark(len, capacity) {
        capacity *= 2;
    }
    capacity
}
