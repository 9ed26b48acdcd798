//! Size-tiered, copy-on-write property map attached to a single element.
//!
//! Up to six keys live in parallel inline key/value slots with capacity 1, 2,
//! 3, 4 or 6; larger dictionaries switch to a hash map. The tier is selected
//! by key count alone, exactly like [`crate::CompactSet`]. The empty
//! dictionary carries no storage at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::PropValue;

/// Capacities of the inline tiers, smallest first.
pub const INLINE_CAPACITIES: [usize; 5] = [1, 2, 3, 4, 6];

/// Largest key count kept inline.
pub const MAX_INLINE_CAPACITY: usize = 6;

/// Representation class of a [`Dictionary`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DictTier {
    /// No properties.
    Empty,
    /// Inline slot pairs with the given capacity.
    Inline(usize),
    /// Hash map.
    Map,
}

impl DictTier {
    /// Tier that represents `len` distinct keys.
    pub fn for_len(len: usize) -> DictTier {
        match len {
            0 => DictTier::Empty,
            n if n <= MAX_INLINE_CAPACITY => INLINE_CAPACITIES
                .iter()
                .copied()
                .find(|&cap| cap >= n)
                .map_or(DictTier::Map, DictTier::Inline),
            _ => DictTier::Map,
        }
    }
}

#[derive(Clone)]
enum Repr {
    Inline {
        capacity: usize,
        keys: Vec<Arc<str>>,
        values: Vec<PropValue>,
    },
    Map(FxHashMap<Arc<str>, PropValue>),
}

/// Immutable-by-publication property map.
///
/// Cloning the handle is cheap and shares storage; mutations through
/// [`Dictionary::set_property`] and [`Dictionary::remove_property`] copy the
/// storage first whenever another handle can still see it.
#[derive(Clone, Default)]
pub struct Dictionary {
    repr: Option<Arc<Repr>>,
}

impl Dictionary {
    /// The empty dictionary.
    pub fn empty() -> Self {
        Self { repr: None }
    }

    /// Builds a dictionary from key/value pairs; later duplicates win.
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PropValue>,
    {
        entries
            .into_iter()
            .fold(Self::empty(), |dict, (key, value)| {
                dict.set_property(key.as_ref(), value)
            })
    }

    /// Copies the entries into a standard map.
    pub fn to_map(&self) -> HashMap<String, PropValue> {
        self.iter()
            .map(|(key, value)| (key.to_owned(), value.clone()))
            .collect()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.repr.as_deref().map_or(0, Repr::len)
    }

    /// Whether the dictionary has no keys.
    pub fn is_empty(&self) -> bool {
        self.repr.is_none()
    }

    /// Current representation class.
    pub fn tier(&self) -> DictTier {
        match self.repr.as_deref() {
            None => DictTier::Empty,
            Some(Repr::Inline { capacity, .. }) => DictTier::Inline(*capacity),
            Some(Repr::Map(_)) => DictTier::Map,
        }
    }

    /// Value stored under `key`.
    pub fn property(&self, key: &str) -> Option<&PropValue> {
        self.repr.as_deref().and_then(|repr| repr.get(key))
    }

    /// Whether `key` has a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// Iterates the keys without allocating.
    pub fn property_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates key/value pairs in unspecified order.
    pub fn iter(&self) -> Iter<'_> {
        match self.repr.as_deref() {
            None => Iter::Empty,
            Some(Repr::Inline { keys, values, .. }) => Iter::Inline(keys.iter().zip(values.iter())),
            Some(Repr::Map(map)) => Iter::Map(map.iter()),
        }
    }

    /// Returns the dictionary with `key` set to `value`.
    ///
    /// Overwriting an existing key never changes the tier; a new key promotes
    /// the tier when the current one is full.
    pub fn set_property(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        let value = value.into();
        let Some(repr) = self.repr.as_mut() else {
            return Self::from_repr(Repr::Inline {
                capacity: 1,
                keys: vec![Arc::from(key)],
                values: vec![value],
            });
        };
        let repr = Arc::make_mut(repr);
        if let Some(existing) = repr.get_mut(key) {
            *existing = value;
        } else {
            repr.insert_absent(key, value);
        }
        self
    }

    /// Returns the dictionary without `key`.
    ///
    /// The very same handle comes back when `key` is absent
    /// (see [`Dictionary::ptr_eq`]); removing the last key yields the empty
    /// dictionary.
    pub fn remove_property(mut self, key: &str) -> Self {
        let present_len = self
            .repr
            .as_deref()
            .filter(|repr| repr.get(key).is_some())
            .map(Repr::len);
        match present_len {
            None => self,
            Some(1) => Self::empty(),
            Some(_) => {
                if let Some(repr) = self.repr.as_mut() {
                    Arc::make_mut(repr).remove_present(key);
                }
                self
            }
        }
    }

    /// Structural duplicate sharing no storage with `self`.
    pub fn copy_of(&self) -> Self {
        match self.repr.as_deref() {
            None => Self::empty(),
            Some(repr) => Self::from_repr(repr.deep_copy()),
        }
    }

    /// Whether both handles point at the same storage (or are both empty).
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        match (&a.repr, &b.repr) {
            (None, None) => true,
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    fn from_repr(repr: Repr) -> Self {
        Self {
            repr: Some(Arc::new(repr)),
        }
    }
}

impl Repr {
    fn len(&self) -> usize {
        match self {
            Repr::Inline { keys, .. } => keys.len(),
            Repr::Map(map) => map.len(),
        }
    }

    fn get(&self, key: &str) -> Option<&PropValue> {
        match self {
            Repr::Inline { keys, values, .. } => keys
                .iter()
                .position(|k| &**k == key)
                .map(|pos| &values[pos]),
            Repr::Map(map) => map.get(key),
        }
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut PropValue> {
        match self {
            Repr::Inline { keys, values, .. } => {
                let pos = keys.iter().position(|k| &**k == key)?;
                values.get_mut(pos)
            }
            Repr::Map(map) => map.get_mut(key),
        }
    }

    fn insert_absent(&mut self, key: &str, value: PropValue) {
        let has_room = match self {
            Repr::Inline { capacity, keys, .. } => keys.len() < *capacity,
            Repr::Map(_) => true,
        };
        if !has_room {
            let mut entries = self.take_entries();
            entries.push((Arc::from(key), value));
            *self = Repr::canonical(entries);
            return;
        }
        match self {
            Repr::Inline { keys, values, .. } => {
                keys.push(Arc::from(key));
                values.push(value);
            }
            Repr::Map(map) => {
                map.insert(Arc::from(key), value);
            }
        }
    }

    fn remove_present(&mut self, key: &str) {
        let target = DictTier::for_len(self.len() - 1);
        let current = match self {
            Repr::Inline {
                capacity,
                keys,
                values,
            } => {
                if let Some(pos) = keys.iter().position(|k| &**k == key) {
                    keys.swap_remove(pos);
                    values.swap_remove(pos);
                }
                DictTier::Inline(*capacity)
            }
            Repr::Map(map) => {
                map.remove(key);
                DictTier::Map
            }
        };
        if target != current {
            let entries = self.take_entries();
            *self = Repr::canonical(entries);
        }
    }

    fn take_entries(&mut self) -> Vec<(Arc<str>, PropValue)> {
        let taken = std::mem::replace(self, Repr::Map(FxHashMap::default()));
        match taken {
            Repr::Inline { keys, values, .. } => keys.into_iter().zip(values).collect(),
            Repr::Map(map) => map.into_iter().collect(),
        }
    }

    /// Storage for `entries` (distinct keys, at least one) in the tier its length selects.
    fn canonical(entries: Vec<(Arc<str>, PropValue)>) -> Repr {
        match DictTier::for_len(entries.len()) {
            DictTier::Inline(capacity) => {
                let mut keys = Vec::with_capacity(capacity);
                let mut values = Vec::with_capacity(capacity);
                for (key, value) in entries {
                    keys.push(key);
                    values.push(value);
                }
                Repr::Inline {
                    capacity,
                    keys,
                    values,
                }
            }
            DictTier::Map | DictTier::Empty => Repr::Map(entries.into_iter().collect()),
        }
    }

    fn deep_copy(&self) -> Repr {
        match self {
            Repr::Inline {
                capacity,
                keys,
                values,
            } => {
                let mut new_keys = Vec::with_capacity(*capacity);
                new_keys.extend(keys.iter().map(|k| Arc::<str>::from(&**k)));
                let mut new_values = Vec::with_capacity(*capacity);
                new_values.extend(values.iter().cloned());
                Repr::Inline {
                    capacity: *capacity,
                    keys: new_keys,
                    values: new_values,
                }
            }
            Repr::Map(map) => Repr::Map(
                map.iter()
                    .map(|(k, v)| (Arc::<str>::from(&**k), v.clone()))
                    .collect(),
            ),
        }
    }
}

/// Iterator over the entries of a [`Dictionary`].
pub enum Iter<'a> {
    /// Empty dictionary.
    Empty,
    /// Inline slot pairs.
    Inline(std::iter::Zip<std::slice::Iter<'a, Arc<str>>, std::slice::Iter<'a, PropValue>>),
    /// Hash map tier.
    Map(std::collections::hash_map::Iter<'a, Arc<str>, PropValue>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a PropValue);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Empty => None,
            Iter::Inline(inner) => inner.next().map(|(k, v)| (&**k, v)),
            Iter::Map(inner) => inner.next().map(|(k, v)| (&**k, v)),
        }
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.property(key) == Some(value))
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Dictionary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = HashMap::<String, PropValue>::deserialize(deserializer)?;
        Ok(Dictionary::from_map(map))
    }
}
