//! Full-scan fallback for lookups on keys without an index.
//!
//! Values are compared through their [`IndexValue`] projection and
//! soft-deleted elements are skipped, matching what an [`super::Index`]
//! holds: null never matches and `-0.0` matches `0.0`.

use super::registry::IndexRegistry;
use crate::model::Element;
use crate::types::{IndexValue, PropValue};

/// Detached copies of the live elements whose `key` property equals `value`.
pub fn scan_by_property<'a, T, I>(elements: I, key: &str, value: &PropValue) -> Vec<T>
where
    T: Element,
    I: IntoIterator<Item = &'a T>,
{
    let Some(target) = IndexValue::from_prop(value) else {
        return Vec::new();
    };
    elements
        .into_iter()
        .filter(|element| !element.is_removed() && holds(*element, key, &target))
        .map(|element| element.detached())
        .collect()
}

/// Answers `key == value` from the registry when `key` is indexed, otherwise
/// by scanning `elements`.
///
pub fn lookup_or_scan<'a, T, I>(
    registry: &IndexRegistry<T>,
    elements: I,
    key: &str,
    value: &PropValue,
) -> Vec<T>
where
    T: Element,
    I: IntoIterator<Item = &'a T>,
{
    if let Ok(found) = registry.get(key, value) {
        return found;
    }
    let mut scanned = 0usize;
    let found = scan_by_property(
        elements.into_iter().inspect(|_| scanned += 1),
        key,
        value,
    );
    registry.metrics().scan_fallback(scanned);
    found
}

fn holds<T: Element>(element: &T, key: &str, target: &IndexValue) -> bool {
    element
        .property(key)
        .and_then(IndexValue::from_prop)
        .is_some_and(|value| value == *target)
}
