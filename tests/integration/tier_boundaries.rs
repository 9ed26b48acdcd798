use std::sync::Arc;

use sombra_compact::{CompactSet, Tier};

fn expected_tier(len: usize) -> Tier {
    match len {
        1 => Tier::Single,
        2 => Tier::Fixed(2),
        3 => Tier::Fixed(3),
        4 => Tier::Fixed(4),
        5 | 6 => Tier::Fixed(6),
        7 | 8 => Tier::Fixed(8),
        9..=12 => Tier::Fixed(12),
        13..=24 => Tier::Fixed(24),
        _ => Tier::Overflow,
    }
}

#[test]
fn promotion_sequence_is_exact() {
    let mut set: Option<Arc<CompactSet<u64>>> = None;
    let mut observed = Vec::new();
    for value in 1..=25u64 {
        let next = CompactSet::add(set, value);
        observed.push(next.tier());
        set = Some(next);
    }
    let expected: Vec<Tier> = (1..=25).map(expected_tier).collect();
    assert_eq!(observed, expected);
    assert_eq!(observed[24].to_string(), "overflow");
}

#[test]
fn demotion_mirrors_promotion() {
    let mut set = CompactSet::from_values(1..=40u64).map(Arc::new);
    for value in (1..=40u64).rev() {
        set = CompactSet::remove(set, &value);
        let remaining = (value - 1) as usize;
        match &set {
            None => assert_eq!(remaining, 0),
            Some(set) => {
                assert_eq!(set.len(), remaining);
                assert_eq!(set.tier(), expected_tier(remaining), "at {remaining} elements");
            }
        }
    }
}

#[test]
fn boundaries_hold_for_any_removal_order() {
    let values: Vec<u64> = (0..30).map(|v| v * 7919).collect();
    let mut set = CompactSet::from_values(values.iter().copied()).map(Arc::new);
    // Remove from the middle outwards.
    let mut order: Vec<u64> = values.clone();
    order.sort_by_key(|v| (*v as i64 - 15 * 7919).abs());
    for (removed, value) in order.iter().enumerate() {
        set = CompactSet::remove(set, value);
        let remaining = values.len() - removed - 1;
        if let Some(set) = &set {
            assert_eq!(set.tier(), expected_tier(remaining));
            assert_eq!(set.elements().iter().count(), remaining);
        }
    }
    assert!(set.is_none());
}

#[test]
fn overflow_tombstones_are_skipped_by_readers() {
    let mut set = CompactSet::from_values(0..200u64).map(Arc::new);
    for value in (0..200u64).filter(|v| v % 3 != 0) {
        set = CompactSet::remove(set, &value);
    }
    let set = set.expect("non-empty");
    assert_eq!(set.tier(), Tier::Overflow);
    let view = set.elements();
    assert!(view.slot_count() >= set.len());
    let mut live: Vec<u64> = view.iter().copied().collect();
    live.sort_unstable();
    assert_eq!(live, (0..200u64).filter(|v| v % 3 == 0).collect::<Vec<_>>());
}
