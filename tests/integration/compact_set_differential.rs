use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sombra_compact::collections::size;
use sombra_compact::{CompactSet, Tier};

#[derive(Debug, Clone)]
enum Op {
    Add(u32),
    Remove(u32),
}

fn arb_op(keys: u32) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..keys).prop_map(Op::Add),
        2 => (0..keys).prop_map(Op::Remove),
    ]
}

fn check(set: &Option<Arc<CompactSet<u32>>>, reference: &HashSet<u32>) {
    assert_eq!(size(set.as_deref()), reference.len());
    match set {
        None => assert!(reference.is_empty()),
        Some(set) => {
            let view = set.elements();
            let observed: HashSet<u32> = view.iter().copied().collect();
            assert_eq!(view.iter().count(), reference.len(), "no duplicates");
            assert_eq!(&observed, reference);
            assert_eq!(Some(set.tier()), Tier::for_len(reference.len()));
            for key in reference {
                assert!(set.contains(key));
            }
        }
    }
}

fn apply(set: Option<Arc<CompactSet<u32>>>, op: &Op, reference: &mut HashSet<u32>) -> Option<Arc<CompactSet<u32>>> {
    match *op {
        Op::Add(key) => {
            reference.insert(key);
            Some(CompactSet::add(set, key))
        }
        Op::Remove(key) => {
            reference.remove(&key);
            CompactSet::remove(set, &key)
        }
    }
}

#[test]
fn seeded_random_ops_match_reference() {
    for keys in [17u32, 40, 300] {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED ^ keys as u64);
        let mut set = None;
        let mut reference = HashSet::new();
        for step in 0..10_000 {
            // Bias toward growth early so the overflow tier is reached.
            let op = if rng.gen_bool(if step < 2_000 { 0.7 } else { 0.5 }) {
                Op::Add(rng.gen_range(0..keys))
            } else {
                Op::Remove(rng.gen_range(0..keys))
            };
            set = apply(set, &op, &mut reference);
            check(&set, &reference);
        }
    }
}

#[test]
fn shared_snapshots_are_never_mutated() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut set = None;
    let mut reference = HashSet::new();
    for _ in 0..5_000 {
        let snapshot = set.clone();
        let expected = reference.clone();
        let op = if rng.gen_bool(0.55) {
            Op::Add(rng.gen_range(0..64))
        } else {
            Op::Remove(rng.gen_range(0..64))
        };
        set = apply(set, &op, &mut reference);
        check(&snapshot, &expected);
    }
}

#[test]
fn unchanged_sets_are_returned_as_is() {
    let set = CompactSet::add(None, 1u32);
    let set = CompactSet::add(Some(set), 2);
    let again = CompactSet::add(Some(Arc::clone(&set)), 2);
    assert!(Arc::ptr_eq(&set, &again));
    let kept = CompactSet::remove(Some(Arc::clone(&set)), &99).expect("non-empty");
    assert!(Arc::ptr_eq(&set, &kept));
}

proptest! {
    #[test]
    fn prop_any_sequence_matches_reference(ops in prop::collection::vec(arb_op(48), 1..400)) {
        let mut set = None;
        let mut reference = HashSet::new();
        for op in &ops {
            set = apply(set, op, &mut reference);
        }
        check(&set, &reference);
    }

    #[test]
    fn prop_insertion_order_does_not_matter(mut keys in prop::collection::hash_set(0u32..10_000, 0..80)) {
        let forward: Vec<u32> = keys.drain().collect();
        let mut backward = forward.clone();
        backward.reverse();
        let a = CompactSet::from_values(forward);
        let b = CompactSet::from_values(backward);
        prop_assert_eq!(a.as_ref().map(CompactSet::tier), b.as_ref().map(CompactSet::tier));
        prop_assert_eq!(a, b);
    }
}
