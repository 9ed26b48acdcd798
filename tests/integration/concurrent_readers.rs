use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use arc_swap::ArcSwapOption;
use sombra_compact::{
    ClassifierMultiset, CompactSet, Element, IndexRegistry, PropValue, Published, Vertex,
};

const READERS: usize = 4;
const WRITERS: usize = 8;
const PER_WRITER: u64 = 500;

#[test]
fn readers_see_whole_sets_while_a_writer_churns() {
    let registry = Arc::new(IndexRegistry::<Vertex>::new());
    let base: Vec<Vertex> = (0..64u64)
        .map(|id| Vertex::new(id, "node").with_property("group", (id % 2) as i64))
        .collect();
    registry.write().create_index("group", &base).expect("create");

    let stop = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(READERS + 1));
    let mut handles = Vec::new();
    for _ in 0..READERS {
        let registry = Arc::clone(&registry);
        let stop = Arc::clone(&stop);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut reads = 0usize;
            loop {
                let done = stop.load(Ordering::Relaxed);
                let found = registry.get("group", &PropValue::Int(0)).expect("indexed");
                // Even ids never leave group 0.
                let evens = found.iter().filter(|v| v.id().0 < 64).count();
                assert_eq!(evens, 32);
                assert!(found.iter().all(|v| v.property("group") == Some(&PropValue::Int(0))));
                reads += 1;
                if done {
                    break reads;
                }
            }
        }));
    }

    barrier.wait();
    for round in 0..200u64 {
        let writer = registry.write();
        let extra: Vec<Vertex> = (0..50u64)
            .map(|i| Vertex::new(1_000 + round * 50 + i, "node").with_property("group", 0))
            .collect();
        for vertex in &extra {
            writer.add(vertex).expect("add");
        }
        for vertex in &extra {
            writer.remove(vertex).expect("remove");
        }
    }
    stop.store(true, Ordering::Relaxed);
    for handle in handles {
        assert!(handle.join().expect("reader thread") > 0);
    }
    assert_eq!(
        registry.get("group", &PropValue::Int(0)).expect("indexed").len(),
        32
    );
}

#[test]
fn add_safe_loses_no_updates() {
    let slot = Arc::new(ArcSwapOption::<CompactSet<u64>>::empty());
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS as u64)
        .map(|writer| {
            let slot = Arc::clone(&slot);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_WRITER {
                    CompactSet::add_safe(&slot, writer * PER_WRITER + i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }
    let set = slot.load_full().expect("non-empty");
    assert_eq!(set.len(), WRITERS * PER_WRITER as usize);
    for value in 0..WRITERS as u64 * PER_WRITER {
        assert!(set.contains(&value));
    }
}

#[test]
fn published_multiset_snapshots_are_stable() {
    let cell = Arc::new(Published::new(ClassifierMultiset::<u64, u64>::new()));
    let classifier = |value: &u64| value % 8;
    {
        let mut guard = cell.write();
        for value in 0..800u64 {
            guard.add(value, classifier);
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let cell = Arc::clone(&cell);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let snapshot = cell.load();
                    // Writers move values in pairs, so every snapshot is even.
                    assert_eq!(snapshot.len() % 2, 0);
                    let total: usize = (0..8u64)
                        .map(|key| snapshot.super_set_with_classifier(&key).iter().count())
                        .sum();
                    assert_eq!(total, snapshot.len());
                }
            })
        })
        .collect();

    for step in 0..400u64 {
        let mut guard = cell.write();
        if step % 2 == 0 {
            guard.add(10_000 + step, classifier);
            guard.add(20_000 + step, classifier);
        } else {
            guard.remove(&(10_000 + step - 1), classifier);
            guard.remove(&(20_000 + step - 1), classifier);
        }
    }
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().expect("reader thread");
    }
    assert_eq!(cell.load().len(), 800);
}
