use sombra_compact::options::MultisetOptions;
use sombra_compact::ClassifierMultiset;

const N: u64 = 10_000;

fn bucket_sizes(multiset: &ClassifierMultiset<u64, u64>, buckets: u64) -> Vec<usize> {
    (0..buckets)
        .map(|key| multiset.super_set_with_classifier(&key).iter().count())
        .collect()
}

#[test]
fn factor_sweep_keeps_bucket_sizes() {
    for factor in [10u64, 100, 1000] {
        let buckets = N / factor;
        let classifier = move |value: &u64| value % buckets;
        let mut multiset = ClassifierMultiset::new();
        for id in 0..N {
            assert!(multiset.add(id, classifier));
        }
        assert_eq!(multiset.occupied_cells() as u64, buckets);
        assert!(bucket_sizes(&multiset, buckets)
            .iter()
            .all(|&size| size as u64 == factor));

        for id in 0..N / 2 {
            assert!(multiset.remove(&id, classifier));
            assert!(multiset.occupied_cells() > 0);
        }
        assert!(bucket_sizes(&multiset, buckets)
            .iter()
            .all(|&size| size as u64 == factor / 2));

        for id in N / 2..N {
            assert!(multiset.occupied_cells() > 0, "factor {factor}, id {id}");
            multiset.remove(&id, classifier);
        }
        assert_eq!(multiset.occupied_cells(), 0);
        assert!(multiset.is_empty());
    }
}

#[test]
fn members_are_exactly_the_classified_ids() {
    let classifier = |value: &u64| value % 10;
    let mut multiset = ClassifierMultiset::new();
    for id in 0..1_000u64 {
        multiset.add(id, classifier);
    }
    let mut sevens: Vec<u64> = multiset.super_set_with_classifier(&7).to_vec();
    sevens.sort_unstable();
    assert_eq!(sevens, (0..1_000u64).filter(|v| v % 10 == 7).collect::<Vec<_>>());
    assert!(multiset.super_set_with_classifier(&10).is_empty());
}

#[test]
fn custom_watermarks_are_honoured() {
    let options = MultisetOptions::default()
        .initial_capacity(4)
        .grow_load(0.5)
        .shrink_load(0.1);
    let mut multiset = ClassifierMultiset::with_options(options).expect("valid options");
    let identity = |value: &u32| *value;
    for value in 0..100u32 {
        multiset.add(value, identity);
        assert!(multiset.occupied_cells() as f64 <= 0.5 * multiset.capacity() as f64);
    }
    for value in 0..100u32 {
        multiset.remove(&value, identity);
    }
    assert_eq!(multiset.capacity(), 4);
}
