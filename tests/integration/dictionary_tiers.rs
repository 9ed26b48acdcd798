use std::collections::HashMap;

use sombra_compact::{DictTier, Dictionary, PropValue};

#[test]
fn promotes_one_key_at_a_time() {
    let mut dict = Dictionary::empty().set_property("a", 1);
    assert_eq!(dict.tier(), DictTier::Inline(1));
    for (key, tier) in [("b", 2), ("c", 3), ("d", 4)] {
        dict = dict.set_property(key, 1);
        assert_eq!(dict.tier(), DictTier::Inline(tier));
    }
    dict = dict.remove_property("b");
    assert_eq!(dict.tier(), DictTier::Inline(3));
    assert_eq!(dict.len(), 3);
    assert!(!dict.contains_key("b"));
}

#[test]
fn literal_sequence_reaches_fixed_state() {
    let dict = Dictionary::empty()
        .set_property("foo", "bar")
        .set_property("foo1", "bar1")
        .remove_property("foo")
        .set_property("foo2", "bar2");
    assert_eq!(dict.tier(), DictTier::Inline(2));
    let expected: HashMap<String, PropValue> = [
        ("foo1".to_owned(), PropValue::from("bar1")),
        ("foo2".to_owned(), PropValue::from("bar2")),
    ]
    .into_iter()
    .collect();
    assert_eq!(dict.to_map(), expected);
}

#[test]
fn removing_unknown_key_returns_same_instance() {
    let dict = Dictionary::empty().set_property("name", "alice");
    let same = dict.clone().remove_property("never-set");
    assert!(Dictionary::ptr_eq(&dict, &same));

    let empty = Dictionary::empty();
    assert!(Dictionary::ptr_eq(&empty, &empty.clone().remove_property("x")));
}

#[test]
fn grows_into_map_and_back() {
    let mut dict = Dictionary::empty();
    for i in 0..10 {
        dict = dict.set_property(&format!("k{i}"), i);
    }
    assert_eq!(dict.tier(), DictTier::Map);
    for i in (0..10).rev() {
        dict = dict.remove_property(&format!("k{i}"));
        assert_eq!(dict.tier(), DictTier::for_len(i as usize));
    }
    assert!(dict.is_empty());
    assert_eq!(dict.tier(), DictTier::Empty);
}

#[test]
fn map_round_trip_preserves_content() {
    let source: HashMap<String, PropValue> = (0..8)
        .map(|i| (format!("key{i}"), PropValue::Int(i)))
        .collect();
    let dict = Dictionary::from_map(source.clone());
    assert_eq!(dict.to_map(), source);
    let rebuilt = Dictionary::from_map(dict.to_map());
    assert_eq!(rebuilt, dict);
}

#[test]
fn overwriting_keeps_size_and_tier() {
    let dict = Dictionary::empty().set_property("a", 1).set_property("b", 2);
    let updated = dict.clone().set_property("a", 3);
    assert_eq!(updated.tier(), DictTier::Inline(2));
    assert_eq!(updated.property("a"), Some(&PropValue::Int(3)));
    assert_eq!(dict.property("a"), Some(&PropValue::Int(1)));
}
