use sombra_compact::{Edge, ElementKind, IndexError, IndexRegistry, PropValue, Vertex};

fn cities() -> Vec<Vertex> {
    ["oslo", "rome", "oslo", "lima"]
        .iter()
        .enumerate()
        .map(|(id, city)| {
            Vertex::new(id as u64, "person")
                .with_property("city", *city)
                .with_property("id", id as i64)
        })
        .collect()
}

#[test]
fn missing_index_names_key_and_known_keys() {
    let registry = IndexRegistry::<Vertex>::new();
    match registry.get("city", &"oslo".into()) {
        Err(IndexError::MissingIndex { key, known }) => {
            assert_eq!(key, "city");
            assert!(known.is_empty());
        }
        other => panic!("expected MissingIndex, got {other:?}"),
    }

    let mut writer = registry.write();
    writer.create_index("id", &cities()).expect("create");
    writer.create_index("city", &cities()).expect("create");
    drop(writer);

    let err = registry.get("name", &"x".into()).expect_err("unindexed");
    assert_eq!(
        err.to_string(),
        "no index defined for key `name` (indexed keys: city, id)"
    );
}

#[test]
fn duplicate_registration_is_rejected() {
    let registry = IndexRegistry::<Vertex>::new();
    let mut writer = registry.write();
    writer.create_index("city", &cities()).expect("create");
    let extra = [Vertex::new(99, "person").with_property("city", "oslo")];
    match writer.create_index("city", &extra) {
        Err(IndexError::IndexAlreadyExists { key }) => assert_eq!(key, "city"),
        other => panic!("expected IndexAlreadyExists, got {other:?}"),
    }
    drop(writer);
    assert_eq!(registry.get("city", &"oslo".into()).expect("get").len(), 2);
}

#[test]
fn indexed_keys_is_a_copy() {
    let registry = IndexRegistry::<Vertex>::new();
    registry.write().create_index("city", &cities()).expect("create");
    let keys = registry.indexed_keys();
    registry.write().drop_index("city");
    assert!(keys.contains("city"));
    assert!(registry.indexed_keys().is_empty());
    assert!(!registry.has_index("city"));
}

#[test]
fn drop_then_recreate() {
    let registry = IndexRegistry::<Vertex>::new();
    let mut writer = registry.write();
    writer.create_index("city", &cities()).expect("create");
    assert!(writer.drop_index("city"));
    writer.create_index("city", &cities()[..1]).expect("recreate");
    drop(writer);
    assert_eq!(registry.get("city", &"oslo".into()).expect("get").len(), 1);
}

#[test]
fn elements_without_indexed_keys_are_ignored() {
    let registry = IndexRegistry::<Edge>::new();
    assert_eq!(registry.kind(), ElementKind::Edge);
    let writer = {
        let mut writer = registry.write();
        writer.create_index("weight", std::iter::empty()).expect("create");
        writer
    };
    let plain = Edge::new(1, "knows", 1, 2);
    writer.add(&plain).expect("add");
    writer.remove(&plain).expect("remove");
    let heavy = Edge::new(2, "knows", 1, 3).with_property("weight", 5);
    writer.add(&heavy).expect("add");
    drop(writer);
    assert_eq!(registry.get("weight", &PropValue::Int(5)).expect("get").len(), 1);
    assert!(registry.get("weight", &PropValue::Null).expect("get").is_empty());
}
