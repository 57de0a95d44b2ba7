mod common;

use common::{key, name_of, stub, Doc};
use indexmap::IndexMap;
use perezoso::{Key, Reference, ReferenceFactory};

fn manifest() -> IndexMap<String, Key> {
    IndexMap::from([
        ("a".to_owned(), key("tag", 1)),
        ("b".to_owned(), key("tag", 2)),
    ])
}

#[test]
fn test_missing_value_is_inserted_as_none() {
    common::init_logging();
    let (provider, store) = stub();
    store.put_doc(key("tag", 1), "alpha");
    // tag 2 intentionally absent.

    let factory = ReferenceFactory::new(provider);

    // The behavior is the same under both missing-tolerance settings.
    for ignore_missing in [false, true] {
        let tags = factory.map("tag".into(), manifest(), ignore_missing);
        let values = tags.get().unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(name_of(values["a"].as_ref().unwrap()), "alpha");
        assert!(values["b"].is_none());
    }
}

#[test]
fn test_fetch_preserves_insertion_order_and_runs_once() {
    let (provider, store) = stub();
    store.put_doc(key("tag", 1), "alpha");
    store.put_doc(key("tag", 2), "beta");

    let factory = ReferenceFactory::new(provider);
    let tags = factory.map("tag".into(), manifest(), false);

    let values = tags.get().unwrap();
    assert_eq!(values.keys().cloned().collect::<Vec<_>>(), ["a", "b"]);

    tags.get().unwrap();
    assert_eq!(tags.len().unwrap(), 2);
    assert_eq!(store.by_key_calls(), 2);
}

#[test]
fn test_round_trip_mutation_freeze_refetch() {
    let (provider, store) = stub();
    store.put_doc(key("tag", 1), "alpha");
    store.put_doc(key("tag", 2), "beta");

    let factory = ReferenceFactory::new(provider);
    let tags = factory.map("tag".into(), manifest(), false);
    tags.get().unwrap();

    let added = Doc::entity(key("tag", 3), "gamma");
    tags.with_mut(|values| values.insert("c".to_owned(), Some(added)))
        .unwrap();
    tags.freeze().unwrap();

    let keys = tags.keys();
    assert!(!tags.is_materialized());
    assert_eq!(keys.len(), 3);
    assert_eq!(keys["c"], key("tag", 3));

    store.put_doc(key("tag", 3), "gamma");
    let values = tags.get().unwrap();
    assert_eq!(name_of(values["c"].as_ref().unwrap()), "gamma");
}

#[test]
fn test_freeze_drops_entries_without_a_live_value() {
    let (provider, store) = stub();
    store.put_doc(key("tag", 1), "alpha");
    // "b" will materialize as None.

    let factory = ReferenceFactory::new(provider);
    let tags = factory.map("tag".into(), manifest(), false);
    tags.get().unwrap();
    tags.freeze().unwrap();

    let keys = tags.keys();
    assert_eq!(keys.len(), 1);
    assert!(keys.contains_key("a"));
    assert!(!keys.contains_key("b"));
}

#[test]
fn test_refetch_after_freeze_sees_current_storage() {
    let (provider, store) = stub();
    store.put_doc(key("tag", 1), "alpha");
    store.put_doc(key("tag", 2), "beta");

    let factory = ReferenceFactory::new(provider);
    let tags = factory.map("tag".into(), manifest(), false);
    tags.get().unwrap();
    tags.freeze().unwrap();

    // Storage changed between freeze and refetch.
    store.remove(&key("tag", 2));
    let values = tags.get().unwrap();
    assert!(values["a"].is_some());
    assert!(values["b"].is_none());
}

#[test]
fn test_empty_manifest_materializes_empty() {
    let (provider, store) = stub();
    let factory = ReferenceFactory::new(provider);
    let tags = factory.map("tag".into(), IndexMap::new(), false);

    assert!(tags.is_empty().unwrap());
    assert_eq!(store.by_key_calls(), 0);
}
