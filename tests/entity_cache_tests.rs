mod common;

use std::sync::Arc;

use common::{key, stub, Doc};
use perezoso::{Entity, EntityCache, ReferenceFactory, StatsSnapshot};

#[test]
fn test_unknown_key_counts_exactly_one_miss() {
    common::init_logging();
    let cache = EntityCache::new();

    assert_eq!(cache.exists(&key("user", 1)), None);
    assert_eq!(
        cache.stats(),
        StatsSnapshot {
            entities: 0,
            hits: 0,
            misses: 1,
        }
    );
}

#[test]
fn test_put_entity_makes_exists_and_get_entity_hits() {
    let mut cache = EntityCache::new();
    let user: Entity = Arc::new(String::from("ada"));
    cache.put_entity(key("user", 1), &user);

    assert_eq!(cache.exists(&key("user", 1)), Some(true));
    let cached = cache.entity(&key("user", 1)).unwrap().unwrap();
    assert!(Arc::ptr_eq(&cached, &user));

    let stats = cache.stats();
    assert_eq!(stats.entities, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 0);
}

#[test]
fn test_live_entity_wins_over_negative_existence_record() {
    let mut cache = EntityCache::new();
    // Mapping code may have recorded "does not exist" before an insert
    // materialized the entity in this unit of work.
    cache.notify_exists(key("user", 1), false);

    let user: Entity = Arc::new(String::from("ada"));
    cache.put_entity(key("user", 1), &user);

    // The live identity-map entry answers before the existence map does.
    assert_eq!(cache.exists(&key("user", 1)), Some(true));
}

#[test]
fn test_reclaimed_entity_still_reported_existing() {
    let mut cache = EntityCache::new();
    let user: Entity = Arc::new(String::from("ada"));
    cache.put_entity(key("user", 1), &user);
    drop(user);

    assert_eq!(cache.exists(&key("user", 1)), Some(true));
    assert!(cache.entity(&key("user", 1)).unwrap().is_none());
    assert_eq!(cache.cached_entities(), 0);
    assert_eq!(cache.known_keys(), 1);
}

#[test]
fn test_entity_lookup_falls_back_to_registered_proxy() {
    let (provider, store) = stub();
    store.put_doc(key("user", 1), "ada");

    let factory = ReferenceFactory::new(provider);
    let mut cache = EntityCache::new();
    let proxy = factory.scalar_cached(&mut cache, "user".into(), key("user", 1), false);

    // Nothing in the identity map; the registry's proxy materializes on
    // demand.
    let entity = cache.entity(&key("user", 1)).unwrap().unwrap();
    assert_eq!(common::name_of(&entity), "ada");
    assert!(perezoso::Reference::is_materialized(proxy.as_ref()));
    assert_eq!(store.by_key_calls(), 1);
}

#[test]
fn test_flush_behaves_like_a_fresh_cache() {
    let mut cache = EntityCache::new();
    let user: Entity = Arc::new(String::from("ada"));
    cache.put_entity(key("user", 1), &user);
    cache.exists(&key("user", 1));
    cache.exists(&key("user", 2));

    cache.flush();

    assert_eq!(cache.stats(), StatsSnapshot::default());
    assert_eq!(cache.exists(&key("user", 1)), None);
    assert!(cache.entity(&key("user", 1)).unwrap().is_none());
    assert_eq!(cache.cached_entities(), 0);
    assert_eq!(cache.known_keys(), 0);
}

#[test]
fn test_snapshot_is_immutable_copy() {
    let cache = EntityCache::new();
    cache.exists(&key("user", 1));

    let snapshot = cache.stats();
    cache.exists(&key("user", 2));

    assert_eq!(snapshot.misses, 1);
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn test_distinct_entity_types_do_not_collide() {
    let mut cache = EntityCache::new();
    let user: Entity = Arc::new(String::from("ada"));
    cache.put_entity(key("user", 1), &user);

    assert_eq!(cache.exists(&key("order", 1)), None);
    assert!(cache.entity(&key("order", 1)).unwrap().is_none());
}

#[test]
fn test_put_entity_twice_observes_latest() {
    let mut cache = EntityCache::new();
    let stale = Doc::entity(key("user", 1), "stale");
    let fresh = Doc::entity(key("user", 1), "fresh");

    cache.put_entity(key("user", 1), &stale);
    cache.put_entity(key("user", 1), &fresh);

    let cached = cache.entity(&key("user", 1)).unwrap().unwrap();
    assert_eq!(common::name_of(&cached), "fresh");
}
