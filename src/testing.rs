//! Call-counting datastore stubs shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::datastore::{DatastoreHandle, DatastoreProvider, Entity, ResolutionError};
use crate::{EntityType, Key};

/// Minimal persistent document used as the entity payload in tests.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Doc {
    pub key: Key,
    pub name: String,
}

impl Doc {
    pub fn entity(key: Key, name: &str) -> Entity {
        Arc::new(Doc {
            key,
            name: name.to_owned(),
        })
    }
}

/// In-memory datastore with atomic call counters and a one-shot failure
/// switch.
#[derive(Default)]
pub(crate) struct StubDatastore {
    docs: Mutex<HashMap<Key, Entity>>,
    by_key_calls: AtomicUsize,
    key_of_calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl StubDatastore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, key: Key, entity: Entity) {
        self.docs.lock().insert(key, entity);
    }

    pub fn put_doc(&self, key: Key, name: &str) -> Entity {
        let entity = Doc::entity(key.clone(), name);
        self.put(key, entity.clone());
        entity
    }

    pub fn remove(&self, key: &Key) {
        self.docs.lock().remove(key);
    }

    pub fn by_key_calls(&self) -> usize {
        self.by_key_calls.load(Ordering::SeqCst)
    }

    pub fn key_of_calls(&self) -> usize {
        self.key_of_calls.load(Ordering::SeqCst)
    }

    /// Makes the next `by_key` call fail with a resolution error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl DatastoreHandle for StubDatastore {
    fn by_key(
        &self,
        _entity_type: &EntityType,
        key: &Key,
    ) -> Result<Option<Entity>, ResolutionError> {
        self.by_key_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ResolutionError::new("stubbed failure"));
        }
        Ok(self.docs.lock().get(key).cloned())
    }

    fn key_of(&self, entity: &Entity) -> Result<Key, ResolutionError> {
        self.key_of_calls.fetch_add(1, Ordering::SeqCst);
        entity
            .downcast_ref::<Doc>()
            .map(|doc| doc.key.clone())
            .ok_or_else(|| ResolutionError::new("entity is not a mapped document"))
    }
}

/// Provider handing out the same stub handle every time.
pub(crate) struct StubProvider(pub Arc<StubDatastore>);

impl DatastoreProvider for StubProvider {
    fn get(&self) -> Arc<dyn DatastoreHandle> {
        self.0.clone()
    }
}

/// Shorthand for a provider/datastore pair.
pub(crate) fn stub() -> (Arc<dyn DatastoreProvider>, Arc<StubDatastore>) {
    let store = StubDatastore::new();
    (Arc::new(StubProvider(store.clone())), store)
}
