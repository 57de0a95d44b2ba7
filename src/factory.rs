use std::sync::Arc;

use indexmap::IndexMap;

use crate::datastore::{DatastoreProvider, Entity};
use crate::entity_cache::EntityCache;
use crate::list_reference::ListReference;
use crate::map_reference::MapReference;
use crate::scalar_reference::ScalarReference;
use crate::{EntityType, Key};

/// Builds deferred references wired to a datastore provider.
///
/// Mapping code asks the factory for a reference instead of eagerly loading
/// a referenced entity, list, or map. The produced object is behaviorally a
/// stand-in for the real value (it materializes on first read) and is
/// recognizable as a deferred reference by the
/// [`introspect`](crate::introspect) helpers until then.
///
/// The provider is captured explicitly at construction; the factory holds
/// no process-wide state.
///
/// # Examples
///
/// ```no_run
/// use perezoso::{EntityType, Key, ReferenceFactory};
/// # use std::sync::Arc;
/// # use perezoso::DatastoreProvider;
/// # fn provider() -> Arc<dyn DatastoreProvider> { unimplemented!() }
///
/// let factory = ReferenceFactory::new(provider());
///
/// let comments = factory.list(
///     EntityType::from_static("comment"),
///     vec![
///         Key::new("comment".into(), 10),
///         Key::new("comment".into(), 11),
///     ],
///     false,
/// );
///
/// // Nothing fetched yet; the first read resolves both keys in order.
/// let loaded = comments.get()?;
/// assert_eq!(loaded.len(), 2);
/// # Ok::<(), perezoso::ReferenceError>(())
/// ```
pub struct ReferenceFactory {
    provider: Arc<dyn DatastoreProvider>,
}

impl ReferenceFactory {
    /// Creates a factory producing references that resolve through
    /// `provider`.
    pub fn new(provider: Arc<dyn DatastoreProvider>) -> Self {
        ReferenceFactory { provider }
    }

    /// Builds a deferred reference to a single entity.
    pub fn scalar(
        &self,
        referent: EntityType,
        key: Key,
        ignore_missing: bool,
    ) -> Arc<ScalarReference> {
        Arc::new(ScalarReference::new(
            referent,
            key,
            ignore_missing,
            self.provider.clone(),
        ))
    }

    /// Builds a scalar reference, reusing the instance already registered
    /// for `key` in the unit of work's proxy registry when one is still
    /// live. A newly built instance is registered before it is returned.
    pub fn scalar_cached(
        &self,
        cache: &mut EntityCache,
        referent: EntityType,
        key: Key,
        ignore_missing: bool,
    ) -> Arc<ScalarReference> {
        if let Some(existing) = cache.proxy(&key) {
            return existing;
        }
        let reference = self.scalar(referent, key.clone(), ignore_missing);
        cache.put_proxy(key, &reference);
        reference
    }

    /// Builds a deferred reference to an ordered collection of entities.
    pub fn list(
        &self,
        referent: EntityType,
        manifest: Vec<Key>,
        ignore_missing: bool,
    ) -> Arc<ListReference> {
        Arc::new(ListReference::new(
            referent,
            manifest,
            ignore_missing,
            self.provider.clone(),
        ))
    }

    /// Builds a deferred reference to a string-keyed map of entities.
    pub fn map(
        &self,
        referent: EntityType,
        manifest: IndexMap<String, Key>,
        ignore_missing: bool,
    ) -> Arc<MapReference> {
        Arc::new(MapReference::new(
            referent,
            manifest,
            ignore_missing,
            self.provider.clone(),
        ))
    }

    /// Like [`scalar`](Self::scalar), erased to [`Entity`] for installation
    /// in a field slot.
    pub fn erased_scalar(
        &self,
        referent: EntityType,
        key: Key,
        ignore_missing: bool,
    ) -> Entity {
        self.scalar(referent, key, ignore_missing)
    }

    /// Like [`list`](Self::list), erased to [`Entity`] for installation in
    /// a field slot.
    pub fn erased_list(
        &self,
        referent: EntityType,
        manifest: Vec<Key>,
        ignore_missing: bool,
    ) -> Entity {
        self.list(referent, manifest, ignore_missing)
    }

    /// Like [`map`](Self::map), erased to [`Entity`] for installation in a
    /// field slot.
    pub fn erased_map(
        &self,
        referent: EntityType,
        manifest: IndexMap<String, Key>,
        ignore_missing: bool,
    ) -> Entity {
        self.map(referent, manifest, ignore_missing)
    }
}
