use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};
use parking_lot::Mutex;

use crate::datastore::{DatastoreProvider, Entity};
use crate::error::ReferenceError;
use crate::reference::{Reference, ReferenceState};
use crate::{EntityType, Key};

/// Deferred reference to a string-keyed map of entities.
///
/// Holds a string-key-to-[`Key`] manifest and resolves each entry
/// individually on first access. Insertion order is preserved throughout
/// (manifest and materialized map) for reproducibility; nothing semantic
/// depends on it.
///
/// Unlike [`ListReference`](crate::ListReference), a map entry whose key
/// resolves to nothing is kept and materializes as a `None` value, with no
/// existence check and regardless of `ignore_missing`. The asymmetry
/// mirrors the long-standing behavior of the mapping layer this crate
/// serves; callers that care must check for `None` values themselves.
pub struct MapReference {
    referent: EntityType,
    ignore_missing: bool,
    provider: Arc<dyn DatastoreProvider>,
    inner: Mutex<Inner>,
}

struct Inner {
    manifest: IndexMap<String, Key>,
    state: ReferenceState<IndexMap<String, Option<Entity>>>,
}

impl MapReference {
    /// Creates an unfetched reference over the given key manifest.
    pub fn new(
        referent: EntityType,
        manifest: IndexMap<String, Key>,
        ignore_missing: bool,
        provider: Arc<dyn DatastoreProvider>,
    ) -> Self {
        MapReference {
            referent,
            ignore_missing,
            provider,
            inner: Mutex::new(Inner {
                manifest,
                state: ReferenceState::Unfetched,
            }),
        }
    }

    /// Returns a copy of the current key manifest. Never fetches.
    pub fn keys(&self) -> IndexMap<String, Key> {
        self.inner.lock().manifest.clone()
    }

    /// Returns a snapshot of the materialized map, fetching on first
    /// access. Entries whose key resolved to nothing carry `None`.
    pub fn get(&self) -> Result<IndexMap<String, Option<Entity>>, ReferenceError> {
        let mut inner = self.inner.lock();
        Ok(self.fetch_locked(&mut inner)?.clone())
    }

    /// Number of materialized entries; fetches on first access.
    pub fn len(&self) -> Result<usize, ReferenceError> {
        let mut inner = self.inner.lock();
        Ok(self.fetch_locked(&mut inner)?.len())
    }

    /// Whether the materialized map is empty; fetches on first access.
    pub fn is_empty(&self) -> Result<bool, ReferenceError> {
        Ok(self.len()? == 0)
    }

    /// Runs `f` over the live backing map, fetching on first access.
    ///
    /// The mutation window for the pre-persistence round-trip: insert or
    /// remove entries here, then [`freeze`](Reference::freeze) to fold the
    /// change back into the key manifest.
    pub fn with_mut<R>(
        &self,
        f: impl FnOnce(&mut IndexMap<String, Option<Entity>>) -> R,
    ) -> Result<R, ReferenceError> {
        let mut inner = self.inner.lock();
        Ok(f(self.fetch_locked(&mut inner)?))
    }

    fn fetch_locked<'a>(
        &self,
        inner: &'a mut Inner,
    ) -> Result<&'a mut IndexMap<String, Option<Entity>>, ReferenceError> {
        if !inner.state.is_fetched() {
            debug!(
                "materializing map of {} ({} entries)",
                self.referent,
                inner.manifest.len()
            );
            let handle = self.provider.get();
            let mut values = IndexMap::with_capacity(inner.manifest.len());
            for (name, key) in &inner.manifest {
                let value = handle.by_key(&self.referent, key)?;
                if value.is_none() {
                    trace!("map referent {} ('{}') not present in storage", key, name);
                }
                values.insert(name.clone(), value);
            }
            inner.state = ReferenceState::Fetched(values);
        }
        match &mut inner.state {
            ReferenceState::Fetched(values) => Ok(values),
            // Set just above.
            ReferenceState::Unfetched => unreachable!(),
        }
    }
}

impl Reference for MapReference {
    fn referent_type(&self) -> &EntityType {
        &self.referent
    }

    fn ignore_missing(&self) -> bool {
        self.ignore_missing
    }

    fn is_materialized(&self) -> bool {
        self.inner.lock().state.is_fetched()
    }

    fn force(&self) -> Result<Option<Entity>, ReferenceError> {
        let values = self.get()?;
        Ok(Some(Arc::new(values) as Entity))
    }

    fn freeze(&self) -> Result<(), ReferenceError> {
        let mut inner = self.inner.lock();
        if !inner.state.is_fetched() {
            return Ok(());
        }

        let handle = self.provider.get();
        let mut manifest = IndexMap::new();
        if let Some(values) = inner.state.fetched() {
            for (name, value) in values {
                // A `None` value has no key to derive; the entry drops out
                // of the manifest.
                if let Some(entity) = value {
                    manifest.insert(name.clone(), handle.key_of(entity)?);
                }
            }
        }
        trace!(
            "freezing map of {} ({} entries)",
            self.referent,
            manifest.len()
        );
        inner.manifest = manifest;
        inner.state = ReferenceState::Unfetched;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for MapReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MapReference")
            .field("referent", &self.referent)
            .field("manifest", &inner.manifest.len())
            .field("materialized", &inner.state.is_fetched())
            .finish()
    }
}
