use std::any::Any;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::datastore::{DatastoreProvider, Entity};
use crate::error::ReferenceError;
use crate::reference::{Reference, ReferenceState};
use crate::{EntityType, Key};

/// Deferred reference to an ordered collection of entities.
///
/// Holds an explicit ordered key manifest and resolves each key
/// individually, in manifest order, on first access. Batch resolution is
/// deliberately not used: it would not preserve order.
///
/// Missing referents are handled according to `ignore_missing`:
///
/// - `false` (strict): a resolved count shorter than the manifest fails
///   with [`ReferenceError::MissingReferents`], and the reference stays
///   unfetched.
/// - `true`: missing entities are skipped; the result keeps manifest order
///   and may be shorter than the manifest.
///
/// [`get`](Self::get) returns a snapshot of the materialized collection
/// (cloning `Arc`s, not entities). Content mutation before re-persistence
/// goes through [`with_mut`](Self::with_mut); `freeze` then re-derives the
/// manifest from whatever the collection holds, one key per element, in
/// iteration order.
pub struct ListReference {
    referent: EntityType,
    ignore_missing: bool,
    provider: Arc<dyn DatastoreProvider>,
    inner: Mutex<Inner>,
}

struct Inner {
    manifest: Vec<Key>,
    state: ReferenceState<Vec<Entity>>,
}

impl ListReference {
    /// Creates an unfetched reference over the given key manifest.
    pub fn new(
        referent: EntityType,
        manifest: Vec<Key>,
        ignore_missing: bool,
        provider: Arc<dyn DatastoreProvider>,
    ) -> Self {
        ListReference {
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
    pub fn keys(&self) -> Vec<Key> {
        self.inner.lock().manifest.clone()
    }

    /// Returns a snapshot of the materialized collection, fetching on first
    /// access.
    pub fn get(&self) -> Result<Vec<Entity>, ReferenceError> {
        let mut inner = self.inner.lock();
        Ok(self.fetch_locked(&mut inner)?.clone())
    }

    /// Number of materialized elements; fetches on first access.
    pub fn len(&self) -> Result<usize, ReferenceError> {
        let mut inner = self.inner.lock();
        Ok(self.fetch_locked(&mut inner)?.len())
    }

    /// Whether the materialized collection is empty; fetches on first
    /// access.
    pub fn is_empty(&self) -> Result<bool, ReferenceError> {
        Ok(self.len()? == 0)
    }

    /// Runs `f` over the live backing collection, fetching on first access.
    ///
    /// This is the mutation window for the pre-persistence round-trip: add
    /// or remove elements here, then [`freeze`](Reference::freeze) to fold
    /// the change back into the key manifest.
    pub fn with_mut<R>(
        &self,
        f: impl FnOnce(&mut Vec<Entity>) -> R,
    ) -> Result<R, ReferenceError> {
        let mut inner = self.inner.lock();
        Ok(f(self.fetch_locked(&mut inner)?))
    }

    fn fetch_locked<'a>(
        &self,
        inner: &'a mut Inner,
    ) -> Result<&'a mut Vec<Entity>, ReferenceError> {
        if !inner.state.is_fetched() {
            debug!(
                "materializing list of {} ({} keys)",
                self.referent,
                inner.manifest.len()
            );
            let handle = self.provider.get();
            let mut values = Vec::with_capacity(inner.manifest.len());
            for key in &inner.manifest {
                match handle.by_key(&self.referent, key)? {
                    Some(entity) => values.push(entity),
                    None => trace!("list referent {} not present in storage", key),
                }
            }
            if !self.ignore_missing && values.len() != inner.manifest.len() {
                return Err(ReferenceError::MissingReferents {
                    collection: "list",
                    referent: self.referent.clone(),
                    expected: inner.manifest.len(),
                    resolved: values.len(),
                });
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

impl Reference for ListReference {
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
        let mut manifest = Vec::new();
        if let Some(values) = inner.state.fetched() {
            manifest.reserve(values.len());
            for entity in values {
                manifest.push(handle.key_of(entity)?);
            }
        }
        trace!(
            "freezing list of {} ({} keys)",
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

impl std::fmt::Debug for ListReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ListReference")
            .field("referent", &self.referent)
            .field("manifest", &inner.manifest.len())
            .field("materialized", &inner.state.is_fetched())
            .finish()
    }
}
