use std::any::Any;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::datastore::{DatastoreProvider, Entity};
use crate::error::ReferenceError;
use crate::reference::{Reference, ReferenceState};
use crate::{EntityType, Key};

/// Deferred reference to a single entity.
///
/// Stands in for an entity that has not been loaded yet. The key is carried
/// from construction; the entity itself is resolved through the datastore
/// provider on the first [`get`](Self::get) and kept for every later read.
/// A referent missing from storage materializes as `None` rather than an
/// error, regardless of the `ignore_missing` flag; only the collection
/// shape enforces strict existence.
///
/// Instances are usually built by
/// [`ReferenceFactory`](crate::ReferenceFactory), which also registers them
/// in the unit of work's proxy registry so repeated lookups of the same key
/// reuse one instance.
///
/// # Examples
///
/// ```no_run
/// use perezoso::{EntityType, Key, Reference, ReferenceFactory};
/// # use std::sync::Arc;
/// # use perezoso::DatastoreProvider;
/// # fn provider() -> Arc<dyn DatastoreProvider> { unimplemented!() }
///
/// let factory = ReferenceFactory::new(provider());
/// let author = factory.scalar(
///     EntityType::from_static("author"),
///     Key::new("author".into(), 42),
///     false,
/// );
///
/// assert!(!author.is_materialized());
/// let entity = author.get()?; // first read fetches
/// let again = author.get()?; // second read does not
/// # Ok::<(), perezoso::ReferenceError>(())
/// ```
pub struct ScalarReference {
    referent: EntityType,
    ignore_missing: bool,
    provider: Arc<dyn DatastoreProvider>,
    inner: Mutex<Inner>,
}

struct Inner {
    key: Key,
    state: ReferenceState<Option<Entity>>,
}

impl ScalarReference {
    /// Creates an unfetched reference to the entity named by `key`.
    pub fn new(
        referent: EntityType,
        key: Key,
        ignore_missing: bool,
        provider: Arc<dyn DatastoreProvider>,
    ) -> Self {
        ScalarReference {
            referent,
            ignore_missing,
            provider,
            inner: Mutex::new(Inner {
                key,
                state: ReferenceState::Unfetched,
            }),
        }
    }

    /// Returns the key this reference currently points at.
    pub fn key(&self) -> Key {
        self.inner.lock().key.clone()
    }

    /// Returns the referenced entity, fetching it on first access.
    ///
    /// The fetch runs at most once per instance: the state transition is
    /// guarded by the instance's lock, so concurrent first accesses
    /// serialize and all observe the single fetched value. A fetch failure
    /// leaves the reference unfetched, so the caller may retry.
    pub fn get(&self) -> Result<Option<Entity>, ReferenceError> {
        let mut inner = self.inner.lock();
        if let Some(value) = inner.state.fetched() {
            return Ok(value.clone());
        }

        debug!("materializing reference to {}", inner.key);
        let value = self.provider.get().by_key(&self.referent, &inner.key)?;
        if value.is_none() {
            trace!("referent {} not present in storage", inner.key);
        }
        inner.state = ReferenceState::Fetched(value.clone());
        Ok(value)
    }
}

impl Reference for ScalarReference {
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
        self.get()
    }

    /// Re-derives the key from the live entity, then drops the payload.
    ///
    /// When the fetched value is `None` (referent was missing), the
    /// existing key is kept. A `key_of` failure leaves the reference
    /// fetched so the caller can retry the freeze.
    fn freeze(&self) -> Result<(), ReferenceError> {
        let mut inner = self.inner.lock();
        if !inner.state.is_fetched() {
            return Ok(());
        }

        if let Some(Some(entity)) = inner.state.fetched() {
            let key = self.provider.get().key_of(entity)?;
            inner.key = key;
        }
        trace!("freezing reference to {}", inner.key);
        inner.state = ReferenceState::Unfetched;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for ScalarReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ScalarReference")
            .field("referent", &self.referent)
            .field("key", &inner.key)
            .field("materialized", &inner.state.is_fetched())
            .finish()
    }
}
