use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::{EntityType, Key};

/// A materialized domain object, as this crate sees it.
///
/// The mapping layer works with dynamically typed object graphs, so
/// entities travel through the cache and the reference subsystem erased to
/// `Arc<dyn Any + Send + Sync>`. The application's live graph owns the
/// entity through the `Arc`; the cache only ever observes it through a
/// [`Weak`](std::sync::Weak) (see [`CacheEntry`](crate::CacheEntry)).
pub type Entity = Arc<dyn Any + Send + Sync>;

/// Failure reported by the datastore while resolving a key or deriving one.
///
/// This crate never generates resolution failures itself and never retries
/// or suppresses them; they propagate unmodified to the caller of the
/// triggering operation, wrapped in
/// [`ReferenceError::Resolution`](crate::ReferenceError::Resolution).
#[derive(Debug)]
pub struct ResolutionError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ResolutionError {
    /// Creates a resolution failure with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        ResolutionError {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying driver error as the source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        ResolutionError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "datastore resolution failed: {}", self.message)
    }
}

impl Error for ResolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Narrow view of the datastore that deferred references resolve through.
///
/// The full query/mapping machinery lives outside this crate; references
/// only ever need these two operations. Implementations are expected to
/// consult the active unit of work's [`EntityCache`](crate::EntityCache)
/// before going to the wire, which is what makes repeated materialization
/// of the same logical entity cheap.
pub trait DatastoreHandle: Send + Sync {
    /// Resolves a key to its materialized entity, or `None` when no such
    /// entity exists in storage.
    fn by_key(&self, entity_type: &EntityType, key: &Key) -> Result<Option<Entity>, ResolutionError>;

    /// Derives the persistent key of a live entity.
    ///
    /// Used when a reference re-derives its manifest from materialized
    /// content before persistence.
    fn key_of(&self, entity: &Entity) -> Result<Key, ResolutionError>;
}

/// Supplies the currently active [`DatastoreHandle`].
///
/// References capture a provider at construction and ask it for a handle at
/// each fetch, so a unit of work can swap the active handle without
/// invalidating already-built references. The provider is passed explicitly
/// wherever it is needed; this crate holds no process-wide "current
/// datastore" state.
pub trait DatastoreProvider: Send + Sync {
    fn get(&self) -> Arc<dyn DatastoreHandle>;
}
