use std::any::Any;
use std::mem;

use crate::datastore::Entity;
use crate::error::ReferenceError;
use crate::EntityType;

/// Fetch state of a single deferred reference instance.
///
/// Every reference starts `Unfetched`. The first successful access runs the
/// shape-specific fetch algorithm exactly once and moves the instance to
/// `Fetched`; later reads return the stored payload with no side effect. A
/// failed fetch never transitions, so callers may retry the same `get()`.
///
/// The only reverse path is [`Reference::freeze`], which re-derives the key
/// manifest from live content before discarding the payload. There is no
/// other way back to `Unfetched`.
#[derive(Debug)]
pub enum ReferenceState<T> {
    Unfetched,
    Fetched(T),
}

impl<T> ReferenceState<T> {
    /// Returns true once a fetch has completed on this instance.
    pub fn is_fetched(&self) -> bool {
        matches!(self, ReferenceState::Fetched(_))
    }

    /// Returns the fetched payload, if any.
    pub fn fetched(&self) -> Option<&T> {
        match self {
            ReferenceState::Fetched(value) => Some(value),
            ReferenceState::Unfetched => None,
        }
    }

    /// Takes the fetched payload out, leaving the state `Unfetched`.
    pub fn take(&mut self) -> Option<T> {
        match mem::replace(self, ReferenceState::Unfetched) {
            ReferenceState::Fetched(value) => Some(value),
            ReferenceState::Unfetched => None,
        }
    }
}

impl<T> Default for ReferenceState<T> {
    fn default() -> Self {
        ReferenceState::Unfetched
    }
}

/// Capability interface shared by all deferred reference shapes.
///
/// Mapping code that needs to treat "real value" and "not-yet-fetched
/// placeholder" uniformly depends on this trait, never on the concrete
/// shapes. The [`introspect`](crate::introspect) helpers recover it from
/// type-erased [`Entity`] values.
///
/// # Contract
///
/// - `is_materialized` reports the state with no side effect.
/// - `force` triggers the fetch when needed and returns the erased real
///   value: the entity (or `None`) for a scalar, a snapshot of the
///   materialized collection or map for the other shapes.
/// - `freeze` is idempotent and is a no-op on an unfetched instance; on a
///   fetched one it re-derives the authoritative key manifest from the
///   current materialized content, discards the payload, and returns the
///   instance to `Unfetched`, so that only keys cross a serialization
///   boundary and a later access fetches fresh.
/// - `set` always fails: references are read-only views over persisted
///   state. Mutate materialized content through the shape's own API
///   instead, then `freeze` before persisting.
///
/// Once fetched, an instance's payload is only modified through the
/// collection shapes' explicit `with_mut` window. That is what makes it
/// safe for one reference instance to be observed by several owners after
/// materialization, which the per-key proxy registry relies on.
pub trait Reference: Any + Send + Sync {
    /// Declared logical type of the referent(s).
    fn referent_type(&self) -> &EntityType;

    /// Whether entities that have disappeared from storage since the
    /// reference was created are tolerated.
    fn ignore_missing(&self) -> bool;

    /// Returns true once this instance has fetched its content.
    fn is_materialized(&self) -> bool;

    /// Forces materialization and returns the erased real value.
    fn force(&self) -> Result<Option<Entity>, ReferenceError>;

    /// Re-derives the key manifest from materialized content and returns
    /// the instance to the unfetched state. No-op when unfetched.
    fn freeze(&self) -> Result<(), ReferenceError>;

    /// View of the concrete shape for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Rejects replacement of the referenced value.
    fn set(&self, value: Entity) -> Result<(), ReferenceError> {
        let _ = value;
        Err(ReferenceError::UnsupportedMutation {
            referent: self.referent_type().clone(),
        })
    }
}
