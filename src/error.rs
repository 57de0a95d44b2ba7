//! Error types for cache and reference operations.

use thiserror::Error;

use crate::datastore::ResolutionError;
use crate::EntityType;

/// Errors surfaced by deferred references and the entity cache.
///
/// Every variant propagates synchronously from the operation that triggered
/// it; nothing in this crate logs-and-swallows. A fetch that fails leaves
/// its reference unmaterialized, so callers may retry the same `get()`.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Strict collection fetch resolved fewer entities than the manifest
    /// names. Only [`ListReference`](crate::ListReference) raises this, and
    /// only with `ignore_missing` disabled; a missing scalar referent
    /// resolves to `None`, and a missing map referent is inserted as a
    /// `None` value.
    #[error(
        "fetching {collection} of '{referent}' resolved {resolved} of {expected} referenced entities"
    )]
    MissingReferents {
        collection: &'static str,
        referent: EntityType,
        expected: usize,
        resolved: usize,
    },

    /// A reference was asked to replace its value. References are read-only
    /// views over persisted state; mutate the materialized content instead
    /// and let `freeze` re-derive the manifest.
    #[error("reference to '{referent}' is a read-only view and cannot be assigned")]
    UnsupportedMutation { referent: EntityType },

    /// The datastore failed while resolving or deriving a key. Propagated
    /// unmodified; no retry happens at this layer.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
