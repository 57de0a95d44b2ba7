//! Type-erasure-safe helpers over arbitrary [`Entity`] values.
//!
//! Mapping code handles fields whose value may be a real entity or a
//! deferred reference standing in for one. These helpers make the two
//! interchangeable without the caller knowing the concrete shape:
//! detection, forced materialization, and unwrapping all work on the erased
//! [`Entity`] type.

use crate::datastore::Entity;
use crate::error::ReferenceError;
use crate::list_reference::ListReference;
use crate::map_reference::MapReference;
use crate::reference::Reference;
use crate::scalar_reference::ScalarReference;
use crate::EntityType;

/// Recovers the reference capability from an erased value, if it has one.
///
/// This is the single place that knows the concrete reference shapes; every
/// other helper goes through it.
pub fn as_reference(value: &Entity) -> Option<&dyn Reference> {
    if let Some(reference) = value.downcast_ref::<ScalarReference>() {
        return Some(reference);
    }
    if let Some(reference) = value.downcast_ref::<ListReference>() {
        return Some(reference);
    }
    if let Some(reference) = value.downcast_ref::<MapReference>() {
        return Some(reference);
    }
    None
}

/// Returns true iff the value is a deferred reference.
///
/// # Examples
///
/// ```
/// use perezoso::{introspect, Entity};
/// use std::sync::Arc;
///
/// let plain: Entity = Arc::new(String::from("not a reference"));
/// assert!(!introspect::is_reference(&plain));
/// ```
pub fn is_reference(value: &Entity) -> bool {
    as_reference(value).is_some()
}

/// Returns true if the value is not a reference, or is a reference whose
/// content has already been fetched. Never triggers a fetch.
pub fn is_materialized(value: &Entity) -> bool {
    match as_reference(value) {
        Some(reference) => reference.is_materialized(),
        None => true,
    }
}

/// Declared referent type for references; `None` for absent values and for
/// non-references, whose erased runtime type this layer cannot name.
pub fn referent_type(value: Option<&Entity>) -> Option<EntityType> {
    value
        .and_then(as_reference)
        .map(|reference| reference.referent_type().clone())
}

/// Forces a reference to materialize and returns its real value; passes any
/// other value through unchanged, with no datastore call.
///
/// For a scalar reference the real value is the entity (or `None` when the
/// referent was missing); for a list or map reference it is a snapshot of
/// the materialized collection, erased the same way entities are
/// (`Arc<Vec<Entity>>` / `Arc<IndexMap<String, Option<Entity>>>`).
pub fn unwrap(value: &Entity) -> Result<Option<Entity>, ReferenceError> {
    match as_reference(value) {
        Some(reference) => reference.force(),
        None => Ok(Some(value.clone())),
    }
}
