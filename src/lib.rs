//! # Perezoso
//!
//! Request-scoped entity cache and lazy references for object-document
//! mapping.
//!
//! Within one unit of work, an object-document mapper wants two things from
//! this crate: never materialize the same logical entity twice, and defer
//! loading of referenced entities, lists, and maps until something actually
//! reads them. Both are convenience layers over the real datastore, which
//! stays behind the narrow [`DatastoreProvider`] / [`DatastoreHandle`]
//! interfaces.
//!
//! ## Features
//!
//! - **Identity map**: [`EntityCache`] resolves a [`Key`] to an already
//!   materialized entity through reclaimable (weak) associations that never
//!   keep the application graph alive
//! - **Existence cache**: "this id exists" survives entity reclamation, so
//!   repeated existence queries stay cheap
//! - **Proxy registry**: one deferred reference instance per key, reused
//!   across lookups while it is alive
//! - **Deferred references**: [`ScalarReference`], [`ListReference`], and
//!   [`MapReference`] fetch exactly once, on first access
//! - **Freeze before persistence**: a fetched reference folds its live
//!   content back into a key manifest so only keys cross the serialization
//!   boundary
//! - **Statistics**: hit/miss/entity counters with snapshots (with the
//!   `stats` feature, on by default)
//!
//! ## Module Organization
//!
//! - [`Key`] / [`EntityType`] / [`Id`] - lookup tokens
//! - [`CacheEntry`] - reclaimable weak association
//! - [`EntityCache`] - the per-unit-of-work cache
//! - [`Reference`] - the capability trait and fetch-once state machine
//!   shared by all reference shapes
//! - [`introspect`] - detect / force / unwrap erased reference values
//! - [`ReferenceFactory`] - builds references wired to a datastore provider
//!
//! ## Quick Start
//!
//! ```
//! use perezoso::{EntityCache, EntityType, Key};
//! use std::sync::Arc;
//!
//! let mut cache = EntityCache::new();
//! let key = Key::new(EntityType::from_static("user"), 42);
//!
//! // Unknown key: a miss.
//! assert_eq!(cache.exists(&key), None);
//!
//! // Materialize once, then every lookup in this unit of work is a hit.
//! let user: perezoso::Entity = Arc::new(String::from("ada"));
//! cache.put_entity(key.clone(), &user);
//! assert_eq!(cache.exists(&key), Some(true));
//! ```

mod cache_entry;
mod datastore;
mod entity_cache;
mod error;
mod factory;
mod key;
mod list_reference;
mod map_reference;
mod reference;
mod scalar_reference;

pub mod introspect;

#[cfg(feature = "stats")]
mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use cache_entry::CacheEntry;
pub use datastore::{DatastoreHandle, DatastoreProvider, Entity, ResolutionError};
pub use entity_cache::EntityCache;
pub use error::ReferenceError;
pub use factory::ReferenceFactory;
pub use key::{EntityType, Id, Key};
pub use list_reference::ListReference;
pub use map_reference::MapReference;
pub use reference::{Reference, ReferenceState};
pub use scalar_reference::ScalarReference;

#[cfg(feature = "stats")]
pub use stats::{CacheStats, StatsSnapshot};
