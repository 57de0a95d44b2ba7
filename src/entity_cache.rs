use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::cache_entry::CacheEntry;
use crate::datastore::Entity;
use crate::error::ReferenceError;
use crate::scalar_reference::ScalarReference;
use crate::Key;

#[cfg(feature = "stats")]
use crate::stats::{CacheStats, StatsSnapshot};

/// Per-unit-of-work entity cache: identity map, existence cache, and weak
/// proxy registry.
///
/// The cache is consulted before any fetch so the same logical entity is
/// materialized at most once per unit of work. It is a best-effort
/// optimization layer, never a correctness guarantee: entities and proxies
/// are held through reclaimable (weak) associations that can report empty
/// at any read, and every caller must tolerate that as an ordinary miss.
/// Only the existence map is held strongly, because "this id exists" is
/// cheap and must survive entity reclamation to avoid redundant existence
/// queries.
///
/// # Lifecycle
///
/// Create one cache per unit of work, populate it incrementally during
/// fetches, and either drop it or [`flush`](Self::flush) it at the unit of
/// work boundary. Flushing clears all three maps and resets statistics.
///
/// # Thread Safety
///
/// Not safe for concurrent mutation. The cache is scoped to a single unit
/// of work and must not be shared across concurrent execution contexts
/// without external synchronization. The statistics counters are atomic so
/// read paths can count through `&self`; the counters are diagnostic only.
///
/// # Examples
///
/// ```
/// use perezoso::{EntityCache, EntityType, Key};
/// use std::sync::Arc;
///
/// let mut cache = EntityCache::new();
/// let key = Key::new(EntityType::from_static("user"), 1);
///
/// assert_eq!(cache.exists(&key), None); // unknown, counts a miss
///
/// let user: perezoso::Entity = Arc::new(String::from("ada"));
/// cache.put_entity(key.clone(), &user);
///
/// assert_eq!(cache.exists(&key), Some(true));
/// assert!(cache.entity(&key).unwrap().is_some());
///
/// let stats = cache.stats();
/// assert_eq!(stats.misses, 1);
/// assert_eq!(stats.hits, 2);
/// ```
#[derive(Default)]
pub struct EntityCache {
    entities: HashMap<Key, CacheEntry<dyn Any + Send + Sync>>,
    existence: HashMap<Key, bool>,
    proxies: HashMap<Key, CacheEntry<ScalarReference>>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl EntityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether the entity named by `key` is known to exist.
    ///
    /// A live entry in the identity map answers `Some(true)` immediately
    /// and counts a hit; only then is the existence map consulted, where a
    /// recorded flag counts a hit and an unknown key counts a miss and
    /// answers `None`.
    pub fn exists(&self, key: &Key) -> Option<bool> {
        if let Some(entry) = self.entities.get(key) {
            if !entry.is_reclaimed() {
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                return Some(true);
            }
        }
        match self.existence.get(key) {
            Some(&flag) => {
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                Some(flag)
            }
            None => {
                #[cfg(feature = "stats")]
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the cached live entity for `key`, if one is resolvable.
    ///
    /// When the weak identity-map entry has been reclaimed (or was never
    /// stored), a still-live proxy registered for the same key is forced to
    /// materialize before a miss is declared; a fetch failure from that
    /// proxy propagates.
    pub fn entity(&self, key: &Key) -> Result<Option<Entity>, ReferenceError> {
        if let Some(entry) = self.entities.get(key) {
            if let Some(entity) = entry.upgrade() {
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                return Ok(Some(entity));
            }
        }
        // The entry is gone, but a proxy observed for the same key may
        // still be able to produce the entity.
        if let Some(proxy) = self.proxies.get(key).and_then(|entry| entry.upgrade()) {
            if let Some(entity) = proxy.get()? {
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                return Ok(Some(entity));
            }
        }
        #[cfg(feature = "stats")]
        self.stats.record_miss();
        Ok(None)
    }

    /// Returns the still-live proxy previously registered for `key`.
    pub fn proxy(&self, key: &Key) -> Option<Arc<ScalarReference>> {
        match self.proxies.get(key).and_then(|entry| entry.upgrade()) {
            Some(proxy) => {
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                Some(proxy)
            }
            None => {
                #[cfg(feature = "stats")]
                self.stats.record_miss();
                None
            }
        }
    }

    /// Records whether the entity named by `key` exists in storage,
    /// independent of whether the entity object itself is resident.
    pub fn notify_exists(&mut self, key: Key, exists: bool) {
        self.existence.insert(key, exists);
        #[cfg(feature = "stats")]
        self.stats.record_entity();
    }

    /// Stores a weak association from `key` to a materialized entity.
    ///
    /// Always records existence first; there is no way to cache an entity
    /// without registering it as existing.
    pub fn put_entity(&mut self, key: Key, entity: &Entity) {
        self.notify_exists(key.clone(), true);
        self.entities.insert(key, CacheEntry::observe(entity));
    }

    /// Stores a weak association from `key` to a constructed reference, so
    /// later lookups of the same key can reuse the instance.
    pub fn put_proxy(&mut self, key: Key, proxy: &Arc<ScalarReference>) {
        self.proxies.insert(key, CacheEntry::observe(proxy));
        #[cfg(feature = "stats")]
        self.stats.record_entity();
    }

    /// Number of identity-map entries that are still live.
    pub fn cached_entities(&self) -> usize {
        self.entities
            .values()
            .filter(|entry| !entry.is_reclaimed())
            .count()
    }

    /// Number of keys with a recorded existence flag.
    pub fn known_keys(&self) -> usize {
        self.existence.len()
    }

    /// Clears all internal state and resets statistics to zero.
    pub fn flush(&mut self) {
        debug!(
            "flushing entity cache ({} entities, {} existence records, {} proxies)",
            self.entities.len(),
            self.existence.len(),
            self.proxies.len()
        );
        self.entities.clear();
        self.existence.clear();
        self.proxies.clear();
        #[cfg(feature = "stats")]
        self.stats.reset();
    }

    /// Returns an immutable copy of the statistics counters; never the
    /// live counters themselves.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("entities", &self.entities.len())
            .field("existence", &self.existence.len())
            .field("proxies", &self.proxies.len())
            .finish()
    }
}
