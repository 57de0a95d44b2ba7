use std::sync::atomic::{AtomicU64, Ordering};

/// Cache statistics for monitoring hit/miss rates of a unit of work.
///
/// Tracks three counters: `entities` (existence notifications and proxy
/// registrations), `hits`, and `misses`. Counters are monotonically
/// non-decreasing for the lifetime of a cache and reset only by
/// [`EntityCache::flush`](crate::EntityCache::flush).
///
/// # Thread Safety
///
/// Counters use atomic operations with `Relaxed` ordering. The cache itself
/// is scoped to one unit of work and is not safe for concurrent mutation;
/// the atomics exist so read paths can count through `&self`, and so that a
/// snapshot taken while other code is still reading undercounts at worst.
/// The numbers are diagnostic, not correctness-bearing.
///
/// # Examples
///
/// ```
/// use perezoso::CacheStats;
///
/// let stats = CacheStats::new();
///
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Debug, Default)]
pub struct CacheStats {
    entities: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    /// Creates a new `CacheStats` instance with zero counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entity registration (existence notification or proxy
    /// registration).
    #[inline]
    pub fn record_entity(&self) {
        self.entities.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache hit (successful lookup).
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache miss (failed lookup).
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of entity registrations.
    #[inline]
    pub fn entities(&self) -> u64 {
        self.entities.load(Ordering::Relaxed)
    }

    /// Returns the total number of cache hits.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the total number of cache misses.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Returns the total number of cache accesses (hits + misses).
    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Calculates the cache hit rate as a fraction (0.0 to 1.0).
    ///
    /// Returns 0.0 if there have been no accesses.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Resets all statistics counters to zero.
    pub fn reset(&self) {
        self.entities.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Returns an immutable copy of the current counters.
    ///
    /// The snapshot never aliases the live counters; it is safe to hold
    /// across later cache activity for before/after comparisons.
    ///
    /// # Examples
    ///
    /// ```
    /// use perezoso::CacheStats;
    ///
    /// let stats = CacheStats::new();
    /// stats.record_miss();
    ///
    /// let before = stats.snapshot();
    /// stats.record_hit();
    ///
    /// assert_eq!(before.hits, 0);
    /// assert_eq!(stats.snapshot().hits, 1);
    /// ```
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            entities: self.entities(),
            hits: self.hits(),
            misses: self.misses(),
        }
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            entities: AtomicU64::new(self.entities()),
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
        }
    }
}

/// Immutable copy of the cache counters at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub entities: u64,
    pub hits: u64,
    pub misses: u64,
}
