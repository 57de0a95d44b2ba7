use std::sync::{Arc, Weak};

/// Reclaimable (weak) association from a cache key to a live value.
///
/// The application's object graph owns entities through `Arc`; the cache
/// only observes them. A `CacheEntry` may therefore report empty at any
/// read, regardless of prior writes, once the last strong reference
/// elsewhere is dropped. Every read path in this crate treats that as an
/// ordinary miss, never as an error.
///
/// # Type Parameters
///
/// * `T` - The observed value. Unsized targets are supported, which is how
///   the entity map holds `dyn Any + Send + Sync` and the proxy registry
///   holds concrete references.
///
/// # Examples
///
/// ```
/// use perezoso::CacheEntry;
/// use std::sync::Arc;
///
/// let value = Arc::new(42);
/// let entry = CacheEntry::observe(&value);
///
/// assert_eq!(entry.upgrade().as_deref(), Some(&42));
///
/// drop(value);
/// assert!(entry.upgrade().is_none());
/// assert!(entry.is_reclaimed());
/// ```
pub struct CacheEntry<T: ?Sized> {
    slot: Weak<T>,
}

impl<T: ?Sized> CacheEntry<T> {
    /// Creates an entry observing `value` without taking ownership of it.
    pub fn observe(value: &Arc<T>) -> Self {
        CacheEntry {
            slot: Arc::downgrade(value),
        }
    }

    /// Attempts to recover a strong reference to the observed value.
    ///
    /// Returns `None` once the value has been reclaimed.
    pub fn upgrade(&self) -> Option<Arc<T>> {
        self.slot.upgrade()
    }

    /// Returns true once the observed value has been dropped everywhere
    /// else.
    ///
    /// A `false` result is only a hint: the value can be reclaimed between
    /// this check and a following [`upgrade`](Self::upgrade), so callers
    /// must still handle `upgrade` returning `None`.
    pub fn is_reclaimed(&self) -> bool {
        self.slot.strong_count() == 0
    }
}

impl<T: ?Sized> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        CacheEntry {
            slot: Weak::clone(&self.slot),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for CacheEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("reclaimed", &self.is_reclaimed())
            .finish()
    }
}
