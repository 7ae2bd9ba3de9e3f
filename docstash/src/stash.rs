//! The stash facade.

use tokio::sync::broadcast;

use docstash_core::{CacheEvent, Defaults, Document, Projection};

use crate::cache::{CacheConfig, CacheStats, DocumentCache};
use crate::collection::Collection;

/// Caching decorator over a document collection.
///
/// Each instance exclusively owns its [`DocumentCache`]; the cache is never
/// shared across stashes. Reads by id are cache-first, multi-document reads
/// pass through, and every write keeps the cache consistent per the
/// protocol described in the [crate docs](crate).
pub struct Stash<T: Document, C: Collection<T>> {
    pub(crate) collection: C,
    pub(crate) cache: DocumentCache<T>,
    pub(crate) defaults: Defaults<T>,
    pub(crate) projection: Option<Projection>,
    pub(crate) safe_mode: bool,
}

impl<T: Document, C: Collection<T>> Stash<T, C> {
    /// Wrap a collection with a default-configured cache.
    pub fn new(collection: C) -> Self {
        Self::with_config(collection, CacheConfig::default())
    }

    /// Wrap a collection with an explicit cache configuration.
    pub fn with_config(collection: C, config: CacheConfig) -> Self {
        Self {
            collection,
            cache: DocumentCache::new(config),
            defaults: Defaults::default(),
            projection: None,
            safe_mode: false,
        }
    }

    /// Set the defaults merged into documents at insert time.
    pub fn set_defaults(&mut self, defaults: Defaults<T>) {
        self.defaults = defaults;
    }

    /// Set the projection applied to `find`/`find_one` when the caller
    /// passes none.
    pub fn set_projection(&mut self, projection: Option<Projection>) {
        self.projection = projection;
    }

    /// Toggle safe mode: when on, bulk writes take the atomic path and
    /// unconditionally reset the cache instead of tracking ids precisely.
    pub fn set_safe_mode(&mut self, safe_mode: bool) {
        self.safe_mode = safe_mode;
    }

    /// Change the cache capacity bound.
    pub fn set_cache_capacity(&mut self, max_entries: usize) {
        self.cache.resize(max_entries);
    }

    /// Change the cache entry TTL.
    pub fn set_cache_ttl(&mut self, ttl: Option<std::time::Duration>) {
        self.cache.set_ttl(ttl);
    }

    /// Whether safe mode is on.
    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// The wrapped collection.
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// The owned document cache.
    pub fn cache(&self) -> &DocumentCache<T> {
        &self.cache
    }

    /// Subscribe to cache lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    /// Snapshot of cache usage counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
