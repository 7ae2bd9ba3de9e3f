//! In-memory LRU + TTL document cache with lifecycle notifications.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::broadcast;
use tracing::debug;

use docstash_core::{CacheEvent, CacheKey, Document, DocumentId};

/// Configuration for a [`DocumentCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries before LRU eviction.
    pub max_entries: usize,
    /// Maximum entry age. `None` disables age-based expiry.
    pub ttl: Option<Duration>,
    /// Buffer capacity of the lifecycle event channel. Slow subscribers
    /// past this buffer miss events (lagged), they are never blocked on.
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            ttl: None,
            event_capacity: 64,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum entry count.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired entries).
    pub misses: u64,
    /// Number of entries evicted by the capacity bound.
    pub evictions: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A cached document with its insertion time.
struct CacheEntry<T> {
    document: T,
    stored_at: Instant,
}

/// Bounded key→document cache.
///
/// Owned exclusively by one [`Stash`](crate::Stash) instance. Documents go
/// in and come out as independent clones; a caller can never obtain an alias
/// to cache-internal state, so mutating a returned document cannot corrupt
/// the cache.
pub struct DocumentCache<T: Document> {
    entries: Mutex<LruCache<CacheKey, CacheEntry<T>>>,
    ttl: Option<Duration>,
    events: broadcast::Sender<CacheEvent>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<T: Document> DocumentCache<T> {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        let (events, _rx) = broadcast::channel(config.event_capacity.max(1));
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
            events,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Subscribe to cache lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Look up a document by id.
    ///
    /// Returns an independent clone of the cached document, or `None` when
    /// the key is absent or its entry has outlived the TTL. Expired entries
    /// are removed on the way out and behave exactly like a `del`.
    pub fn get(&self, id: &DocumentId) -> Option<T> {
        let key = CacheKey::from(id);
        let mut entries = self.lock();

        let (found, expired) = match entries.get(&key) {
            Some(entry) => {
                if self.is_expired(entry) {
                    (None, true)
                } else {
                    (Some(entry.document.clone()), false)
                }
            }
            None => (None, false),
        };
        if expired {
            entries.pop(&key);
        }
        drop(entries);

        match found {
            Some(document) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(document)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                if expired {
                    self.emit(CacheEvent::Del(key));
                }
                None
            }
        }
    }

    /// Store a document under its canonical key.
    ///
    /// A document without an id is a no-op (callers sometimes pass the
    /// result of a failed lookup); returns whether the document was stored.
    pub fn set(&self, document: &T) -> bool {
        let Some(id) = document.document_id() else {
            return false;
        };
        let key = CacheKey::from(&id);
        let entry = CacheEntry {
            document: document.clone(),
            stored_at: Instant::now(),
        };

        let displaced = self.lock().push(key.clone(), entry);
        if let Some((displaced_key, _)) = displaced {
            // Same key means a refresh, a different key means the capacity
            // bound pushed out the LRU entry.
            if displaced_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                self.emit(CacheEvent::Del(displaced_key));
            }
        }
        self.emit(CacheEvent::Set(key));
        true
    }

    /// Remove the entry for an id.
    ///
    /// Emits `cache.del` whether or not the entry was present (idempotent);
    /// returns whether removal occurred.
    pub fn del(&self, id: &DocumentId) -> bool {
        let key = CacheKey::from(id);
        let was_present = self.lock().pop(&key).is_some();
        self.emit(CacheEvent::Del(key));
        was_present
    }

    /// Clear all entries unconditionally.
    ///
    /// O(n) and loses all warm entries; used only as the conservative
    /// fallback when a bulk write may have drifted.
    pub fn reset(&self) {
        self.lock().clear();
        self.emit(CacheEvent::Reset);
    }

    /// Change the capacity bound. Shrinking evicts least-recently-used
    /// entries down to the new bound; each one behaves like a `del`.
    pub fn resize(&self, max_entries: usize) {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        let mut evicted = Vec::new();
        {
            let mut entries = self.lock();
            while entries.len() > capacity.get() {
                match entries.pop_lru() {
                    Some((key, _)) => evicted.push(key),
                    None => break,
                }
            }
            entries.resize(capacity);
        }
        for key in evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            self.emit(CacheEvent::Del(key));
        }
    }

    /// Change the entry TTL. Applies to existing entries as well: an entry
    /// older than the new TTL expires on its next read.
    pub fn set_ttl(&mut self, ttl: Option<Duration>) {
        self.ttl = ttl;
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of usage counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count: self.len() as u64,
        }
    }

    fn is_expired(&self, entry: &CacheEntry<T>) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.stored_at.elapsed() > ttl)
    }

    // Cache operations are infallible by contract; a poisoned guard still
    // holds a structurally coherent map, so recover it.
    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CacheEvent) {
        debug!(event = event.kind(), key = ?event.key(), "cache event");
        // Nobody listening is fine; the event is dropped.
        let _ = self.events.send(event);
    }
}
