//! docstash - Consistency-Aware Document Cache
//!
//! A caching decorator placed in front of a document-oriented collection.
//! Reads by id are served from a bounded in-memory cache; writes go through
//! a mutation coordinator that keeps the cache consistent with the backing
//! store.
//!
//! # Consistency Protocol
//!
//! - `insert_one` / `insert_many` cache the persisted post-image.
//! - `update_one` is a single atomic find-and-update; the post-image
//!   replaces any stale cached entry.
//! - `update_many` / `delete_many` use a two-phase precise path by default:
//!   find the matching ids, evict each, then write restricted to exactly
//!   that id set. A mismatch between the expected and reported affected
//!   counts means the document set drifted between the two queries; the
//!   whole cache is dropped as a safety valve.
//! - With `safe_mode` enabled (or via `update_safe` / `delete_safe`), bulk
//!   writes run as a single atomic query followed by an unconditional cache
//!   reset.
//! - `find` / `find_one` are never cached: invalidating by arbitrary query
//!   shape is intractable without a query-matching engine.
//!
//! # Example
//!
//! ```ignore
//! let stash = Stash::new(collection);
//! let doc = stash.insert_one(doc, InsertOptions::default()).await?;
//! let id = doc.document_id().expect("persisted documents have ids");
//! // Served from cache, no store query:
//! let cached = stash.find_by_id(&id).await?;
//! ```

pub mod cache;
pub mod collection;
pub mod memory;
pub mod stash;

mod delete;
mod find;
mod insert;
mod update;

pub use cache::{CacheConfig, CacheStats, DocumentCache};
pub use collection::Collection;
pub use memory::{CallCounts, MemoryCollection};
pub use stash::Stash;

// Re-export core types for convenience
pub use docstash_core::{
    CacheEvent, CacheKey, Changes, Defaults, Document, DocumentId, InsertOptions, Projection,
    Query, StashError, StashResult, StorageError, UpdateOptions,
};
