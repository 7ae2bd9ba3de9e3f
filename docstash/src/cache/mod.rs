//! Bounded document cache.
//!
//! The cache maps canonical document keys to document clones, bounded by
//! entry count (least-recently-used eviction, delegated to the `lru` crate)
//! and optionally by entry age. Eviction and expiry behave exactly like an
//! explicit delete: the key reports absent and a `cache.del` event fires, so
//! observers cannot distinguish the two.
//!
//! Mutations are synchronous and in-memory; the store never suspends. All
//! cache operations are infallible by contract.

pub mod store;

pub use store::{CacheConfig, CacheStats, DocumentCache};
