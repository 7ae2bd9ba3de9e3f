//! Collection adapter trait.
//!
//! The backing document store is an opaque collaborator. Implementations
//! wrap whatever client the store provides; the stash only needs these
//! primitives. All write operations return the persisted state (post-images
//! and affected counts), which is what the cache protocol keys off.

use async_trait::async_trait;

use docstash_core::{
    Changes, Document, DocumentId, InsertOptions, Projection, Query, StashResult, UpdateOptions,
};

/// CRUD primitives over documents addressable by a unique identifier.
#[async_trait]
pub trait Collection<T: Document>: Send + Sync {
    /// Find at most one document matching the query.
    async fn find_one(
        &self,
        query: &Query,
        projection: Option<&Projection>,
    ) -> StashResult<Option<T>>;

    /// Find all documents matching the query.
    async fn find(&self, query: &Query, projection: Option<&Projection>) -> StashResult<Vec<T>>;

    /// Find the ids of all documents matching the query, projecting only
    /// the identity field. Drives precise bulk invalidation.
    async fn find_ids(&self, query: &Query) -> StashResult<Vec<DocumentId>>;

    /// Insert one document and return the persisted post-image, including
    /// any store-generated identity.
    async fn insert_one(&self, document: T, options: &InsertOptions) -> StashResult<T>;

    /// Insert many documents in one bulk call and return the persisted
    /// post-images. All-or-nothing: a failing bulk insert persists nothing.
    async fn insert_many(&self, documents: Vec<T>, options: &InsertOptions) -> StashResult<Vec<T>>;

    /// Atomically update one document and return it. With
    /// `options.return_original == false` the post-update document is
    /// returned; `None` when nothing matched and `upsert` is off.
    async fn find_one_and_update(
        &self,
        query: &Query,
        changes: &Changes,
        options: &UpdateOptions,
    ) -> StashResult<Option<T>>;

    /// Update all documents matching the query; returns the modified count.
    async fn update_many(
        &self,
        query: &Query,
        changes: &Changes,
        options: &UpdateOptions,
    ) -> StashResult<u64>;

    /// Delete at most one document matching the query; returns the deleted
    /// count (0 or 1).
    async fn delete_one(&self, query: &Query) -> StashResult<u64>;

    /// Delete all documents matching the query; returns the deleted count.
    async fn delete_many(&self, query: &Query) -> StashResult<u64>;
}
