//! Read path: cache-first lookup by id, pass-through queries.

use docstash_core::{Document, DocumentId, Projection, Query, StashResult};

use crate::collection::Collection;
use crate::stash::Stash;

impl<T: Document, C: Collection<T>> Stash<T, C> {
    /// Find a document by id, serving from the cache when possible.
    ///
    /// On a miss the full document is fetched from the collection (no
    /// projection, so the cached copy is always complete) and cached before
    /// it is returned. A miss in the backing store returns `None` and does
    /// not populate the cache.
    pub async fn find_by_id(&self, id: &DocumentId) -> StashResult<Option<T>> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(Some(cached));
        }

        let query = Query::ById(id.clone());
        let found = self.collection.find_one(&query, None).await?;
        if let Some(document) = &found {
            self.cache.set(document);
        }
        Ok(found)
    }

    /// Find all documents matching a query.
    ///
    /// Never cached: invalidating by arbitrary query shape is out of scope.
    /// The facade-level default projection applies when the caller passes
    /// none.
    pub async fn find(
        &self,
        query: &Query,
        projection: Option<&Projection>,
    ) -> StashResult<Vec<T>> {
        let projection = projection.or(self.projection.as_ref());
        self.collection.find(query, projection).await
    }

    /// Find at most one document matching a query. Never cached.
    pub async fn find_one(
        &self,
        query: &Query,
        projection: Option<&Projection>,
    ) -> StashResult<Option<T>> {
        let projection = projection.or(self.projection.as_ref());
        self.collection.find_one(query, projection).await
    }
}
