//! Delete operations and their cache consistency protocol.

use tracing::warn;

use docstash_core::{Document, DocumentId, Query, StashResult};

use crate::collection::Collection;
use crate::stash::Stash;

impl<T: Document, C: Collection<T>> Stash<T, C> {
    /// Delete one document by id, dropping it from the cache.
    ///
    /// Returns whether exactly one document was removed. Eviction order is
    /// immaterial here: deleting from the cache is idempotent and always
    /// safe.
    pub async fn delete_one(&self, id: &DocumentId) -> StashResult<bool> {
        self.cache.del(id);
        let deleted = self.collection.delete_one(&Query::ById(id.clone())).await?;
        Ok(deleted == 1)
    }

    /// Delete all documents matching a query.
    ///
    /// Mirrors [`Stash::update_many`]: safe mode delegates to
    /// [`Stash::delete_safe`]; otherwise matching ids are resolved and
    /// evicted individually, the delete is restricted to exactly that id
    /// set, and a count mismatch drops the whole cache.
    pub async fn delete_many(&self, query: &Query) -> StashResult<u64> {
        if self.safe_mode {
            return self.delete_safe(query).await;
        }

        let matched = self.collection.find_ids(query).await?;
        if matched.is_empty() {
            return Ok(0);
        }

        for id in &matched {
            self.cache.del(id);
        }

        let restricted = Query::Ids(matched.clone());
        let deleted = self.collection.delete_many(&restricted).await?;

        if deleted != matched.len() as u64 {
            warn!(
                expected = matched.len(),
                deleted, "deleted count mismatch, dropping the whole cache"
            );
            self.cache.reset();
        }

        Ok(deleted)
    }

    /// Delete all documents matching a query in one atomic call, then reset
    /// the entire cache.
    pub async fn delete_safe(&self, query: &Query) -> StashResult<u64> {
        let deleted = self.collection.delete_many(query).await?;
        self.cache.reset();
        Ok(deleted)
    }
}
