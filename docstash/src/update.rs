//! Update operations and their cache consistency protocol.

use tracing::warn;

use docstash_core::{
    Changes, Document, DocumentId, Query, StashError, StashResult, UpdateOptions,
};

use crate::collection::Collection;
use crate::stash::Stash;

impl<T: Document, C: Collection<T>> Stash<T, C> {
    /// Update one document by id and cache the post-image.
    ///
    /// A single atomic find-and-update with `return_original` forced off,
    /// so the known post-update document replaces any stale cached entry.
    /// Upsert is permitted; an upserted document is cached under its
    /// generated id.
    pub async fn update_one(
        &self,
        id: &DocumentId,
        changes: &Changes,
        options: UpdateOptions,
    ) -> StashResult<Option<T>> {
        let options = UpdateOptions {
            return_original: false,
            ..options
        };
        let query = Query::ById(id.clone());

        let updated = self
            .collection
            .find_one_and_update(&query, changes, &options)
            .await?;
        if let Some(document) = &updated {
            self.cache.set(document);
        }
        Ok(updated)
    }

    /// Update all documents matching a query.
    ///
    /// In safe mode this delegates to [`Stash::update_safe`]. Otherwise the
    /// precise path runs: resolve the matching ids, evict each from the
    /// cache *before* the write, then update exactly that id set. If the
    /// reported modified count differs from the resolved id count, the
    /// document set changed between the two queries and the whole cache is
    /// dropped rather than risking a stale mapping.
    pub async fn update_many(
        &self,
        query: &Query,
        changes: &Changes,
        options: UpdateOptions,
    ) -> StashResult<u64> {
        if self.safe_mode {
            return self.update_safe(query, changes, options).await;
        }

        let options = UpdateOptions {
            return_original: false,
            ..options
        };
        // A fixed id set cannot express an upsert.
        if options.upsert {
            return Err(StashError::UnsupportedOption {
                operation: "update_many",
                option: "upsert",
            });
        }

        let matched = self.collection.find_ids(query).await?;
        if matched.is_empty() {
            return Ok(0);
        }

        for id in &matched {
            self.cache.del(id);
        }

        let restricted = Query::Ids(matched.clone());
        let modified = self
            .collection
            .update_many(&restricted, changes, &options)
            .await?;

        if modified != matched.len() as u64 {
            warn!(
                expected = matched.len(),
                modified, "modified count mismatch, dropping the whole cache"
            );
            self.cache.reset();
        }

        Ok(modified)
    }

    /// Update all documents matching a query in one atomic call, then reset
    /// the entire cache.
    ///
    /// One query, no id-resolution race; upsert is permitted. Costs every
    /// warm entry, including unrelated ones.
    pub async fn update_safe(
        &self,
        query: &Query,
        changes: &Changes,
        options: UpdateOptions,
    ) -> StashResult<u64> {
        let options = UpdateOptions {
            return_original: false,
            ..options
        };

        let modified = self.collection.update_many(query, changes, &options).await?;
        self.cache.reset();
        Ok(modified)
    }
}
