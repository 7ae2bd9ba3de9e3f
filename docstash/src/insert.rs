//! Insert operations.

use docstash_core::{Document, InsertOptions, StashError, StashResult};

use crate::collection::Collection;
use crate::stash::Stash;

impl<T: Document, C: Collection<T>> Stash<T, C> {
    /// Insert one document and cache the persisted post-image.
    ///
    /// Defaults are merged into the document before it reaches the store.
    /// `options.return_original` is rejected: the cache contract requires
    /// the final persisted form, not the pre-write form.
    pub async fn insert_one(&self, document: T, options: InsertOptions) -> StashResult<T> {
        if options.return_original {
            return Err(StashError::UnsupportedOption {
                operation: "insert_one",
                option: "return_original",
            });
        }

        let document = self.defaults.apply(document)?;
        let stored = self.collection.insert_one(document, &options).await?;
        self.cache.set(&stored);
        Ok(stored)
    }

    /// Insert many documents in one bulk call and cache each persisted
    /// record.
    ///
    /// Defaults are merged per item. A failing bulk insert fails the whole
    /// call and caches nothing; there is no per-item rollback.
    pub async fn insert_many(
        &self,
        documents: Vec<T>,
        options: InsertOptions,
    ) -> StashResult<Vec<T>> {
        let documents = documents
            .into_iter()
            .map(|document| self.defaults.apply(document))
            .collect::<StashResult<Vec<_>>>()?;

        let stored = self.collection.insert_many(documents, &options).await?;
        for document in &stored {
            self.cache.set(document);
        }
        Ok(stored)
    }
}
