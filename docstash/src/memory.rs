//! In-memory reference collection.
//!
//! A [`Collection`] over a `BTreeMap` of serialized documents, used as the
//! reference adapter in tests and for embedding without an external store.
//! Documents serialize their identity under the `id` field; `Filter` queries
//! match by top-level field equality and [`Changes`] apply as a shallow
//! field overlay. Every method counts its invocations so tests can assert
//! how many store calls an operation performed.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use docstash_core::{
    CacheKey, Changes, Document, DocumentId, InsertOptions, Projection, Query, StashError,
    StashResult, StorageError, UpdateOptions,
};

use crate::collection::Collection;

/// Snapshot of per-operation invocation counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub find_one: u64,
    pub find: u64,
    pub find_ids: u64,
    pub insert_one: u64,
    pub insert_many: u64,
    pub find_one_and_update: u64,
    pub update_many: u64,
    pub delete_one: u64,
    pub delete_many: u64,
}

#[derive(Debug, Default)]
struct Counters {
    find_one: AtomicU64,
    find: AtomicU64,
    find_ids: AtomicU64,
    insert_one: AtomicU64,
    insert_many: AtomicU64,
    find_one_and_update: AtomicU64,
    update_many: AtomicU64,
    delete_one: AtomicU64,
    delete_many: AtomicU64,
}

/// In-memory document collection.
pub struct MemoryCollection<T: Document> {
    docs: RwLock<BTreeMap<CacheKey, Value>>,
    calls: Counters,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> MemoryCollection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            calls: Counters::default(),
            _marker: PhantomData,
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    /// Whether the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of how often each adapter method has been called.
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            find_one: self.calls.find_one.load(Ordering::Relaxed),
            find: self.calls.find.load(Ordering::Relaxed),
            find_ids: self.calls.find_ids.load(Ordering::Relaxed),
            insert_one: self.calls.insert_one.load(Ordering::Relaxed),
            insert_many: self.calls.insert_many.load(Ordering::Relaxed),
            find_one_and_update: self.calls.find_one_and_update.load(Ordering::Relaxed),
            update_many: self.calls.update_many.load(Ordering::Relaxed),
            delete_one: self.calls.delete_one.load(Ordering::Relaxed),
            delete_many: self.calls.delete_many.load(Ordering::Relaxed),
        }
    }

    fn read_guard(&self) -> StashResult<std::sync::RwLockReadGuard<'_, BTreeMap<CacheKey, Value>>> {
        self.docs.read().map_err(|_| {
            StorageError::Unavailable {
                reason: "lock poisoned".to_string(),
            }
            .into()
        })
    }

    fn write_guard(
        &self,
    ) -> StashResult<std::sync::RwLockWriteGuard<'_, BTreeMap<CacheKey, Value>>> {
        self.docs.write().map_err(|_| {
            StorageError::Unavailable {
                reason: "lock poisoned".to_string(),
            }
            .into()
        })
    }

    fn to_value(document: &T) -> StashResult<Value> {
        serde_json::to_value(document).map_err(StashError::codec)
    }

    fn from_value(value: &Value) -> StashResult<T> {
        serde_json::from_value(value.clone()).map_err(StashError::codec)
    }

    /// Serialize a document, assigning a generated id when it has none.
    fn prepare_insert(document: &T) -> StashResult<(CacheKey, Value)> {
        let id = document
            .document_id()
            .unwrap_or_else(DocumentId::generate);
        let mut value = Self::to_value(document)?;
        match &mut value {
            Value::Object(map) => {
                map.insert("id".to_string(), Value::String(id.canonical()));
            }
            _ => {
                return Err(StorageError::WriteFailed {
                    reason: "document did not serialize to an object".to_string(),
                }
                .into())
            }
        }
        Ok((CacheKey::from(&id), value))
    }
}

/// Whether a stored document matches the query.
fn matches(key: &CacheKey, value: &Value, query: &Query) -> StashResult<bool> {
    match query {
        Query::All => Ok(true),
        Query::ById(id) => Ok(*key == CacheKey::from(id)),
        Query::Ids(ids) => Ok(ids.iter().any(|id| *key == CacheKey::from(id))),
        Query::Filter(filter) => {
            let Some(fields) = filter.as_object() else {
                return Err(StorageError::QueryFailed {
                    reason: "filter must be an object".to_string(),
                }
                .into());
            };
            Ok(fields
                .iter()
                .all(|(field, expected)| value.get(field) == Some(expected)))
        }
    }
}

/// Shallow field overlay. The identity field is immutable through changes.
fn apply_changes(value: &mut Value, changes: &Changes) -> StashResult<()> {
    let Some(fields) = changes.as_value().as_object() else {
        return Err(StorageError::WriteFailed {
            reason: "changes must be an object".to_string(),
        }
        .into());
    };
    let Some(target) = value.as_object_mut() else {
        return Err(StorageError::WriteFailed {
            reason: "stored document is not an object".to_string(),
        }
        .into());
    };
    for (field, new_value) in fields {
        if field == "id" {
            continue;
        }
        target.insert(field.clone(), new_value.clone());
    }
    Ok(())
}

#[async_trait]
impl<T: Document> Collection<T> for MemoryCollection<T> {
    async fn find_one(
        &self,
        query: &Query,
        _projection: Option<&Projection>,
    ) -> StashResult<Option<T>> {
        self.calls.find_one.fetch_add(1, Ordering::Relaxed);
        let docs = self.read_guard()?;
        for (key, value) in docs.iter() {
            if matches(key, value, query)? {
                return Ok(Some(Self::from_value(value)?));
            }
        }
        Ok(None)
    }

    async fn find(&self, query: &Query, _projection: Option<&Projection>) -> StashResult<Vec<T>> {
        self.calls.find.fetch_add(1, Ordering::Relaxed);
        let docs = self.read_guard()?;
        let mut found = Vec::new();
        for (key, value) in docs.iter() {
            if matches(key, value, query)? {
                found.push(Self::from_value(value)?);
            }
        }
        Ok(found)
    }

    async fn find_ids(&self, query: &Query) -> StashResult<Vec<DocumentId>> {
        self.calls.find_ids.fetch_add(1, Ordering::Relaxed);
        let docs = self.read_guard()?;
        let mut ids = Vec::new();
        for (key, value) in docs.iter() {
            if matches(key, value, query)? {
                ids.push(DocumentId::parse(key.as_str()));
            }
        }
        Ok(ids)
    }

    async fn insert_one(&self, document: T, _options: &InsertOptions) -> StashResult<T> {
        self.calls.insert_one.fetch_add(1, Ordering::Relaxed);
        let (key, value) = Self::prepare_insert(&document)?;
        let mut docs = self.write_guard()?;
        if docs.contains_key(&key) {
            return Err(StorageError::WriteFailed {
                reason: format!("duplicate id {key}"),
            }
            .into());
        }
        let inserted = Self::from_value(&value)?;
        docs.insert(key, value);
        Ok(inserted)
    }

    async fn insert_many(&self, documents: Vec<T>, _options: &InsertOptions) -> StashResult<Vec<T>> {
        self.calls.insert_many.fetch_add(1, Ordering::Relaxed);
        let mut prepared = Vec::with_capacity(documents.len());
        for document in &documents {
            prepared.push(Self::prepare_insert(document)?);
        }
        let mut docs = self.write_guard()?;
        // All-or-nothing: validate the whole batch before touching the map.
        let mut batch_keys = std::collections::BTreeSet::new();
        for (key, _) in &prepared {
            if docs.contains_key(key) || !batch_keys.insert(key.clone()) {
                return Err(StorageError::WriteFailed {
                    reason: format!("duplicate id {key}"),
                }
                .into());
            }
        }
        let mut inserted = Vec::with_capacity(prepared.len());
        for (key, value) in prepared {
            inserted.push(Self::from_value(&value)?);
            docs.insert(key, value);
        }
        Ok(inserted)
    }

    async fn find_one_and_update(
        &self,
        query: &Query,
        changes: &Changes,
        options: &UpdateOptions,
    ) -> StashResult<Option<T>> {
        self.calls.find_one_and_update.fetch_add(1, Ordering::Relaxed);
        let mut docs = self.write_guard()?;

        let matched = {
            let mut matched = None;
            for (key, value) in docs.iter() {
                if matches(key, value, query)? {
                    matched = Some(key.clone());
                    break;
                }
            }
            matched
        };

        if let Some(key) = matched {
            let value = docs.get_mut(&key).ok_or_else(|| StorageError::WriteFailed {
                reason: format!("document {key} vanished mid-update"),
            })?;
            let original = value.clone();
            apply_changes(value, changes)?;
            let result = if options.return_original {
                Self::from_value(&original)?
            } else {
                Self::from_value(value)?
            };
            return Ok(Some(result));
        }

        if !options.upsert {
            return Ok(None);
        }

        // Upsert: seed the new document from the identity in the query, then
        // apply the changes on top.
        let id = match query {
            Query::ById(id) => id.clone(),
            _ => DocumentId::generate(),
        };
        let mut value = serde_json::json!({ "id": id.canonical() });
        apply_changes(&mut value, changes)?;
        let inserted = Self::from_value(&value)?;
        docs.insert(CacheKey::from(&id), value);
        Ok(Some(inserted))
    }

    async fn update_many(
        &self,
        query: &Query,
        changes: &Changes,
        _options: &UpdateOptions,
    ) -> StashResult<u64> {
        self.calls.update_many.fetch_add(1, Ordering::Relaxed);
        let mut docs = self.write_guard()?;
        let mut modified = 0;
        for (key, value) in docs.iter_mut() {
            if matches(key, value, query)? {
                apply_changes(value, changes)?;
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete_one(&self, query: &Query) -> StashResult<u64> {
        self.calls.delete_one.fetch_add(1, Ordering::Relaxed);
        let mut docs = self.write_guard()?;
        let matched = {
            let mut matched = None;
            for (key, value) in docs.iter() {
                if matches(key, value, query)? {
                    matched = Some(key.clone());
                    break;
                }
            }
            matched
        };
        match matched {
            Some(key) => {
                docs.remove(&key);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, query: &Query) -> StashResult<u64> {
        self.calls.delete_many.fetch_add(1, Ordering::Relaxed);
        let mut docs = self.write_guard()?;
        let matched: Vec<CacheKey> = {
            let mut matched = Vec::new();
            for (key, value) in docs.iter() {
                if matches(key, value, query)? {
                    matched.push(key.clone());
                }
            }
            matched
        };
        for key in &matched {
            docs.remove(key);
        }
        Ok(matched.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ticket {
        id: Option<DocumentId>,
        status: String,
        #[serde(default)]
        assignee: Option<String>,
    }

    impl Document for Ticket {
        fn document_id(&self) -> Option<DocumentId> {
            self.id.clone()
        }
    }

    fn ticket(status: &str) -> Ticket {
        Ticket {
            id: Some(DocumentId::generate()),
            status: status.to_string(),
            assignee: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_missing_id() {
        let collection = MemoryCollection::<Ticket>::new();
        let orphan = Ticket {
            id: None,
            status: "open".to_string(),
            assignee: None,
        };
        let inserted = collection
            .insert_one(orphan, &InsertOptions::default())
            .await
            .expect("insert");
        assert!(inserted.id.is_some());
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let collection = MemoryCollection::<Ticket>::new();
        let doc = ticket("open");
        collection
            .insert_one(doc.clone(), &InsertOptions::default())
            .await
            .expect("insert");
        let err = collection
            .insert_one(doc, &InsertOptions::default())
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StashError::Storage(_)));
    }

    #[tokio::test]
    async fn test_find_one_by_id() {
        let collection = MemoryCollection::<Ticket>::new();
        let doc = collection
            .insert_one(ticket("open"), &InsertOptions::default())
            .await
            .expect("insert");
        let id = doc.id.clone().unwrap();

        let found = collection
            .find_one(&Query::ById(id), None)
            .await
            .expect("find_one");
        assert_eq!(found, Some(doc));
    }

    #[tokio::test]
    async fn test_filter_matches_field_equality() {
        let collection = MemoryCollection::<Ticket>::new();
        collection
            .insert_many(vec![ticket("open"), ticket("open"), ticket("closed")], &InsertOptions::default())
            .await
            .expect("insert");

        let open = collection
            .find(&Query::filter(json!({"status": "open"})), None)
            .await
            .expect("find");
        assert_eq!(open.len(), 2);

        let ids = collection
            .find_ids(&Query::filter(json!({"status": "closed"})))
            .await
            .expect("find_ids");
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_filter_must_be_object() {
        let collection = MemoryCollection::<Ticket>::new();
        collection
            .insert_one(ticket("open"), &InsertOptions::default())
            .await
            .expect("insert");
        let err = collection
            .find(&Query::filter(json!("open")), None)
            .await
            .expect_err("bad filter");
        assert!(matches!(err, StashError::Storage(StorageError::QueryFailed { .. })));
    }

    #[tokio::test]
    async fn test_update_many_overlays_fields() {
        let collection = MemoryCollection::<Ticket>::new();
        collection
            .insert_many(vec![ticket("open"), ticket("open")], &InsertOptions::default())
            .await
            .expect("insert");

        let modified = collection
            .update_many(
                &Query::filter(json!({"status": "open"})),
                &Changes::from(json!({"status": "triaged"})),
                &UpdateOptions::default(),
            )
            .await
            .expect("update_many");
        assert_eq!(modified, 2);

        let triaged = collection
            .find(&Query::filter(json!({"status": "triaged"})), None)
            .await
            .expect("find");
        assert_eq!(triaged.len(), 2);
    }

    #[tokio::test]
    async fn test_changes_cannot_rewrite_identity() {
        let collection = MemoryCollection::<Ticket>::new();
        let doc = collection
            .insert_one(ticket("open"), &InsertOptions::default())
            .await
            .expect("insert");
        let id = doc.id.clone().unwrap();

        collection
            .update_many(
                &Query::ById(id.clone()),
                &Changes::from(json!({"id": "hijacked", "status": "closed"})),
                &UpdateOptions::default(),
            )
            .await
            .expect("update_many");

        let found = collection
            .find_one(&Query::ById(id.clone()), None)
            .await
            .expect("find_one")
            .expect("present");
        assert_eq!(found.id, Some(id));
        assert_eq!(found.status, "closed");
    }

    #[tokio::test]
    async fn test_find_one_and_update_returns_post_image() {
        let collection = MemoryCollection::<Ticket>::new();
        let doc = collection
            .insert_one(ticket("open"), &InsertOptions::default())
            .await
            .expect("insert");
        let id = doc.id.clone().unwrap();

        let updated = collection
            .find_one_and_update(
                &Query::ById(id),
                &Changes::from(json!({"status": "closed"})),
                &UpdateOptions::default(),
            )
            .await
            .expect("update")
            .expect("matched");
        assert_eq!(updated.status, "closed");
    }

    #[tokio::test]
    async fn test_upsert_seeds_identity_from_query() {
        let collection = MemoryCollection::<Ticket>::new();
        let id = DocumentId::generate();

        let upserted = collection
            .find_one_and_update(
                &Query::ById(id.clone()),
                &Changes::from(json!({"status": "fresh"})),
                &UpdateOptions::upsert(),
            )
            .await
            .expect("upsert")
            .expect("inserted");
        assert_eq!(upserted.id, Some(id));
        assert_eq!(upserted.status, "fresh");
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_paths() {
        let collection = MemoryCollection::<Ticket>::new();
        let doc = collection
            .insert_one(ticket("open"), &InsertOptions::default())
            .await
            .expect("insert");
        collection
            .insert_one(ticket("open"), &InsertOptions::default())
            .await
            .expect("insert");

        let deleted = collection
            .delete_one(&Query::ById(doc.id.clone().unwrap()))
            .await
            .expect("delete_one");
        assert_eq!(deleted, 1);

        let deleted = collection
            .delete_many(&Query::All)
            .await
            .expect("delete_many");
        assert_eq!(deleted, 1);
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn test_call_counters() {
        let collection = MemoryCollection::<Ticket>::new();
        collection
            .insert_one(ticket("open"), &InsertOptions::default())
            .await
            .expect("insert");
        collection.find(&Query::All, None).await.expect("find");
        collection.find(&Query::All, None).await.expect("find");

        let calls = collection.calls();
        assert_eq!(calls.insert_one, 1);
        assert_eq!(calls.find, 2);
        assert_eq!(calls.find_one, 0);
    }
}
