//! Operation input types: queries, change sets, projections, and options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::DocumentId;

/// Selector for documents in the backing collection.
///
/// The `Filter` variant is opaque to the caching layer and interpreted by the
/// collection adapter; the stash never caches by filter shape. `ById` and
/// `Ids` exist so the mutation coordinator can address exact identity sets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Query {
    /// Match every document.
    #[default]
    All,
    /// Match the single document with this identity.
    ById(DocumentId),
    /// Match exactly this set of identities.
    Ids(Vec<DocumentId>),
    /// Opaque filter, interpreted by the collection adapter.
    Filter(Value),
}

impl Query {
    /// Select a single document by id.
    pub fn by_id(id: impl Into<DocumentId>) -> Self {
        Self::ById(id.into())
    }

    /// Select an exact identity set.
    pub fn ids(ids: impl IntoIterator<Item = DocumentId>) -> Self {
        Self::Ids(ids.into_iter().collect())
    }

    /// Select by an adapter-interpreted filter.
    pub fn filter(value: Value) -> Self {
        Self::Filter(value)
    }
}

/// Opaque change set applied to matched documents, interpreted by the
/// collection adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changes(Value);

impl Changes {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Changes {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Opaque projection passed through to the collection adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection(Value);

impl Projection {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Projection {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Options for insert operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertOptions {
    /// Request the pre-write form of the document. Not supported by the
    /// stash: the cache contract requires the persisted post-image.
    pub return_original: bool,
}

/// Options for update operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Insert the document when no match exists. Permitted on the atomic
    /// paths only; the precise bulk path rejects it.
    pub upsert: bool,
    /// Request the pre-update document. The stash forces this to `false`
    /// on every path it controls.
    pub return_original: bool,
}

impl UpdateOptions {
    /// Options with `upsert` enabled.
    pub fn upsert() -> Self {
        Self {
            upsert: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_default_matches_all() {
        assert_eq!(Query::default(), Query::All);
    }

    #[test]
    fn test_query_by_id_normalizes_strings() {
        let query = Query::by_id("550E8400-E29B-41D4-A716-446655440000");
        let Query::ById(id) = query else {
            panic!("expected ById");
        };
        assert_eq!(id.canonical(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_changes_wraps_value() {
        let changes = Changes::from(json!({"status": "archived"}));
        assert_eq!(changes.as_value()["status"], "archived");
    }

    #[test]
    fn test_update_options_upsert() {
        let options = UpdateOptions::upsert();
        assert!(options.upsert);
        assert!(!options.return_original);
    }
}
