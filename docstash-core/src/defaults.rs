//! Insert-time defaults.
//!
//! Defaults are either a static partial document or a function computing one
//! from the incoming document. They are resolved once per insert call and
//! merged *under* the document: fields present on the document win.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::document::Document;
use crate::error::{StashError, StashResult};

/// Partial-document defaults merged into new documents at insert time.
pub enum Defaults<T> {
    /// No defaults; documents pass through unchanged.
    None,
    /// A static partial document.
    Static(Value),
    /// A function deriving a partial document from the one being inserted.
    Computed(Arc<dyn Fn(&T) -> Value + Send + Sync>),
}

impl<T: Document> Defaults<T> {
    /// Static defaults from a partial document.
    pub fn from_value(value: Value) -> Self {
        Self::Static(value)
    }

    /// Computed defaults from a function of the incoming document.
    pub fn computed(f: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    /// Merge the resolved defaults under `doc` and return the merged
    /// document. Fields present on `doc` win; `null` fields on `doc` take
    /// the default, matching partial-document semantics where an unassigned
    /// field is open to being filled in.
    pub fn apply(&self, doc: T) -> StashResult<T> {
        let defaults = match self {
            Self::None => return Ok(doc),
            Self::Static(value) => value.clone(),
            Self::Computed(f) => f(&doc),
        };
        if defaults.is_null() {
            return Ok(doc);
        }

        let overlay = serde_json::to_value(&doc).map_err(StashError::codec)?;
        let mut merged = defaults;
        merge_values(&mut merged, &overlay);
        serde_json::from_value(merged).map_err(StashError::codec)
    }
}

/// Recursive merge: objects merge key-by-key, `null` overlay values keep the
/// base, anything else in the overlay replaces the base.
fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value.clone(),
    }
}

impl<T> Default for Defaults<T> {
    fn default() -> Self {
        Self::None
    }
}

impl<T> Clone for Defaults<T> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Static(value) => Self::Static(value.clone()),
            Self::Computed(f) => Self::Computed(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Defaults<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("Defaults::None"),
            Self::Static(value) => f.debug_tuple("Defaults::Static").field(value).finish(),
            Self::Computed(_) => f.write_str("Defaults::Computed(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DocumentId;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: Option<DocumentId>,
        region: Option<String>,
        priority: i64,
    }

    impl Document for Order {
        fn document_id(&self) -> Option<DocumentId> {
            self.id.clone()
        }
    }

    fn order(priority: i64) -> Order {
        Order {
            id: Some(DocumentId::generate()),
            region: None,
            priority,
        }
    }

    #[test]
    fn test_none_passes_through() {
        let doc = order(3);
        let merged = Defaults::None.apply(doc.clone()).expect("apply");
        assert_eq!(merged, doc);
    }

    #[test]
    fn test_static_fills_null_fields() {
        let defaults = Defaults::from_value(json!({"region": "eu-west"}));
        let merged = defaults.apply(order(3)).expect("apply");
        assert_eq!(merged.region.as_deref(), Some("eu-west"));
    }

    #[test]
    fn test_document_fields_win() {
        let defaults = Defaults::from_value(json!({"priority": 9, "region": "eu-west"}));
        let merged = defaults.apply(order(3)).expect("apply");
        assert_eq!(merged.priority, 3);
        assert_eq!(merged.region.as_deref(), Some("eu-west"));
    }

    #[test]
    fn test_computed_sees_incoming_document() {
        let defaults = Defaults::computed(|doc: &Order| json!({"region": format!("zone-{}", doc.priority)}));
        let merged = defaults.apply(order(7)).expect("apply");
        assert_eq!(merged.region.as_deref(), Some("zone-7"));
    }

    #[test]
    fn test_merge_values_nested_objects() {
        let mut base = json!({"meta": {"a": 1, "b": 2}});
        let overlay = json!({"meta": {"b": 3, "c": 4}});
        merge_values(&mut base, &overlay);
        assert_eq!(base, json!({"meta": {"a": 1, "b": 3, "c": 4}}));
    }
}
