//! Marker trait for cacheable documents.

use serde::{de::DeserializeOwned, Serialize};

use crate::id::DocumentId;

/// A document that can be stored through the stash.
///
/// The schema is otherwise opaque; the only structural requirement is a
/// single identity field exposed through [`Document::document_id`].
///
/// # Implementation Requirements
///
/// - `document_id()` must return `None` only while the document has not been
///   assigned an identity (e.g. before the store generates one at insert).
/// - Once persisted, the returned id must be stable for the lifetime of the
///   document.
/// - Implementations must be `Clone`, `Serialize`, and `DeserializeOwned`
///   so the cache can hand out independent copies and the defaults merge can
///   round-trip through JSON.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The unique identifier of this document, if assigned.
    fn document_id(&self) -> Option<DocumentId>;
}
