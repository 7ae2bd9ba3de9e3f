//! Document identity.
//!
//! Documents are addressed either by a native UUID or by an opaque string
//! identifier assigned by the backing store. Both forms normalize to a single
//! canonical string, which is the form used for cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a document.
///
/// Construction from a string goes through [`DocumentId::parse`], which
/// recognizes UUID-shaped input and stores it in the native form. This makes
/// `"550E8400-E29B-41D4-A716-446655440000"` and its lowercase spelling the
/// same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    /// Native UUID identity.
    Uuid(Uuid),
    /// Opaque string identity assigned by the backing store.
    Text(String),
}

impl DocumentId {
    /// Generate a fresh UUIDv7 identity (timestamp-sortable).
    pub fn generate() -> Self {
        Self::Uuid(Uuid::now_v7())
    }

    /// Normalize a string identifier.
    ///
    /// Valid UUID spellings become [`DocumentId::Uuid`]; everything else is
    /// kept verbatim as [`DocumentId::Text`]. Total over all inputs.
    pub fn parse(s: &str) -> Self {
        match Uuid::parse_str(s) {
            Ok(uuid) => Self::Uuid(uuid),
            Err(_) => Self::Text(s.to_string()),
        }
    }

    /// Canonical string form: hyphenated lowercase for UUIDs, the string
    /// verbatim otherwise. Deterministic; used uniformly as the cache key.
    pub fn canonical(&self) -> String {
        match self {
            Self::Uuid(uuid) => uuid.hyphenated().to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self::Uuid(uuid)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
