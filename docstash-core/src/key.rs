//! Cache key codec.
//!
//! A [`CacheKey`] is the canonical string form of a [`DocumentId`]. The inner
//! string is private: a key can only be obtained from a `DocumentId`, so every
//! cache operation goes through the same normalization and two spellings of
//! the same identity cannot land on different cache slots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::DocumentId;

/// Canonical cache key for a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// The canonical string this key wraps.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&DocumentId> for CacheKey {
    fn from(id: &DocumentId) -> Self {
        Self(id.canonical())
    }
}

impl From<DocumentId> for CacheKey {
    fn from(id: DocumentId) -> Self {
        Self::from(&id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn uuid_strategy() -> impl Strategy<Value = uuid::Uuid> {
        any::<[u8; 16]>().prop_map(uuid::Uuid::from_bytes)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// The codec is deterministic: the same id always yields the same key.
        #[test]
        fn prop_codec_deterministic(s in ".*") {
            let a = CacheKey::from(&DocumentId::parse(&s));
            let b = CacheKey::from(&DocumentId::parse(&s));
            prop_assert_eq!(a, b);
        }

        /// Distinct UUIDs yield distinct keys.
        #[test]
        fn prop_distinct_uuids_distinct_keys(a in uuid_strategy(), b in uuid_strategy()) {
            let key_a = CacheKey::from(&DocumentId::from(a));
            let key_b = CacheKey::from(&DocumentId::from(b));
            if a == b {
                prop_assert_eq!(key_a, key_b);
            } else {
                prop_assert_ne!(key_a, key_b);
            }
        }

        /// A UUID id and its string spelling land on the same key.
        #[test]
        fn prop_uuid_string_spelling_collides(uuid in uuid_strategy()) {
            let native = CacheKey::from(&DocumentId::from(uuid));
            let spelled = CacheKey::from(&DocumentId::parse(&uuid.hyphenated().to_string()));
            prop_assert_eq!(native, spelled);
        }

        /// Non-UUID strings pass through verbatim.
        #[test]
        fn prop_text_ids_verbatim(s in "[a-z]{1,12}-[0-9]{1,6}") {
            let key = CacheKey::from(&DocumentId::parse(&s));
            prop_assert_eq!(key.as_str(), s.as_str());
        }
    }
}
