//! Cache lifecycle events.
//!
//! Every cache mutation emits a typed event. Observers subscribe for
//! metrics or telemetry; events carry the cache key and nothing else.

use crate::key::CacheKey;

/// A cache lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// An entry was stored or refreshed.
    Set(CacheKey),
    /// An entry was removed, expired, or evicted. Emitted whether or not the
    /// key was present (deletion is idempotent).
    Del(CacheKey),
    /// The whole cache was cleared.
    Reset,
}

impl CacheEvent {
    /// Stable event name, used for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Set(_) => "cache.set",
            Self::Del(_) => "cache.del",
            Self::Reset => "cache.reset",
        }
    }

    /// The key this event refers to, if any.
    pub fn key(&self) -> Option<&CacheKey> {
        match self {
            Self::Set(key) | Self::Del(key) => Some(key),
            Self::Reset => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DocumentId;

    #[test]
    fn test_event_kinds() {
        let key = CacheKey::from(&DocumentId::generate());
        assert_eq!(CacheEvent::Set(key.clone()).kind(), "cache.set");
        assert_eq!(CacheEvent::Del(key).kind(), "cache.del");
        assert_eq!(CacheEvent::Reset.kind(), "cache.reset");
    }

    #[test]
    fn test_reset_has_no_key() {
        assert!(CacheEvent::Reset.key().is_none());
    }
}
