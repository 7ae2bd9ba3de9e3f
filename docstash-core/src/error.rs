//! Error types for stash operations.

use std::fmt;

use thiserror::Error;

/// Collection adapter errors.
///
/// Adapter failures propagate to the caller unchanged; the stash never
/// swallows a store failure. Cache evictions performed before a failing
/// store call remain in place, which is safe because eviction never creates
/// staleness.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("write failed: {reason}")]
    WriteFailed { reason: String },

    #[error("storage backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Master error type for stash operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StashError {
    /// The caller requested a flag the coordinator cannot honor. Detected
    /// synchronously, before any side effect is performed.
    #[error("option {option} is not supported by {operation}")]
    UnsupportedOption {
        operation: &'static str,
        option: &'static str,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A document failed to round-trip through serialization during the
    /// defaults merge.
    #[error("document codec error: {reason}")]
    Codec { reason: String },
}

impl StashError {
    /// Wrap a serialization failure.
    pub fn codec(err: impl fmt::Display) -> Self {
        Self::Codec {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for stash operations.
pub type StashResult<T> = Result<T, StashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_option_display() {
        let err = StashError::UnsupportedOption {
            operation: "insert_one",
            option: "return_original",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("return_original"));
        assert!(msg.contains("insert_one"));
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::WriteFailed {
            reason: "disk full".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("write failed"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_stash_error_from_storage() {
        let err = StashError::from(StorageError::Unavailable {
            reason: "connection refused".to_string(),
        });
        assert!(matches!(err, StashError::Storage(_)));
        assert!(format!("{}", err).contains("connection refused"));
    }

    #[test]
    fn test_codec_error_wraps_reason() {
        let err = StashError::codec("missing field `id`");
        assert!(format!("{}", err).contains("missing field `id`"));
    }
}
