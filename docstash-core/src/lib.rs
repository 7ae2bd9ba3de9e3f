//! docstash Core - Data Types
//!
//! Pure data types shared by the docstash caching layer. This crate contains
//! the document identity model, the operation input types (queries, changes,
//! options), the defaults-merging machinery, cache lifecycle events, and the
//! error taxonomy. No caching or storage logic lives here.

pub mod defaults;
pub mod document;
pub mod error;
pub mod event;
pub mod id;
pub mod key;
pub mod query;

pub use defaults::Defaults;
pub use document::Document;
pub use error::{StashError, StashResult, StorageError};
pub use event::CacheEvent;
pub use id::DocumentId;
pub use key::CacheKey;
pub use query::{Changes, InsertOptions, Projection, Query, UpdateOptions};
