//! Document store client.
//!
//! Handlers never talk to a concrete backend; they go through the
//! [`DocumentStore`] trait so the catalog works against any collection-style
//! store. [`MemoryStore`] is the bundled backend, optionally persisted to a
//! JSON snapshot file.

pub mod memory;
pub mod query;

pub use memory::MemoryStore;
pub use query::{Document, Filter, FindOptions, ID_FIELD, Projection, SortDirection, SortSpec};

use crate::model::RecordId;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use strum::{AsRefStr, Display};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection is closed")]
    Closed,

    #[error("invalid store target '{0}'")]
    InvalidTarget(String),

    #[error("i/o failure on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("corrupt document in '{collection}': {reason}")]
    Corrupt { collection: String, reason: String },

    #[error("background task failed: {0}")]
    Background(String),
}

/// Operation names used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Insert,
    FindById,
    Find,
    Count,
    Replace,
    Delete,
}

/// Collection-style persistent store.
///
/// Single-document writes are atomic; there are no multi-document
/// transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name reported by readiness checks.
    fn backend(&self) -> &'static str;

    /// Stores `document` under a freshly assigned id. Any `_id` in the input is discarded.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<RecordId>;

    async fn find_by_id(&self, collection: &str, id: RecordId) -> StoreResult<Option<Document>>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Full replace keeping identity. Returns `false` when nothing matched.
    async fn replace(&self, collection: &str, id: RecordId, document: Document)
    -> StoreResult<bool>;

    /// Returns `false` when nothing matched.
    async fn delete(&self, collection: &str, id: RecordId) -> StoreResult<bool>;

    async fn ping(&self) -> StoreResult<()>;

    /// Flushes and releases the connection. Later operations fail with [`StoreError::Closed`].
    async fn close(&self) -> StoreResult<()>;
}

/// Opens a store from a connection target.
///
/// `memory` and `memory://` give a volatile store; `file://<path>` or a bare
/// path give a store persisted to that JSON file.
pub async fn connect(target: &str) -> StoreResult<Arc<dyn DocumentStore>> {
    let target = target.trim();
    match target {
        "" => Err(StoreError::InvalidTarget(target.to_string())),
        "memory" | "memory://" => {
            tracing::info!(backend = "memory", "opening volatile document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        _ => {
            let path = target.strip_prefix("file://").unwrap_or(target);
            if path.is_empty() {
                return Err(StoreError::InvalidTarget(target.to_string()));
            }
            tracing::info!(backend = "file", path, "opening persisted document store");
            let store = MemoryStore::open(PathBuf::from(path)).await?;
            Ok(Arc::new(store))
        }
    }
}
