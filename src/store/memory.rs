//! In-process document store with optional JSON snapshot persistence.

use super::query::{Document, Filter, FindOptions, ID_FIELD};
use super::{DocumentStore, Operation, StoreError, StoreResult};
use crate::metrics::METRICS;
use crate::model::RecordId;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

type Collection = IndexMap<RecordId, Document>;

/// Collections held in memory, keyed by id in insertion order.
///
/// With a snapshot path every mutation rewrites the snapshot file through a
/// temp file and an atomic rename.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    snapshot_path: Option<PathBuf>,
    persist_lock: Mutex<()>,
    closed: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            snapshot_path: None,
            persist_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Opens a store persisted at `path`, loading the snapshot if one exists.
    pub async fn open(path: PathBuf) -> StoreResult<Self> {
        let load_path = path.clone();
        let collections = tokio::task::spawn_blocking(move || load_snapshot(&load_path))
            .await
            .map_err(|e| StoreError::Background(e.to_string()))??;

        let documents: usize = collections.values().map(IndexMap::len).sum();
        debug!(path = %path.display(), documents, "snapshot loaded");

        Ok(Self {
            collections: RwLock::new(collections),
            snapshot_path: Some(path),
            persist_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    async fn persist(&self) -> StoreResult<()> {
        let Some(path) = self.snapshot_path.clone() else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        let bytes = encode_snapshot(&self.collections.read())?;
        spawn_write(path, bytes).await
    }

    /// Applies `change` to a copy of the collections, writes that copy, and
    /// only then makes it visible. `None` from `change` means nothing changed.
    ///
    /// Mutations are serialized on `persist_lock`; a failed write leaves the
    /// in-memory state as it was.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut HashMap<String, Collection>) -> Option<T>,
    ) -> StoreResult<Option<T>> {
        let Some(path) = self.snapshot_path.clone() else {
            return Ok(change(&mut *self.collections.write()));
        };
        let _guard = self.persist_lock.lock().await;
        let mut next = self.collections.read().clone();
        let Some(outcome) = change(&mut next) else {
            return Ok(None);
        };
        let bytes = encode_snapshot(&next)?;
        spawn_write(path, bytes).await?;
        *self.collections.write() = next;
        Ok(Some(outcome))
    }
}

async fn spawn_write(path: PathBuf, bytes: Vec<u8>) -> StoreResult<()> {
    tokio::task::spawn_blocking(move || write_snapshot(&path, &bytes))
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
}

fn observe<T>(collection: &str, operation: Operation, result: &StoreResult<T>) {
    METRICS.record_store_operation(collection, operation, result.is_ok());
    match result {
        Ok(_) => debug!(collection, operation = %operation, "store operation"),
        Err(error) => debug!(collection, operation = %operation, %error, "store operation failed"),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        if self.snapshot_path.is_some() {
            "file"
        } else {
            "memory"
        }
    }

    async fn insert(&self, collection: &str, mut document: Document) -> StoreResult<RecordId> {
        let result = async {
            self.ensure_open()?;
            let id = RecordId::generate();
            document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            self.commit(|collections| {
                collections
                    .entry(collection.to_string())
                    .or_default()
                    .insert(id, document);
                Some(())
            })
            .await?;
            Ok::<_, StoreError>(id)
        }
        .await;
        observe(collection, Operation::Insert, &result);
        result
    }

    async fn find_by_id(&self, collection: &str, id: RecordId) -> StoreResult<Option<Document>> {
        let result = self.ensure_open().map(|()| {
            self.collections
                .read()
                .get(collection)
                .and_then(|docs| docs.get(&id))
                .cloned()
        });
        observe(collection, Operation::FindById, &result);
        result
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let result = self.ensure_open().map(|()| {
            let collections = self.collections.read();
            let mut matched: Vec<&Document> = collections
                .get(collection)
                .map(|docs| docs.values().filter(|doc| filter.matches(doc)).collect())
                .unwrap_or_default();
            if let Some(sort) = &options.sort {
                matched.sort_by(|a, b| sort.compare(a, b));
            }
            matched
                .into_iter()
                .map(|doc| match &options.projection {
                    Some(projection) => projection.apply(doc),
                    None => doc.clone(),
                })
                .collect()
        });
        observe(collection, Operation::Find, &result);
        result
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let result = self.ensure_open().map(|()| {
            self.collections
                .read()
                .get(collection)
                .map(|docs| docs.values().filter(|doc| filter.matches(doc)).count() as u64)
                .unwrap_or(0)
        });
        observe(collection, Operation::Count, &result);
        result
    }

    async fn replace(
        &self,
        collection: &str,
        id: RecordId,
        mut document: Document,
    ) -> StoreResult<bool> {
        let result = async {
            self.ensure_open()?;
            document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            let replaced = self
                .commit(|collections| {
                    let slot = collections.get_mut(collection)?.get_mut(&id)?;
                    *slot = document;
                    Some(())
                })
                .await?;
            Ok::<_, StoreError>(replaced.is_some())
        }
        .await;
        observe(collection, Operation::Replace, &result);
        result
    }

    async fn delete(&self, collection: &str, id: RecordId) -> StoreResult<bool> {
        let result = async {
            self.ensure_open()?;
            let removed = self
                .commit(|collections| collections.get_mut(collection)?.shift_remove(&id))
                .await?;
            Ok::<_, StoreError>(removed.is_some())
        }
        .await;
        observe(collection, Operation::Delete, &result);
        result
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    async fn close(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        self.persist().await?;
        self.closed.store(true, Ordering::Release);
        tracing::info!(backend = self.backend(), "document store closed");
        Ok(())
    }
}

fn encode_snapshot(collections: &HashMap<String, Collection>) -> StoreResult<Vec<u8>> {
    let ordered: BTreeMap<&str, Vec<&Document>> = collections
        .iter()
        .map(|(name, docs)| (name.as_str(), docs.values().collect()))
        .collect();
    Ok(serde_json::to_vec_pretty(&ordered)?)
}

fn load_snapshot(path: &Path) -> StoreResult<HashMap<String, Collection>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }
    let raw: BTreeMap<String, Vec<Document>> = serde_json::from_slice(&bytes)?;

    let mut collections = HashMap::with_capacity(raw.len());
    for (name, documents) in raw {
        let mut collection = Collection::with_capacity(documents.len());
        for document in documents {
            let id = document
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .and_then(|raw| RecordId::parse(raw).ok())
                .ok_or_else(|| StoreError::Corrupt {
                    collection: name.clone(),
                    reason: format!("document without a valid {ID_FIELD}"),
                })?;
            collection.insert(id, document);
        }
        collections.insert(name, collection);
    }
    Ok(collections)
}

fn write_snapshot(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let io_error = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_error)?;
    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
