/*!
The local filesystem backend: one `_meta.json` array per logical store,
one `_observations.json` array for every observation row, and content
blobs under `_data/` — all addressed through `object_store`'s
[object_store::local::LocalFileSystem], matching the on-disk layout
this workspace specifies.
*/

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::ObjectStore;
use tokio::sync::Mutex;

use crate::backend::{Backend, FilesystemConfig};
use crate::error::{CrateError, Result};
use crate::model::event::{Event, EventSink};
use crate::model::list_opts::ListOptions;
use crate::model::meta::SnapshotMeta;
use crate::observations::row::ObservationRow;
use crate::observations::storage_adapter::{default_query, ObservationsStorage};
use crate::store::object_store_data::ObjectStoreDataStore;
use crate::store::MetadataStore;

fn wrap_err(operation: &str, err: object_store::Error) -> CrateError {
    match err {
        object_store::Error::NotFound { path, .. } => CrateError::NotFound(path),
        other => CrateError::storage(operation, other),
    }
}

fn meta_path(store_id: &str) -> Path {
    Path::from(format!("{store_id}/_meta.json"))
}

const OBSERVATIONS_PATH: &str = "_observations.json";

/// [MetadataStore] backed by one JSON array file per store, written
/// under a mutex to serialize the read-modify-write cycle.
pub struct FilesystemMetadataStore {
    store: Arc<dyn ObjectStore>,
    lock: Mutex<()>,
    on_event: Option<EventSink>,
}

impl FilesystemMetadataStore {
    /// Build a metadata store over `store`, rooted wherever the caller
    /// configured it (see [crate::backend::filesystem::filesystem_backend]).
    pub fn new(store: Arc<dyn ObjectStore>, on_event: Option<EventSink>) -> Self {
        FilesystemMetadataStore {
            store,
            lock: Mutex::new(()),
            on_event,
        }
    }

    fn emit(&self, event: Event) {
        if let Some(sink) = &self.on_event {
            sink(event);
        }
    }

    async fn read_rows(&self, store_id: &str) -> Result<Vec<(String, SnapshotMeta)>> {
        match self.store.get(&meta_path(store_id)).await {
            Ok(result) => {
                let bytes = result.bytes().await.map_err(|e| wrap_err("meta_read", e))?;
                serde_json::from_slice(&bytes).map_err(|e| CrateError::storage("meta_decode", e))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(vec![]),
            Err(err) => Err(wrap_err("meta_read", err)),
        }
    }

    async fn write_rows(&self, store_id: &str, rows: &[(String, SnapshotMeta)]) -> Result<()> {
        let bytes = serde_json::to_vec(rows).map_err(|e| CrateError::storage("meta_encode", e))?;
        self.store
            .put(&meta_path(store_id), bytes.into())
            .await
            .map_err(|e| wrap_err("meta_write", e))?;
        Ok(())
    }

    /// Enumerate every `store_id` with a `_meta.json` file under this
    /// backend's root.
    async fn all_store_ids(&self) -> Result<Vec<String>> {
        let entries: Vec<_> = self
            .store
            .list(None)
            .await
            .map_err(|e| wrap_err("meta_list_stores", e))?
            .try_collect()
            .await
            .map_err(|e| wrap_err("meta_list_stores", e))?;
        Ok(entries
            .into_iter()
            .filter_map(|meta| meta.location.to_string().strip_suffix("/_meta.json").map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl MetadataStore for FilesystemMetadataStore {
    async fn get(&self, store_id: &str, version: &str) -> Result<SnapshotMeta> {
        let rows = self.read_rows(store_id).await?;
        let found = rows.iter().find(|(v, _)| v == version).map(|(_, m)| m.clone());
        tracing::debug!(store_id, version, found = found.is_some(), "filesystem metadata get");
        self.emit(Event::MetaGet {
            store_id: store_id.to_string(),
            version: Some(version.to_string()),
            found: found.is_some(),
        });
        found.ok_or_else(|| CrateError::NotFound(format!("{store_id}:{version}")))
    }

    async fn put(&self, meta: SnapshotMeta) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows(&meta.store_id).await?;
        rows.retain(|(v, _)| v != &meta.version);
        rows.push((meta.version.clone(), meta.clone()));
        self.write_rows(&meta.store_id, &rows).await?;
        tracing::debug!(store_id = %meta.store_id, version = %meta.version, "filesystem metadata put");
        self.emit(Event::MetaPut {
            store_id: meta.store_id,
            version: meta.version,
        });
        Ok(())
    }

    async fn delete(&self, store_id: &str, version: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows(store_id).await?;
        rows.retain(|(v, _)| v != version);
        self.write_rows(store_id, &rows).await?;
        tracing::debug!(store_id, version, "filesystem metadata delete");
        self.emit(Event::MetaDelete {
            store_id: store_id.to_string(),
            version: version.to_string(),
        });
        Ok(())
    }

    async fn list(&self, store_id: &str, opts: &ListOptions) -> Result<Vec<SnapshotMeta>> {
        let rows: Vec<SnapshotMeta> = self.read_rows(store_id).await?.into_iter().map(|(_, m)| m).collect();
        let predicates: Vec<crate::filter::Predicate<'_, SnapshotMeta>> = {
            let mut preds: Vec<crate::filter::Predicate<'_, SnapshotMeta>> = vec![];
            if let Some(before) = opts.before {
                preds.push(Box::new(move |m: &SnapshotMeta| m.created_at < before));
            }
            if let Some(after) = opts.after {
                preds.push(Box::new(move |m: &SnapshotMeta| m.created_at > after));
            }
            if !opts.tags.is_empty() {
                preds.push(Box::new(move |m: &SnapshotMeta| m.matches_tags(&opts.tags)));
            }
            preds
        };
        let result = crate::filter::filter_sort_limit(
            rows,
            &predicates,
            |a, b| b.created_at.cmp(&a.created_at).then(b.version.cmp(&a.version)),
            opts.limit,
        );
        tracing::debug!(store_id, count = result.len(), "filesystem metadata list");
        self.emit(Event::MetaList {
            store_id: store_id.to_string(),
            count: result.len(),
        });
        Ok(result)
    }

    async fn get_children(&self, parent_store_id: &str, parent_version: &str) -> Result<Vec<SnapshotMeta>> {
        let mut children = Vec::new();
        for store_id in self.all_store_ids().await? {
            let rows = self.read_rows(&store_id).await?;
            children.extend(
                rows.into_iter()
                    .map(|(_, m)| m)
                    .filter(|m| m.has_parent(parent_store_id, parent_version)),
            );
        }
        Ok(children)
    }

    async fn find_by_hash(&self, store_id: &str, content_hash: &str) -> Result<Option<SnapshotMeta>> {
        let rows = self.read_rows(store_id).await?;
        Ok(rows.into_iter().map(|(_, m)| m).find(|m| m.content_hash == content_hash))
    }
}

/// [ObservationsStorage] backed by a single JSON array file, written
/// under a mutex. Uses the default scan-and-filter `query` and
/// `delete_by_source` — the filesystem backend has no native query
/// engine to delegate to.
pub struct FilesystemObservationsStorage {
    store: Arc<dyn ObjectStore>,
    lock: Mutex<()>,
}

impl FilesystemObservationsStorage {
    /// Build observation storage over `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        FilesystemObservationsStorage {
            store,
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<ObservationRow>> {
        match self.store.get(&Path::from(OBSERVATIONS_PATH)).await {
            Ok(result) => {
                let bytes = result.bytes().await.map_err(|e| wrap_err("observations_read", e))?;
                serde_json::from_slice(&bytes).map_err(|e| CrateError::storage("observations_decode", e))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(vec![]),
            Err(err) => Err(wrap_err("observations_read", err)),
        }
    }

    async fn write_all(&self, rows: &[ObservationRow]) -> Result<()> {
        let bytes = serde_json::to_vec(rows).map_err(|e| CrateError::storage("observations_encode", e))?;
        self.store
            .put(&Path::from(OBSERVATIONS_PATH), bytes.into())
            .await
            .map_err(|e| wrap_err("observations_write", e))?;
        Ok(())
    }
}

#[async_trait]
impl ObservationsStorage for FilesystemObservationsStorage {
    async fn get_all(&self) -> Result<Vec<ObservationRow>> {
        self.read_all().await
    }

    async fn set_all(&self, rows: Vec<ObservationRow>) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_all(&rows).await
    }

    async fn get_one(&self, id: &str) -> Result<Option<ObservationRow>> {
        Ok(self.read_all().await?.into_iter().find(|r| r.id == id))
    }

    async fn add_one(&self, row: ObservationRow) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_all().await?;
        rows.push(row);
        self.write_all(&rows).await
    }

    async fn remove_one(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_all().await?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        let removed = rows.len() != before;
        self.write_all(&rows).await?;
        Ok(removed)
    }

    async fn query(&self, opts: &crate::model::list_opts::QueryOptions) -> Result<Vec<ObservationRow>> {
        Ok(default_query(self.read_all().await?, opts))
    }
}

/// Build a [Backend] rooted at `config.base_path`, with metadata,
/// observations, and data blobs all addressed through the same
/// [LocalFileSystem].
pub fn filesystem_backend(config: FilesystemConfig, on_event: Option<EventSink>) -> Result<Backend> {
    let fs = LocalFileSystem::new_with_prefix(&config.base_path)
        .map_err(|e| CrateError::InvalidConfig(format!("invalid base_path '{}': {e}", config.base_path)))?;
    let store: Arc<dyn ObjectStore> = Arc::new(fs);

    let data = ObjectStoreDataStore::new(store.clone(), "_data");
    let data = match &on_event {
        Some(sink) => data.with_event_sink(sink.clone()),
        None => data,
    };

    Ok(Backend {
        metadata: Arc::new(FilesystemMetadataStore::new(store.clone(), on_event.clone())),
        data: Arc::new(data),
        observations: Some(Arc::new(FilesystemObservationsStorage::new(store))),
        on_event,
    })
}
