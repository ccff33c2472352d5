/*!
The layered (composite) backend: read-fallback across an ordered `read`
list, write-fanout across an ordered `write` list. Neither list needs
to be the other — a cache-in-front-of-durable-store topology reads from
both but writes only to the durable one; a fanout-replicate topology
writes to many but reads from the first.

This backend does not emit its own [crate::model::event::Event]s: the
constituent backends it wraps were already constructed with whatever
event sink they need, so re-emitting here would double-count every
operation.
*/

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::{Backend, ListStrategy};
use crate::error::{CrateError, Result};
use crate::model::list_opts::ListOptions;
use crate::model::meta::SnapshotMeta;
use crate::observations::row::ObservationRow;
use crate::observations::storage_adapter::ObservationsStorage;
use crate::store::data::{DataHandle, DataInput};
use crate::store::{DataStore, MetadataStore};

/// [MetadataStore] combining read-fallback and write-fanout over
/// ordered backend lists.
pub struct LayeredMetadataStore {
    read: Vec<Arc<Backend>>,
    write: Vec<Arc<Backend>>,
    list_strategy: ListStrategy,
}

#[async_trait]
impl MetadataStore for LayeredMetadataStore {
    async fn get(&self, store_id: &str, version: &str) -> Result<SnapshotMeta> {
        for (idx, backend) in self.read.iter().enumerate() {
            match backend.metadata.get(store_id, version).await {
                Ok(meta) => {
                    tracing::debug!(store_id, version, layer = idx, "layered metadata get satisfied");
                    return Ok(meta);
                }
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        tracing::debug!(store_id, version, "layered metadata get exhausted all read layers");
        Err(CrateError::NotFound(format!("{store_id}:{version}")))
    }

    async fn put(&self, meta: SnapshotMeta) -> Result<()> {
        tracing::debug!(store_id = %meta.store_id, version = %meta.version, layers = self.write.len(), "layered metadata write fanout");
        for backend in &self.write {
            backend.metadata.put(meta.clone()).await?;
        }
        Ok(())
    }

    async fn delete(&self, store_id: &str, version: &str) -> Result<()> {
        for backend in &self.write {
            match backend.metadata.delete(store_id, version).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    async fn list(&self, store_id: &str, opts: &ListOptions) -> Result<Vec<SnapshotMeta>> {
        tracing::debug!(store_id, strategy = ?self.list_strategy, "layered metadata list");
        match self.list_strategy {
            ListStrategy::First => match self.read.first() {
                Some(backend) => backend.metadata.list(store_id, opts).await,
                None => Ok(vec![]),
            },
            ListStrategy::Merge => {
                let unlimited = ListOptions {
                    limit: None,
                    ..opts.clone()
                };
                let mut merged = Vec::new();
                let mut seen = HashSet::new();
                for backend in &self.read {
                    for meta in backend.metadata.list(store_id, &unlimited).await? {
                        if seen.insert(meta.version.clone()) {
                            merged.push(meta);
                        }
                    }
                }
                merged.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.version.cmp(&a.version)));
                if let Some(limit) = opts.limit {
                    merged.truncate(limit);
                }
                Ok(merged)
            }
        }
    }

    async fn get_latest(&self, store_id: &str) -> Result<SnapshotMeta> {
        let mut best: Option<SnapshotMeta> = None;
        for backend in &self.read {
            match backend.metadata.get_latest(store_id).await {
                Ok(meta) => {
                    if best.as_ref().map(|b| meta.created_at > b.created_at).unwrap_or(true) {
                        best = Some(meta);
                    }
                }
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        best.ok_or_else(|| CrateError::NotFound(store_id.to_string()))
    }

    async fn get_children(&self, parent_store_id: &str, parent_version: &str) -> Result<Vec<SnapshotMeta>> {
        let mut merged = Vec::new();
        let mut seen = HashSet::new();
        for backend in &self.read {
            for meta in backend.metadata.get_children(parent_store_id, parent_version).await? {
                if seen.insert((meta.store_id.clone(), meta.version.clone())) {
                    merged.push(meta);
                }
            }
        }
        Ok(merged)
    }

    async fn find_by_hash(&self, store_id: &str, content_hash: &str) -> Result<Option<SnapshotMeta>> {
        for backend in &self.read {
            if let Some(meta) = backend.metadata.find_by_hash(store_id, content_hash).await? {
                return Ok(Some(meta));
            }
        }
        Ok(None)
    }
}

/// [DataStore] combining read-fallback and write-fanout. Fanning a
/// stream out to more than one write backend buffers it to bytes first
/// (streams are single-consumer); a single write backend receives the
/// input unbuffered.
pub struct LayeredDataStore {
    read: Vec<Arc<Backend>>,
    write: Vec<Arc<Backend>>,
}

#[async_trait]
impl DataStore for LayeredDataStore {
    async fn get(&self, data_key: &str) -> Result<DataHandle> {
        for (idx, backend) in self.read.iter().enumerate() {
            match backend.data.get(data_key).await {
                Ok(handle) => {
                    tracing::debug!(data_key, layer = idx, "layered data get satisfied");
                    return Ok(handle);
                }
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(CrateError::NotFound(data_key.to_string()))
    }

    async fn put(&self, data_key: &str, input: DataInput) -> Result<()> {
        tracing::debug!(data_key, layers = self.write.len(), "layered data write fanout");
        match self.write.len() {
            0 => Ok(()),
            1 => self.write[0].data.put(data_key, input).await,
            _ => {
                let bytes = input.into_bytes().await?;
                for backend in &self.write {
                    backend.data.put(data_key, DataInput::Bytes(bytes.clone())).await?;
                }
                Ok(())
            }
        }
    }

    async fn delete(&self, data_key: &str) -> Result<()> {
        for backend in &self.write {
            match backend.data.delete(data_key).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    async fn exists(&self, data_key: &str) -> Result<bool> {
        for backend in &self.read {
            if backend.data.exists(data_key).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// [ObservationsStorage] fan-out/read-fallback counterpart: writes go to
/// every write layer that has observations; reads come from the first
/// read layer that has them.
pub struct LayeredObservationsStorage {
    read: Vec<Arc<dyn ObservationsStorage>>,
    write: Vec<Arc<dyn ObservationsStorage>>,
}

#[async_trait]
impl ObservationsStorage for LayeredObservationsStorage {
    async fn get_all(&self) -> Result<Vec<ObservationRow>> {
        match self.read.first() {
            Some(adapter) => adapter.get_all().await,
            None => Ok(vec![]),
        }
    }

    async fn set_all(&self, rows: Vec<ObservationRow>) -> Result<()> {
        for adapter in &self.write {
            adapter.set_all(rows.clone()).await?;
        }
        Ok(())
    }

    async fn get_one(&self, id: &str) -> Result<Option<ObservationRow>> {
        for adapter in &self.read {
            if let Some(row) = adapter.get_one(id).await? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    async fn add_one(&self, row: ObservationRow) -> Result<()> {
        for adapter in &self.write {
            adapter.add_one(row.clone()).await?;
        }
        Ok(())
    }

    async fn remove_one(&self, id: &str) -> Result<bool> {
        let mut removed_any = false;
        for adapter in &self.write {
            if adapter.remove_one(id).await? {
                removed_any = true;
            }
        }
        Ok(removed_any)
    }

    async fn query(&self, opts: &crate::model::list_opts::QueryOptions) -> Result<Vec<ObservationRow>> {
        match self.read.first() {
            Some(adapter) => adapter.query(opts).await,
            None => Ok(vec![]),
        }
    }

    async fn delete_by_source(&self, store_id: &str, version: &str, path: Option<&str>) -> Result<usize> {
        let mut total = 0;
        for adapter in &self.write {
            total += adapter.delete_by_source(store_id, version, path).await?;
        }
        Ok(total)
    }
}

/// Build a layered [Backend] from a validated [crate::backend::LayeredConfig].
pub fn layered_backend(config: crate::backend::LayeredConfig) -> Backend {
    let read_observations: Vec<Arc<dyn ObservationsStorage>> =
        config.read.iter().filter_map(|b| b.observations.clone()).collect();
    let write_observations: Vec<Arc<dyn ObservationsStorage>> =
        config.write.iter().filter_map(|b| b.observations.clone()).collect();
    let observations = if read_observations.is_empty() && write_observations.is_empty() {
        None
    } else {
        Some(Arc::new(LayeredObservationsStorage {
            read: read_observations,
            write: write_observations,
        }) as Arc<dyn ObservationsStorage>)
    };

    Backend {
        metadata: Arc::new(LayeredMetadataStore {
            read: config.read.clone(),
            write: config.write.clone(),
            list_strategy: config.list_strategy,
        }),
        data: Arc::new(LayeredDataStore {
            read: config.read,
            write: config.write,
        }),
        observations,
        on_event: None,
    }
}
