/*!
[SnapshotEngine] orchestrates a single logical store: encode, hash,
deduplicate against existing content, write the blob if new, then write
metadata. This is the one place that assigns versions and decides
whether a write is a duplicate; individual [MetadataStore]/[DataStore]
implementations never see the word "deduplicated".
*/

use std::sync::Arc;

use chrono::Utc;

use crate::codec::Codec;
use crate::error::{CrateError, Result};
use crate::model::event::{Event, EventSink};
use crate::model::list_opts::ListOptions;
use crate::model::meta::{PutOptions, Snapshot, SnapshotMeta};
use crate::store::data::{DataHandle, DataInput};
use crate::store::{DataStore, MetadataStore};
use crate::version::next_version;

/// Derives the physical `data_key` for a new, non-deduplicated write.
pub type DataKeyPolicy = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

fn default_data_key_policy() -> DataKeyPolicy {
    Arc::new(|store_id: &str, content_hash: &str| format!("{store_id}/{content_hash}"))
}

/// Orchestrates `put`/`get`/`list`/`delete` for one logical store over a
/// [MetadataStore] + [DataStore] pair and a single [Codec].
pub struct SnapshotEngine<T> {
    store_id: String,
    codec: Arc<dyn Codec<T>>,
    metadata: Arc<dyn MetadataStore>,
    data: Arc<dyn DataStore>,
    data_key_policy: DataKeyPolicy,
    on_event: Option<EventSink>,
}

impl<T> SnapshotEngine<T> {
    /// Build an engine for `store_id` over the given codec and stores,
    /// with the default `"{store_id}/{content_hash}"` data key policy.
    pub fn new(
        store_id: impl Into<String>,
        codec: Arc<dyn Codec<T>>,
        metadata: Arc<dyn MetadataStore>,
        data: Arc<dyn DataStore>,
    ) -> Self {
        SnapshotEngine {
            store_id: store_id.into(),
            codec,
            metadata,
            data,
            data_key_policy: default_data_key_policy(),
            on_event: None,
        }
    }

    /// Override how data keys are derived for non-deduplicated writes.
    pub fn with_data_key_policy(mut self, policy: DataKeyPolicy) -> Self {
        self.data_key_policy = policy;
        self
    }

    /// Attach an event sink invoked at every decision point below.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.on_event = Some(sink);
        self
    }

    fn emit(&self, event: Event) {
        if let Some(sink) = &self.on_event {
            sink(event);
        }
    }

    fn emit_error(&self, operation: &str, err: &CrateError) {
        tracing::warn!(store_id = %self.store_id, operation, kind = err.kind(), %err, "snapshot engine operation failed");
        self.emit(Event::Error {
            operation: operation.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    /// Encode, hash, deduplicate, and persist `data`, returning the new
    /// metadata. See the module docs for the decision order.
    pub async fn put(&self, data: &T, opts: PutOptions) -> Result<SnapshotMeta> {
        let version = next_version();

        let bytes = match self.codec.encode(data) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.emit_error("encode", &err);
                return Err(err);
            }
        };
        let content_hash = crate::hash::hash(&bytes);
        let size_bytes = bytes.len() as u64;

        let existing = self
            .metadata
            .find_by_hash(&self.store_id, &content_hash)
            .await
            .map_err(|err| {
                self.emit_error("meta_find_by_hash", &err);
                err
            })?;
        let deduplicated = existing.is_some();
        let data_key = match &existing {
            Some(meta) => meta.data_key.clone(),
            None => (self.data_key_policy)(&self.store_id, &content_hash),
        };

        if !deduplicated {
            if let Err(err) = self.data.put(&data_key, DataInput::Bytes(bytes.into())).await {
                self.emit_error("data_put", &err);
                return Err(err);
            }
        }
        tracing::debug!(store_id = %self.store_id, %data_key, deduplicated, "data blob written");
        self.emit(Event::DataPut {
            data_key: data_key.clone(),
            deduplicated,
        });

        let meta = SnapshotMeta {
            store_id: self.store_id.clone(),
            version: version.clone(),
            content_hash: content_hash.clone(),
            content_type: self.codec.content_type().to_string(),
            size_bytes,
            data_key,
            created_at: Utc::now(),
            invoked_at: opts.invoked_at,
            parents: opts.parents,
            tags: opts.tags,
        };

        if let Err(err) = self.metadata.put(meta.clone()).await {
            self.emit_error("meta_put", &err);
            return Err(err);
        }

        tracing::info!(store_id = %self.store_id, %version, deduplicated, "snapshot put");
        self.emit(Event::SnapshotPut {
            store_id: self.store_id.clone(),
            version,
            content_hash,
            deduplicated,
        });
        Ok(meta)
    }

    /// Fetch and decode one version.
    pub async fn get(&self, version: &str) -> Result<Snapshot<T>> {
        let meta = match self.metadata.get(&self.store_id, version).await {
            Ok(meta) => meta,
            Err(err) => {
                self.emit(Event::SnapshotGet {
                    store_id: self.store_id.clone(),
                    version: version.to_string(),
                    found: false,
                });
                if !err.is_not_found() {
                    self.emit_error("snapshot_get", &err);
                }
                return Err(err);
            }
        };
        self.load(meta).await
    }

    /// Fetch and decode the most recent version.
    pub async fn get_latest(&self) -> Result<Snapshot<T>> {
        let meta = self.metadata.get_latest(&self.store_id).await.map_err(|err| {
            self.emit(Event::SnapshotGet {
                store_id: self.store_id.clone(),
                version: String::new(),
                found: false,
            });
            if !err.is_not_found() {
                self.emit_error("snapshot_get", &err);
            }
            err
        })?;
        self.load(meta).await
    }

    async fn load(&self, meta: SnapshotMeta) -> Result<Snapshot<T>> {
        let handle = match self.data.get(&meta.data_key).await {
            Ok(handle) => handle,
            Err(err) => {
                self.emit(Event::SnapshotGet {
                    store_id: self.store_id.clone(),
                    version: meta.version.clone(),
                    found: false,
                });
                self.emit_error("snapshot_get", &err);
                return Err(err);
            }
        };
        let bytes = handle.into_bytes().await?;
        let data = match self.codec.decode(&bytes) {
            Ok(data) => data,
            Err(err) => {
                self.emit(Event::SnapshotGet {
                    store_id: self.store_id.clone(),
                    version: meta.version.clone(),
                    found: false,
                });
                self.emit_error("snapshot_get", &err);
                return Err(err);
            }
        };
        tracing::debug!(store_id = %self.store_id, version = %meta.version, "snapshot read");
        self.emit(Event::SnapshotGet {
            store_id: self.store_id.clone(),
            version: meta.version.clone(),
            found: true,
        });
        Ok(Snapshot { meta, data })
    }

    /// Fetch metadata for one version without reading the data blob.
    pub async fn get_meta(&self, version: &str) -> Result<SnapshotMeta> {
        self.metadata.get(&self.store_id, version).await
    }

    /// List metadata for this store, filtered and ordered per `opts`.
    pub async fn list(&self, opts: &ListOptions) -> Result<Vec<SnapshotMeta>> {
        self.metadata.list(&self.store_id, opts).await
    }

    /// Delete the metadata for one version. The underlying data blob is
    /// untouched: it may be referenced by other versions sharing the
    /// same content hash, and this crate never garbage-collects blobs.
    pub async fn delete(&self, version: &str) -> Result<()> {
        tracing::debug!(store_id = %self.store_id, version, "snapshot metadata deleted");
        self.metadata.delete(&self.store_id, version).await
    }

    /// Provide a raw, undecoded handle to a version's blob, bypassing
    /// the codec. Useful for proxying bytes without a round-trip decode.
    pub async fn get_raw(&self, version: &str) -> Result<DataHandle> {
        let meta = self.metadata.get(&self.store_id, version).await?;
        self.data.get(&meta.data_key).await
    }
}
