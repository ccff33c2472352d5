/*!
[ObjectStoreDataStore] realizes [DataStore] over `object_store`'s
[object_store::ObjectStore], the abstraction `iceberg-rs` already
depends on for its table file I/O. The same wrapper backs the
in-memory, filesystem, and embedded-SQL backends — only the concrete
`ObjectStore` implementation (and key prefix) differs.

`get` mirrors `GetResult`'s own split: a `File` result (the filesystem
backend) is read fully into memory, the same way `iceberg-rs` reads
table files; a `Stream` result (the in-memory and any cloud-backed
store) is preserved as a [DataHandle::Stream] instead of being
buffered eagerly.
*/

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::path::Path;
use object_store::{GetResult, ObjectStore};

use crate::error::{CrateError, Result};
use crate::model::event::{Event, EventSink};
use crate::store::data::{DataHandle, DataInput, DataStore};

/// Turns an opaque `data_key` into a `Path` under this store's prefix,
/// replacing `/` with `_` so nested logical keys never imply directory
/// structure on disk (matches the filesystem backend's on-disk layout).
fn key_to_path(prefix: &str, data_key: &str) -> Path {
    let escaped = data_key.replace('/', "_");
    Path::from(format!("{prefix}/{escaped}.bin"))
}

fn wrap_err(operation: &str, err: object_store::Error) -> CrateError {
    match err {
        object_store::Error::NotFound { path, .. } => CrateError::NotFound(path),
        other => CrateError::storage(operation, other),
    }
}

/// A [DataStore] over any `object_store::ObjectStore`, keying blobs as
/// `<prefix>/<escaped_data_key>.bin`.
pub struct ObjectStoreDataStore {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    on_event: Option<EventSink>,
}

impl ObjectStoreDataStore {
    /// Wrap `store`, placing blobs under `prefix` (commonly `"_data"`).
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        ObjectStoreDataStore {
            store,
            prefix: prefix.into(),
            on_event: None,
        }
    }

    /// Attach an event sink, emitting `data_get`/`data_put`/`data_delete`.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.on_event = Some(sink);
        self
    }

    fn emit(&self, event: Event) {
        if let Some(sink) = &self.on_event {
            sink(event);
        }
    }
}

#[async_trait]
impl DataStore for ObjectStoreDataStore {
    async fn get(&self, data_key: &str) -> Result<DataHandle> {
        let path = key_to_path(&self.prefix, data_key);
        let result = self.store.get(&path).await;
        self.emit(Event::DataGet {
            data_key: data_key.to_string(),
            found: result.is_ok(),
        });
        let result: GetResult = result.map_err(|e| wrap_err("data_get", e))?;
        match result {
            GetResult::Stream(stream) => {
                tracing::debug!(data_key, "data read as stream");
                let mapped = stream.map(|item| item.map_err(|e| wrap_err("data_get", e))).boxed();
                Ok(DataHandle::from_stream(mapped))
            }
            file @ GetResult::File(..) => {
                tracing::debug!(data_key, "data read as file, buffering");
                let bytes = file.bytes().await.map_err(|e| wrap_err("data_get", e))?;
                Ok(DataHandle::from_bytes(bytes))
            }
        }
    }

    async fn put(&self, data_key: &str, input: DataInput) -> Result<()> {
        let path = key_to_path(&self.prefix, data_key);
        let bytes: Bytes = input.into_bytes().await?;
        self.store
            .put(&path, bytes)
            .await
            .map_err(|e| wrap_err("data_put", e))?;
        tracing::debug!(data_key, prefix = %self.prefix, "data blob written to object store");
        self.emit(Event::DataPut {
            data_key: data_key.to_string(),
            deduplicated: false,
        });
        Ok(())
    }

    async fn delete(&self, data_key: &str) -> Result<()> {
        let path = key_to_path(&self.prefix, data_key);
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(data_key, "data blob deleted from object store");
                self.emit(Event::DataDelete {
                    data_key: data_key.to_string(),
                });
                Ok(())
            }
            Err(err) => Err(wrap_err("data_delete", err)),
        }
    }

    async fn exists(&self, data_key: &str) -> Result<bool> {
        let path = key_to_path(&self.prefix, data_key);
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(wrap_err("data_exists", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn store() -> ObjectStoreDataStore {
        ObjectStoreDataStore::new(Arc::new(InMemory::new()), "_data")
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let store = store();
        store.put("k1", DataInput::Bytes(Bytes::from_static(b"hello"))).await.unwrap();
        let handle = store.get("k1").await.unwrap();
        assert_eq!(handle.into_bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = store();
        let err = store.get("nope").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store();
        store.put("k1", DataInput::Bytes(Bytes::from_static(b"x"))).await.unwrap();
        store.delete("k1").await.unwrap();
        store.delete("k1").await.unwrap();
        assert!(!store.exists("k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_slash_in_key_is_escaped_not_nested() {
        let store = store();
        store.put("a/b", DataInput::Bytes(Bytes::from_static(b"v"))).await.unwrap();
        assert!(store.exists("a/b").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_preserves_stream_variant_over_in_memory_store() {
        let store = store();
        store.put("k1", DataInput::Bytes(Bytes::from_static(b"hello"))).await.unwrap();
        let handle = store.get("k1").await.unwrap();
        assert!(matches!(handle, DataHandle::Stream(_)));
        assert_eq!(handle.into_bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }
}
