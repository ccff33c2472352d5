/*!
The in-memory backend: two associative containers (metadata, data) plus
an observations table, none of it persisted across process restarts.
Useful for tests and as the reference implementation other backends are
checked against.
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use object_store::memory::InMemory;

use crate::backend::Backend;
use crate::error::{CrateError, Result};
use crate::model::event::{Event, EventSink};
use crate::model::list_opts::ListOptions;
use crate::model::meta::SnapshotMeta;
use crate::observations::storage_adapter::MemoryObservationsStorage;
use crate::store::object_store_data::ObjectStoreDataStore;
use crate::store::MetadataStore;

/// [MetadataStore] over a mutex-guarded hash map.
#[derive(Default)]
pub struct MemoryMetadataStore {
    rows: Mutex<HashMap<(String, String), SnapshotMeta>>,
    on_event: Option<EventSink>,
}

impl MemoryMetadataStore {
    /// Build an empty store, optionally wired to an event sink.
    pub fn new(on_event: Option<EventSink>) -> Self {
        MemoryMetadataStore {
            rows: Mutex::new(HashMap::new()),
            on_event,
        }
    }

    fn emit(&self, event: Event) {
        if let Some(sink) = &self.on_event {
            sink(event);
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, store_id: &str, version: &str) -> Result<SnapshotMeta> {
        let found = self
            .rows
            .lock()
            .unwrap()
            .get(&(store_id.to_string(), version.to_string()))
            .cloned();
        tracing::debug!(store_id, version, found = found.is_some(), "memory metadata get");
        self.emit(Event::MetaGet {
            store_id: store_id.to_string(),
            version: Some(version.to_string()),
            found: found.is_some(),
        });
        found.ok_or_else(|| CrateError::NotFound(format!("{store_id}:{version}")))
    }

    async fn put(&self, meta: SnapshotMeta) -> Result<()> {
        tracing::debug!(store_id = %meta.store_id, version = %meta.version, "memory metadata put");
        self.emit(Event::MetaPut {
            store_id: meta.store_id.clone(),
            version: meta.version.clone(),
        });
        self.rows
            .lock()
            .unwrap()
            .insert((meta.store_id.clone(), meta.version.clone()), meta);
        Ok(())
    }

    async fn delete(&self, store_id: &str, version: &str) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(&(store_id.to_string(), version.to_string()));
        tracing::debug!(store_id, version, "memory metadata delete");
        self.emit(Event::MetaDelete {
            store_id: store_id.to_string(),
            version: version.to_string(),
        });
        Ok(())
    }

    async fn list(&self, store_id: &str, opts: &ListOptions) -> Result<Vec<SnapshotMeta>> {
        let rows: Vec<SnapshotMeta> = self.rows.lock().unwrap().values().cloned().collect();
        let predicates: Vec<crate::filter::Predicate<'_, SnapshotMeta>> = {
            let mut preds: Vec<crate::filter::Predicate<'_, SnapshotMeta>> =
                vec![Box::new(move |m: &SnapshotMeta| m.store_id == store_id)];
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
        tracing::debug!(store_id, count = result.len(), "memory metadata list");
        self.emit(Event::MetaList {
            store_id: store_id.to_string(),
            count: result.len(),
        });
        Ok(result)
    }

    async fn get_children(&self, parent_store_id: &str, parent_version: &str) -> Result<Vec<SnapshotMeta>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.has_parent(parent_store_id, parent_version))
            .cloned()
            .collect())
    }

    async fn find_by_hash(&self, store_id: &str, content_hash: &str) -> Result<Option<SnapshotMeta>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|m| m.store_id == store_id && m.content_hash == content_hash)
            .cloned())
    }
}

/// Build a fully in-memory [Backend]: metadata in a hash map, data over
/// `object_store`'s [InMemory], observations in a hash map.
pub fn memory_backend(on_event: Option<EventSink>) -> Backend {
    let data = ObjectStoreDataStore::new(Arc::new(InMemory::new()), "_data");
    let data = match &on_event {
        Some(sink) => data.with_event_sink(sink.clone()),
        None => data,
    };
    Backend {
        metadata: Arc::new(MemoryMetadataStore::new(on_event.clone())),
        data: Arc::new(data),
        observations: Some(Arc::new(MemoryObservationsStorage::default())),
        on_event,
    }
}
