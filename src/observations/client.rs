/*!
[ObservationsClient] is the typed façade over an
[crate::observations::storage_adapter::ObservationsStorage]: it validates
content against a [ObservationTypeDef]'s schema, stamps ids and
timestamps, and applies staleness filtering to queries using a
[MetadataStore] as the source of truth for "latest version per store".
*/

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CrateError, Result};
use crate::model::list_opts::{QueryOptions, VersionResolver};
use crate::model::observation::{NewObservation, Observation, ObservationTypeDef};
use crate::model::pointer::SnapshotPointer;
use crate::observations::id::generate_id;
use crate::observations::row::ObservationRow;
use crate::observations::storage_adapter::ObservationsStorage;
use crate::store::MetadataStore;

/// A query result row with content omitted, for callers that only need
/// to know *that* and *where* an observation exists.
#[derive(Debug, Clone)]
pub struct ObservationMeta {
    /// Observation id.
    pub id: String,
    /// Observation type name.
    pub type_name: String,
    /// Snapshot location this observation is about.
    pub source: SnapshotPointer,
    /// Optional confidence in `[0,1]`.
    pub confidence: Option<f64>,
    /// Optional logical observation time.
    pub observed_at: Option<DateTime<Utc>>,
    /// Wall-clock write time.
    pub created_at: DateTime<Utc>,
}

impl From<&ObservationRow> for ObservationMeta {
    fn from(row: &ObservationRow) -> Self {
        ObservationMeta {
            id: row.id.clone(),
            type_name: row.type_name.clone(),
            source: row.source_pointer(),
            confidence: row.confidence,
            observed_at: row.observed_at,
            created_at: row.created_at,
        }
    }
}

/// Typed client for one [ObservationTypeDef], backed by a shared
/// [ObservationsStorage] adapter and a [MetadataStore] for staleness.
pub struct ObservationsClient<T> {
    storage: Arc<dyn ObservationsStorage>,
    metadata: Arc<dyn MetadataStore>,
    type_def: ObservationTypeDef<T>,
}

impl<T: Serialize + Send + Sync> ObservationsClient<T> {
    /// Build a client for `type_def` over `storage`, using `metadata` to
    /// resolve "latest version" during staleness checks.
    pub fn new(
        storage: Arc<dyn ObservationsStorage>,
        metadata: Arc<dyn MetadataStore>,
        type_def: ObservationTypeDef<T>,
    ) -> Self {
        ObservationsClient {
            storage,
            metadata,
            type_def,
        }
    }

    /// Validate `new.content` against the type's schema, stamp an id and
    /// `created_at`, persist, and return the constructed observation.
    pub async fn put(&self, new: NewObservation<T>) -> Result<Observation<T>> {
        let value = serde_json::to_value(&new.content)
            .map_err(|e| CrateError::ValidationError(e.to_string()))?;
        self.type_def.schema.parse(&value)?;

        let typed_new = NewObservation {
            source: new.source,
            content: value,
            confidence: new.confidence,
            observed_at: new.observed_at,
            derived_from: new.derived_from,
        };
        let row = ObservationRow::from_new(&self.type_def.name, generate_id(), &typed_new, Utc::now());
        self.storage.add_one(row.clone()).await?;
        row.into_observation(&self.type_def)
    }

    /// Fetch one observation by id.
    pub async fn get(&self, id: &str) -> Result<Observation<T>> {
        let row = self
            .storage
            .get_one(id)
            .await?
            .ok_or_else(|| CrateError::ObservationNotFound(id.to_string()))?;
        row.into_observation(&self.type_def)
    }

    /// Query observations matching `opts`, applying staleness filtering
    /// unless `opts.include_stale` is set.
    pub async fn query(&self, opts: &QueryOptions) -> Result<Vec<Observation<T>>> {
        let rows = self.rows_for_query(opts).await?;
        rows.into_iter().map(|row| row.into_observation(&self.type_def)).collect()
    }

    /// Like [Self::query] but returns content-free summaries; useful for
    /// listing observation locations without validating every payload.
    pub async fn query_meta(&self, opts: &QueryOptions) -> Result<Vec<ObservationMeta>> {
        let rows = self.rows_for_query(opts).await?;
        Ok(rows.iter().map(ObservationMeta::from).collect())
    }

    async fn rows_for_query(&self, opts: &QueryOptions) -> Result<Vec<ObservationRow>> {
        let rows = self.storage.query(opts).await?;
        if opts.include_stale {
            Ok(rows)
        } else {
            self.drop_stale(rows, &opts.version_resolver).await
        }
    }

    /// Delete one observation by id.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.storage.remove_one(id).await? {
            Ok(())
        } else {
            Err(CrateError::ObservationNotFound(id.to_string()))
        }
    }

    /// Delete every observation sourced from `pointer`'s
    /// `(store_id, version)`, optionally narrowed to its exact `path`.
    /// Returns the count removed.
    pub async fn delete_by_source(&self, pointer: &SnapshotPointer) -> Result<usize> {
        self.storage
            .delete_by_source(&pointer.store_id, &pointer.version, pointer.path.as_deref())
            .await
    }

    /// True if `pointer` does not name the latest version of its store.
    /// A store with no metadata at all is treated as not-stale (there is
    /// nothing more canonical to compare against).
    pub async fn is_stale(&self, pointer: &SnapshotPointer) -> Result<bool> {
        match self.metadata.get_latest(&pointer.store_id).await {
            Ok(latest) => Ok(latest.version != pointer.version),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn drop_stale(&self, rows: Vec<ObservationRow>, resolver: &Option<VersionResolver>) -> Result<Vec<ObservationRow>> {
        let mut latest_cache: HashMap<String, String> = HashMap::new();
        let mut kept = Vec::new();
        for row in rows {
            let include = match resolver {
                Some(VersionResolver::Exact(version)) => &row.source_version == version,
                Some(VersionResolver::Set(versions)) => versions.contains(&row.source_version),
                Some(VersionResolver::Latest) | None => {
                    let latest = match latest_cache.get(&row.source_store_id) {
                        Some(v) => v.clone(),
                        None => {
                            let v = self
                                .metadata
                                .get_latest(&row.source_store_id)
                                .await
                                .map(|m| m.version)
                                .unwrap_or_else(|_| row.source_version.clone());
                            latest_cache.insert(row.source_store_id.clone(), v.clone());
                            v
                        }
                    };
                    row.source_version == latest
                }
            };
            if include {
                kept.push(row);
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryMetadataStore;
    use crate::codec::json::PlainDeserialize;
    use crate::model::meta::SnapshotMeta;
    use crate::observations::storage_adapter::MemoryObservationsStorage;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Note {
        text: String,
    }

    async fn meta(store_id: &str, version: &str, created_at: DateTime<Utc>) -> SnapshotMeta {
        SnapshotMeta {
            store_id: store_id.into(),
            version: version.into(),
            content_hash: "h".into(),
            content_type: "application/json".into(),
            size_bytes: 1,
            data_key: format!("{store_id}/h"),
            created_at,
            invoked_at: None,
            parents: vec![],
            tags: None,
        }
    }

    fn client() -> (ObservationsClient<Note>, Arc<MemoryMetadataStore>) {
        let metadata = Arc::new(MemoryMetadataStore::new(None));
        let client = ObservationsClient::new(
            Arc::new(MemoryObservationsStorage::default()),
            metadata.clone(),
            ObservationTypeDef::new("note", Arc::new(PlainDeserialize::<Note>::new())),
        );
        (client, metadata)
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips_content() {
        let (client, _metadata) = client();
        let obs = client
            .put(NewObservation::new(
                SnapshotPointer::whole("s", "v1"),
                Note { text: "hi".into() },
            ))
            .await
            .unwrap();
        let fetched = client.get(&obs.id).await.unwrap();
        assert_eq!(fetched.content, Note { text: "hi".into() });
    }

    #[tokio::test]
    async fn test_get_missing_is_observation_not_found() {
        let (client, _metadata) = client();
        let err = client.get("obs_missing").await.unwrap_err();
        assert_eq!(err.kind(), "observation_not_found");
    }

    #[tokio::test]
    async fn test_delete_missing_is_observation_not_found() {
        let (client, _metadata) = client();
        let err = client.delete("obs_missing").await.unwrap_err();
        assert_eq!(err.kind(), "observation_not_found");
    }

    #[tokio::test]
    async fn test_query_excludes_stale_by_default() {
        let (client, metadata) = client();
        let now = Utc::now();
        metadata.put(meta("s", "v1", now - chrono::Duration::seconds(10)).await).await.unwrap();
        metadata.put(meta("s", "v2", now).await).await.unwrap();

        client
            .put(NewObservation::new(SnapshotPointer::whole("s", "v1"), Note { text: "old".into() }))
            .await
            .unwrap();
        client
            .put(NewObservation::new(SnapshotPointer::whole("s", "v2"), Note { text: "new".into() }))
            .await
            .unwrap();

        let fresh = client.query(&QueryOptions::default()).await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].content.text, "new");

        let all = client.query(&QueryOptions::include_all()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_is_stale_true_when_not_latest() {
        let (client, metadata) = client();
        let now = Utc::now();
        metadata.put(meta("s", "v1", now - chrono::Duration::seconds(10)).await).await.unwrap();
        metadata.put(meta("s", "v2", now).await).await.unwrap();

        assert!(client.is_stale(&SnapshotPointer::whole("s", "v1")).await.unwrap());
        assert!(!client.is_stale(&SnapshotPointer::whole("s", "v2")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_source_without_path_removes_all_versions_rows() {
        let (client, _metadata) = client();
        client
            .put(NewObservation::new(SnapshotPointer::whole("s", "v1"), Note { text: "a".into() }))
            .await
            .unwrap();
        client
            .put(NewObservation::new(SnapshotPointer::whole("s", "v1"), Note { text: "b".into() }))
            .await
            .unwrap();

        let removed = client.delete_by_source(&SnapshotPointer::whole("s", "v1")).await.unwrap();
        assert_eq!(removed, 2);
    }
}
