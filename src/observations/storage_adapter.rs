/*!
[ObservationsStorage] is the contract a backend implements to persist
[ObservationRow]s. Every backend must provide the five base operations;
`query` and `delete_by_source` have scan-and-filter default
implementations so a backend only needs to override them when it can
do better natively (the embedded-SQL backend does, via real `WHERE`
clauses).
*/

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CrateError, Result};
use crate::filter::{filter_sort_limit, Predicate};
use crate::model::list_opts::QueryOptions;
use crate::observations::row::ObservationRow;

/// Storage contract for observation rows.
#[async_trait]
pub trait ObservationsStorage: Send + Sync {
    /// Every row currently stored.
    async fn get_all(&self) -> Result<Vec<ObservationRow>>;

    /// Replace the entire row set. Used by the default `delete_by_source`.
    async fn set_all(&self, rows: Vec<ObservationRow>) -> Result<()>;

    /// Fetch one row by id.
    async fn get_one(&self, id: &str) -> Result<Option<ObservationRow>>;

    /// Insert a row.
    async fn add_one(&self, row: ObservationRow) -> Result<()>;

    /// Remove a row by id, returning whether it existed.
    async fn remove_one(&self, id: &str) -> Result<bool>;

    /// Query rows matching `opts`, sorted `created_at` descending (ties
    /// by `id` descending), limited per `opts.limit`. The default scans
    /// `get_all` and filters in memory; backends with native query
    /// support should override this.
    async fn query(&self, opts: &QueryOptions) -> Result<Vec<ObservationRow>> {
        let rows = self.get_all().await?;
        Ok(default_query(rows, opts))
    }

    /// Delete all rows for `(store_id, version)`, optionally narrowed to
    /// an exact `path`. Returns the count removed. The default loads
    /// everything, partitions in memory, and calls `set_all`; backends
    /// with native deletes should override this.
    async fn delete_by_source(&self, store_id: &str, version: &str, path: Option<&str>) -> Result<usize> {
        let all = self.get_all().await?;
        let (removed, kept): (Vec<_>, Vec<_>) = all.into_iter().partition(|r| {
            r.source_store_id == store_id
                && r.source_version == version
                && path.map(|p| r.source_path.as_deref() == Some(p)).unwrap_or(true)
        });
        let count = removed.len();
        self.set_all(kept).await?;
        Ok(count)
    }
}

/// Scan-and-filter implementation of [ObservationsStorage::query], shared
/// by the default trait method and any backend that wants the same
/// semantics without re-deriving the predicate set.
pub fn default_query(rows: Vec<ObservationRow>, opts: &QueryOptions) -> Vec<ObservationRow> {
    let mut predicates: Vec<Predicate<'_, ObservationRow>> = Vec::new();
    if !opts.types.is_empty() {
        predicates.push(Box::new(move |r: &ObservationRow| opts.types.contains(&r.type_name)));
    }
    if let Some(store) = &opts.source_store {
        predicates.push(Box::new(move |r: &ObservationRow| &r.source_store_id == store));
    }
    if let Some(version) = &opts.source_version {
        predicates.push(Box::new(move |r: &ObservationRow| &r.source_version == version));
    }
    if let Some(prefix) = &opts.source_prefix {
        predicates.push(Box::new(move |r: &ObservationRow| r.source_version.starts_with(prefix.as_str())));
    }
    if let Some(after) = opts.created_after {
        predicates.push(Box::new(move |r: &ObservationRow| r.created_at > after));
    }
    if let Some(before) = opts.created_before {
        predicates.push(Box::new(move |r: &ObservationRow| r.created_at < before));
    }
    if let Some(after) = opts.observed_after {
        predicates.push(Box::new(move |r: &ObservationRow| r.observed_at.map(|o| o > after).unwrap_or(false)));
    }
    if let Some(before) = opts.observed_before {
        predicates.push(Box::new(move |r: &ObservationRow| r.observed_at.map(|o| o < before).unwrap_or(false)));
    }
    filter_sort_limit(
        rows,
        &predicates,
        |a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
        opts.limit,
    )
}

/// In-memory [ObservationsStorage], backed by a mutex-guarded vector.
#[derive(Default)]
pub struct MemoryObservationsStorage {
    rows: Mutex<HashMap<String, ObservationRow>>,
}

#[async_trait]
impl ObservationsStorage for MemoryObservationsStorage {
    async fn get_all(&self) -> Result<Vec<ObservationRow>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn set_all(&self, rows: Vec<ObservationRow>) -> Result<()> {
        *self.rows.lock().unwrap() = rows.into_iter().map(|r| (r.id.clone(), r)).collect();
        Ok(())
    }

    async fn get_one(&self, id: &str) -> Result<Option<ObservationRow>> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn add_one(&self, row: ObservationRow) -> Result<()> {
        self.rows.lock().unwrap().insert(row.id.clone(), row);
        Ok(())
    }

    async fn remove_one(&self, id: &str) -> Result<bool> {
        Ok(self.rows.lock().unwrap().remove(id).is_some())
    }
}

impl MemoryObservationsStorage {
    /// Fetch a row by id, or an [CrateError::ObservationNotFound].
    pub async fn require(&self, id: &str) -> Result<ObservationRow> {
        self.get_one(id)
            .await?
            .ok_or_else(|| CrateError::ObservationNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str, type_name: &str, store: &str, version: &str) -> ObservationRow {
        ObservationRow {
            id: id.into(),
            type_name: type_name.into(),
            source_store_id: store.into(),
            source_version: version.into(),
            source_path: None,
            source_span_start: None,
            source_span_end: None,
            content: json!({}),
            confidence: None,
            observed_at: None,
            created_at: chrono::Utc::now(),
            derived_from: None,
        }
    }

    #[tokio::test]
    async fn test_add_then_get_one() {
        let storage = MemoryObservationsStorage::default();
        storage.add_one(row("o1", "note", "s", "v1")).await.unwrap();
        assert!(storage.get_one("o1").await.unwrap().is_some());
        assert!(storage.get_one("o2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_one_reports_existence() {
        let storage = MemoryObservationsStorage::default();
        storage.add_one(row("o1", "note", "s", "v1")).await.unwrap();
        assert!(storage.remove_one("o1").await.unwrap());
        assert!(!storage.remove_one("o1").await.unwrap());
    }

    #[tokio::test]
    async fn test_default_query_filters_by_type() {
        let storage = MemoryObservationsStorage::default();
        storage.add_one(row("o1", "note", "s", "v1")).await.unwrap();
        storage.add_one(row("o2", "flag", "s", "v1")).await.unwrap();

        let opts = QueryOptions {
            types: vec!["note".into()],
            ..Default::default()
        };
        let rows = storage.query(&opts).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "o1");
    }

    #[tokio::test]
    async fn test_delete_by_source_without_path_removes_all_for_version() {
        let storage = MemoryObservationsStorage::default();
        storage.add_one(row("o1", "note", "s", "v1")).await.unwrap();
        storage.add_one(row("o2", "note", "s", "v1")).await.unwrap();
        storage.add_one(row("o3", "note", "s", "v2")).await.unwrap();

        let removed = storage.delete_by_source("s", "v1", None).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(storage.get_all().await.unwrap().len(), 1);
    }
}
