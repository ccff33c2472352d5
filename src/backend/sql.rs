/*!
The embedded-SQL backend: `corpus_snapshots` and `corpus_observations`
tables in a SQLite database, queried with real `WHERE` clauses rather
than the scan-and-filter default `ObservationsStorage` methods. Blob
storage is delegated to [ObjectStoreDataStore] over a
[object_store::local::LocalFileSystem] so the database itself never
holds large payloads, mirroring how `free-deep-research`'s
`PostgresSnapshotStorage` keeps its `snapshots` table to metadata and
lets callers hand it already-serialized JSON.
*/

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::backend::Backend;
use crate::error::{CrateError, Result};
use crate::model::event::{Event, EventSink};
use crate::model::list_opts::{ListOptions, QueryOptions};
use crate::model::meta::{ParentRef, SnapshotMeta};
use crate::model::pointer::SnapshotPointer;
use crate::observations::row::ObservationRow;
use crate::observations::storage_adapter::ObservationsStorage;
use crate::store::object_store_data::ObjectStoreDataStore;
use crate::store::MetadataStore;

/// Construction knobs for the embedded-SQL backend.
#[derive(Debug, Clone)]
pub struct SqlConfig {
    /// An `sqlx` connection string, e.g. `sqlite://corpus.db` or
    /// `sqlite::memory:`.
    pub database_url: String,
    /// Root directory blobs are written under (see [ObjectStoreDataStore]).
    pub blob_path: String,
}

impl SqlConfig {
    /// Validate and build a SQL backend config.
    pub fn new(database_url: impl Into<String>, blob_path: impl Into<String>) -> Result<Self> {
        let database_url = database_url.into();
        let blob_path = blob_path.into();
        if database_url.trim().is_empty() {
            return Err(CrateError::InvalidConfig("database_url must not be empty".to_string()));
        }
        if blob_path.trim().is_empty() {
            return Err(CrateError::InvalidConfig("blob_path must not be empty".to_string()));
        }
        Ok(SqlConfig { database_url, blob_path })
    }
}

fn wrap_sql(operation: &str, err: sqlx::Error) -> CrateError {
    CrateError::storage(operation, err)
}

fn row_to_meta(row: &sqlx::sqlite::SqliteRow) -> Result<SnapshotMeta> {
    let parents_json: String = row.get("parents");
    let parents: Vec<ParentRef> =
        serde_json::from_str(&parents_json).map_err(|e| CrateError::storage("meta_decode", e))?;
    let tags_json: Option<String> = row.get("tags");
    let tags = tags_json
        .map(|t| serde_json::from_str::<Vec<String>>(&t))
        .transpose()
        .map_err(|e| CrateError::storage("meta_decode", e))?;

    Ok(SnapshotMeta {
        store_id: row.get("store_id"),
        version: row.get("version"),
        content_hash: row.get("content_hash"),
        content_type: row.get("content_type"),
        size_bytes: row.get::<i64, _>("size_bytes") as u64,
        data_key: row.get("data_key"),
        created_at: row.get("created_at"),
        invoked_at: row.get("invoked_at"),
        parents,
        tags,
    })
}

fn row_to_observation(row: &sqlx::sqlite::SqliteRow) -> Result<ObservationRow> {
    let content_json: String = row.get("content");
    let content = serde_json::from_str(&content_json).map_err(|e| CrateError::storage("observations_decode", e))?;
    let derived_from_json: Option<String> = row.get("derived_from");
    let derived_from = derived_from_json
        .map(|d| serde_json::from_str::<Vec<SnapshotPointer>>(&d))
        .transpose()
        .map_err(|e| CrateError::storage("observations_decode", e))?;

    Ok(ObservationRow {
        id: row.get("id"),
        type_name: row.get("type"),
        source_store_id: row.get("source_store_id"),
        source_version: row.get("source_version"),
        source_path: row.get("source_path"),
        source_span_start: row.get::<Option<i64>, _>("source_span_start").map(|v| v as usize),
        source_span_end: row.get::<Option<i64>, _>("source_span_end").map(|v| v as usize),
        content,
        confidence: row.get("confidence"),
        observed_at: row.get("observed_at"),
        created_at: row.get("created_at"),
        derived_from,
    })
}

/// [MetadataStore] backed by a `corpus_snapshots` table.
pub struct SqlMetadataStore {
    pool: SqlitePool,
    on_event: Option<EventSink>,
}

impl SqlMetadataStore {
    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS corpus_snapshots (
                store_id TEXT NOT NULL,
                version TEXT NOT NULL,
                parents TEXT NOT NULL,
                created_at TEXT NOT NULL,
                invoked_at TEXT,
                content_hash TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                data_key TEXT NOT NULL,
                tags TEXT,
                PRIMARY KEY (store_id, version)
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| wrap_sql("meta_migrate", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_corpus_snapshots_store_created ON corpus_snapshots (store_id, created_at)")
            .execute(pool)
            .await
            .map_err(|e| wrap_sql("meta_migrate", e))?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_corpus_snapshots_store_hash ON corpus_snapshots (store_id, content_hash)")
            .execute(pool)
            .await
            .map_err(|e| wrap_sql("meta_migrate", e))?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_corpus_snapshots_data_key ON corpus_snapshots (data_key)")
            .execute(pool)
            .await
            .map_err(|e| wrap_sql("meta_migrate", e))?;
        Ok(())
    }

    fn emit(&self, event: Event) {
        if let Some(sink) = &self.on_event {
            sink(event);
        }
    }
}

#[async_trait]
impl MetadataStore for SqlMetadataStore {
    async fn get(&self, store_id: &str, version: &str) -> Result<SnapshotMeta> {
        let row = sqlx::query("SELECT * FROM corpus_snapshots WHERE store_id = ? AND version = ?")
            .bind(store_id)
            .bind(version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| wrap_sql("meta_get", e))?;
        tracing::debug!(store_id, version, found = row.is_some(), "sql metadata get");
        self.emit(Event::MetaGet {
            store_id: store_id.to_string(),
            version: Some(version.to_string()),
            found: row.is_some(),
        });
        match row {
            Some(row) => row_to_meta(&row),
            None => Err(CrateError::NotFound(format!("{store_id}:{version}"))),
        }
    }

    async fn put(&self, meta: SnapshotMeta) -> Result<()> {
        let parents_json = serde_json::to_string(&meta.parents).map_err(|e| CrateError::storage("meta_encode", e))?;
        let tags_json = meta
            .tags
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CrateError::storage("meta_encode", e))?;

        sqlx::query(
            r#"
            INSERT INTO corpus_snapshots
                (store_id, version, parents, created_at, invoked_at, content_hash, content_type, size_bytes, data_key, tags)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (store_id, version) DO UPDATE SET
                parents = excluded.parents,
                created_at = excluded.created_at,
                invoked_at = excluded.invoked_at,
                content_hash = excluded.content_hash,
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                data_key = excluded.data_key,
                tags = excluded.tags
            "#,
        )
        .bind(&meta.store_id)
        .bind(&meta.version)
        .bind(parents_json)
        .bind(meta.created_at)
        .bind(meta.invoked_at)
        .bind(&meta.content_hash)
        .bind(&meta.content_type)
        .bind(meta.size_bytes as i64)
        .bind(&meta.data_key)
        .bind(tags_json)
        .execute(&self.pool)
        .await
        .map_err(|e| wrap_sql("meta_put", e))?;

        tracing::debug!(store_id = %meta.store_id, version = %meta.version, "sql metadata put");
        self.emit(Event::MetaPut {
            store_id: meta.store_id,
            version: meta.version,
        });
        Ok(())
    }

    async fn delete(&self, store_id: &str, version: &str) -> Result<()> {
        sqlx::query("DELETE FROM corpus_snapshots WHERE store_id = ? AND version = ?")
            .bind(store_id)
            .bind(version)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap_sql("meta_delete", e))?;
        tracing::debug!(store_id, version, "sql metadata delete");
        self.emit(Event::MetaDelete {
            store_id: store_id.to_string(),
            version: version.to_string(),
        });
        Ok(())
    }

    async fn list(&self, store_id: &str, opts: &ListOptions) -> Result<Vec<SnapshotMeta>> {
        let mut sql = String::from("SELECT * FROM corpus_snapshots WHERE store_id = ?");
        if opts.before.is_some() {
            sql.push_str(" AND created_at < ?");
        }
        if opts.after.is_some() {
            sql.push_str(" AND created_at > ?");
        }
        sql.push_str(" ORDER BY created_at DESC, version DESC");
        if opts.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql).bind(store_id);
        if let Some(before) = opts.before {
            query = query.bind(before);
        }
        if let Some(after) = opts.after {
            query = query.bind(after);
        }
        if let Some(limit) = opts.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(|e| wrap_sql("meta_list", e))?;
        let metas: Vec<SnapshotMeta> = rows
            .iter()
            .map(row_to_meta)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|m| opts.tags.is_empty() || m.matches_tags(&opts.tags))
            .collect();

        tracing::debug!(store_id, count = metas.len(), "sql metadata list");
        self.emit(Event::MetaList {
            store_id: store_id.to_string(),
            count: metas.len(),
        });
        Ok(metas)
    }

    async fn get_children(&self, parent_store_id: &str, parent_version: &str) -> Result<Vec<SnapshotMeta>> {
        // `parents` is a JSON array; matching membership in SQLite without
        // the json1-dependent `json_each` in every build means filtering
        // in memory after a LIKE-narrowed scan.
        let needle = format!("\"store_id\":\"{parent_store_id}\",\"version\":\"{parent_version}\"");
        let rows = sqlx::query("SELECT * FROM corpus_snapshots WHERE parents LIKE ?")
            .bind(format!("%{needle}%"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| wrap_sql("meta_get_children", e))?;
        rows.iter()
            .map(row_to_meta)
            .collect::<Result<Vec<_>>>()
            .map(|metas| metas.into_iter().filter(|m| m.has_parent(parent_store_id, parent_version)).collect())
    }

    async fn find_by_hash(&self, store_id: &str, content_hash: &str) -> Result<Option<SnapshotMeta>> {
        let row = sqlx::query("SELECT * FROM corpus_snapshots WHERE store_id = ? AND content_hash = ? LIMIT 1")
            .bind(store_id)
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| wrap_sql("meta_find_by_hash", e))?;
        row.as_ref().map(row_to_meta).transpose()
    }
}

/// [ObservationsStorage] backed by a `corpus_observations` table, with
/// native `query` and `delete_by_source` implementations that push
/// filtering down to SQL rather than scanning every row.
pub struct SqlObservationsStorage {
    pool: SqlitePool,
}

impl SqlObservationsStorage {
    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS corpus_observations (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                source_store_id TEXT NOT NULL,
                source_version TEXT NOT NULL,
                source_path TEXT,
                source_span_start INTEGER,
                source_span_end INTEGER,
                content TEXT NOT NULL,
                confidence REAL,
                observed_at TEXT,
                created_at TEXT NOT NULL,
                derived_from TEXT
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| wrap_sql("observations_migrate", e))?;

        for (name, cols) in [
            ("idx_corpus_observations_type", "(type)"),
            ("idx_corpus_observations_source", "(source_store_id, source_version)"),
            ("idx_corpus_observations_type_observed", "(type, observed_at)"),
            ("idx_corpus_observations_type_source", "(type, source_store_id)"),
        ] {
            sqlx::query(&format!("CREATE INDEX IF NOT EXISTS {name} ON corpus_observations {cols}"))
                .execute(pool)
                .await
                .map_err(|e| wrap_sql("observations_migrate", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObservationsStorage for SqlObservationsStorage {
    async fn get_all(&self) -> Result<Vec<ObservationRow>> {
        let rows = sqlx::query("SELECT * FROM corpus_observations")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| wrap_sql("observations_get_all", e))?;
        rows.iter().map(row_to_observation).collect()
    }

    async fn set_all(&self, rows: Vec<ObservationRow>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| wrap_sql("observations_set_all", e))?;
        sqlx::query("DELETE FROM corpus_observations")
            .execute(&mut *tx)
            .await
            .map_err(|e| wrap_sql("observations_set_all", e))?;
        for row in rows {
            insert_row(&mut tx, &row).await?;
        }
        tx.commit().await.map_err(|e| wrap_sql("observations_set_all", e))?;
        Ok(())
    }

    async fn get_one(&self, id: &str) -> Result<Option<ObservationRow>> {
        let row = sqlx::query("SELECT * FROM corpus_observations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| wrap_sql("observations_get_one", e))?;
        row.as_ref().map(row_to_observation).transpose()
    }

    async fn add_one(&self, row: ObservationRow) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| wrap_sql("observations_add_one", e))?;
        insert_row(&mut *conn, &row).await
    }

    async fn remove_one(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM corpus_observations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap_sql("observations_remove_one", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, opts: &QueryOptions) -> Result<Vec<ObservationRow>> {
        let mut sql = String::from("SELECT * FROM corpus_observations WHERE 1=1");
        if !opts.types.is_empty() {
            let placeholders = opts.types.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            sql.push_str(&format!(" AND type IN ({placeholders})"));
        }
        if opts.source_store.is_some() {
            sql.push_str(" AND source_store_id = ?");
        }
        if opts.source_version.is_some() {
            sql.push_str(" AND source_version = ?");
        }
        if opts.source_prefix.is_some() {
            sql.push_str(" AND source_version LIKE ?");
        }
        if opts.created_after.is_some() {
            sql.push_str(" AND created_at > ?");
        }
        if opts.created_before.is_some() {
            sql.push_str(" AND created_at < ?");
        }
        if opts.observed_after.is_some() {
            sql.push_str(" AND observed_at IS NOT NULL AND observed_at > ?");
        }
        if opts.observed_before.is_some() {
            sql.push_str(" AND observed_at IS NOT NULL AND observed_at < ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        if opts.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        for type_name in &opts.types {
            query = query.bind(type_name);
        }
        if let Some(store) = &opts.source_store {
            query = query.bind(store);
        }
        if let Some(version) = &opts.source_version {
            query = query.bind(version);
        }
        if let Some(prefix) = &opts.source_prefix {
            query = query.bind(format!("{prefix}%"));
        }
        if let Some(after) = opts.created_after {
            query = query.bind(after);
        }
        if let Some(before) = opts.created_before {
            query = query.bind(before);
        }
        if let Some(after) = opts.observed_after {
            query = query.bind(after);
        }
        if let Some(before) = opts.observed_before {
            query = query.bind(before);
        }
        if let Some(limit) = opts.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(|e| wrap_sql("observations_query", e))?;
        rows.iter().map(row_to_observation).collect()
    }

    async fn delete_by_source(&self, store_id: &str, version: &str, path: Option<&str>) -> Result<usize> {
        let result = match path {
            Some(path) => {
                sqlx::query("DELETE FROM corpus_observations WHERE source_store_id = ? AND source_version = ? AND source_path = ?")
                    .bind(store_id)
                    .bind(version)
                    .bind(path)
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("DELETE FROM corpus_observations WHERE source_store_id = ? AND source_version = ?")
                    .bind(store_id)
                    .bind(version)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(|e| wrap_sql("observations_delete_by_source", e))?;
        Ok(result.rows_affected() as usize)
    }
}

async fn insert_row(executor: &mut sqlx::sqlite::SqliteConnection, row: &ObservationRow) -> Result<()> {
    let content_json = serde_json::to_string(&row.content).map_err(|e| CrateError::storage("observations_encode", e))?;
    let derived_from_json = row
        .derived_from
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| CrateError::storage("observations_encode", e))?;

    sqlx::query(
        r#"
        INSERT INTO corpus_observations
            (id, type, source_store_id, source_version, source_path, source_span_start, source_span_end,
             content, confidence, observed_at, created_at, derived_from)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&row.id)
    .bind(&row.type_name)
    .bind(&row.source_store_id)
    .bind(&row.source_version)
    .bind(&row.source_path)
    .bind(row.source_span_start.map(|v| v as i64))
    .bind(row.source_span_end.map(|v| v as i64))
    .bind(content_json)
    .bind(row.confidence)
    .bind(row.observed_at)
    .bind(row.created_at)
    .bind(derived_from_json)
    .execute(executor)
    .await
    .map_err(|e| wrap_sql("observations_insert", e))?;
    Ok(())
}

/// Build a [Backend] over a SQLite database at `config.database_url`,
/// with observation metadata and rows in SQL tables and blob content on
/// the local filesystem under `config.blob_path`. Runs its own
/// migrations; safe to call against an already-migrated database.
pub async fn sql_backend(config: SqlConfig, on_event: Option<EventSink>) -> Result<Backend> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| CrateError::InvalidConfig(format!("could not connect to '{}': {e}", config.database_url)))?;

    SqlMetadataStore::migrate(&pool).await?;
    SqlObservationsStorage::migrate(&pool).await?;
    tracing::info!(database_url = %config.database_url, "sql backend migrated");

    let fs = LocalFileSystem::new_with_prefix(&config.blob_path)
        .map_err(|e| CrateError::InvalidConfig(format!("invalid blob_path '{}': {e}", config.blob_path)))?;
    let object_store: Arc<dyn ObjectStore> = Arc::new(fs);
    let data = ObjectStoreDataStore::new(object_store, "_data");
    let data = match &on_event {
        Some(sink) => data.with_event_sink(sink.clone()),
        None => data,
    };

    Ok(Backend {
        metadata: Arc::new(SqlMetadataStore {
            pool: pool.clone(),
            on_event: on_event.clone(),
        }),
        data: Arc::new(data),
        observations: Some(Arc::new(SqlObservationsStorage { pool })),
        on_event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::meta::ParentRef;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn backend(dir: &std::path::Path) -> Backend {
        let config = SqlConfig::new("sqlite::memory:", dir.to_str().unwrap()).unwrap();
        sql_backend(config, None).await.unwrap()
    }

    fn sample(store_id: &str, version: &str, hash: &str, created_at: DateTime<Utc>) -> SnapshotMeta {
        SnapshotMeta {
            store_id: store_id.into(),
            version: version.into(),
            content_hash: hash.into(),
            content_type: "application/json".into(),
            size_bytes: 4,
            data_key: format!("{store_id}/{hash}"),
            created_at,
            invoked_at: None,
            parents: vec![],
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;
        backend.metadata.put(sample("s", "v1", "h1", Utc::now())).await.unwrap();
        let meta = backend.metadata.get("s", "v1").await.unwrap();
        assert_eq!(meta.content_hash, "h1");
    }

    #[tokio::test]
    async fn test_put_upserts_existing_version() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;
        backend.metadata.put(sample("s", "v1", "h1", Utc::now())).await.unwrap();
        backend.metadata.put(sample("s", "v1", "h2", Utc::now())).await.unwrap();
        let meta = backend.metadata.get("s", "v1").await.unwrap();
        assert_eq!(meta.content_hash, "h2");
    }

    #[tokio::test]
    async fn test_list_orders_by_created_at_desc() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;
        let now = Utc::now();
        backend.metadata.put(sample("s", "v1", "h1", now - Duration::seconds(10))).await.unwrap();
        backend.metadata.put(sample("s", "v2", "h2", now)).await.unwrap();

        let rows = backend.metadata.list("s", &ListOptions::default()).await.unwrap();
        assert_eq!(rows[0].version, "v2");
        assert_eq!(rows[1].version, "v1");
    }

    #[tokio::test]
    async fn test_get_children_matches_parent() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;
        backend.metadata.put(sample("parent", "p1", "hp", Utc::now())).await.unwrap();
        let mut child = sample("child", "c1", "hc", Utc::now());
        child.parents.push(ParentRef::new("parent", "p1"));
        backend.metadata.put(child).await.unwrap();

        let children = backend.metadata.get_children("parent", "p1").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].store_id, "child");
    }

    #[tokio::test]
    async fn test_find_by_hash() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;
        backend.metadata.put(sample("s", "v1", "h1", Utc::now())).await.unwrap();
        assert!(backend.metadata.find_by_hash("s", "h1").await.unwrap().is_some());
        assert!(backend.metadata.find_by_hash("s", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_observations_native_query_filters_by_type() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;
        let observations = backend.observations.unwrap();
        observations
            .add_one(ObservationRow {
                id: "o1".into(),
                type_name: "note".into(),
                source_store_id: "s".into(),
                source_version: "v1".into(),
                source_path: None,
                source_span_start: None,
                source_span_end: None,
                content: serde_json::json!({"a": 1}),
                confidence: None,
                observed_at: None,
                created_at: Utc::now(),
                derived_from: None,
            })
            .await
            .unwrap();
        observations
            .add_one(ObservationRow {
                id: "o2".into(),
                type_name: "flag".into(),
                source_store_id: "s".into(),
                source_version: "v1".into(),
                source_path: None,
                source_span_start: None,
                source_span_end: None,
                content: serde_json::json!({"b": 2}),
                confidence: None,
                observed_at: None,
                created_at: Utc::now(),
                derived_from: None,
            })
            .await
            .unwrap();

        let opts = QueryOptions {
            types: vec!["note".into()],
            ..Default::default()
        };
        let rows = observations.query(&opts).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "o1");
    }

    #[tokio::test]
    async fn test_observations_delete_by_source_native() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;
        let observations = backend.observations.unwrap();
        for id in ["o1", "o2"] {
            observations
                .add_one(ObservationRow {
                    id: id.into(),
                    type_name: "note".into(),
                    source_store_id: "s".into(),
                    source_version: "v1".into(),
                    source_path: None,
                    source_span_start: None,
                    source_span_end: None,
                    content: serde_json::json!({}),
                    confidence: None,
                    observed_at: None,
                    created_at: Utc::now(),
                    derived_from: None,
                })
                .await
                .unwrap();
        }

        let removed = observations.delete_by_source("s", "v1", None).await.unwrap();
        assert_eq!(removed, 2);
        assert!(observations.get_all().await.unwrap().is_empty());
    }
}
