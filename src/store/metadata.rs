/*!
[MetadataStore] persists [SnapshotMeta] rows keyed by `(store_id, version)`
and answers listing, lineage, and hash-index queries over them.
*/

use async_trait::async_trait;

use crate::error::Result;
use crate::model::list_opts::ListOptions;
use crate::model::meta::SnapshotMeta;

/// Storage contract for `SnapshotMeta` rows.
///
/// The "lazy sequence" results the design calls for are realized here as
/// `Vec<SnapshotMeta>` returned from an `async fn` — none of this crate's
/// backends need true incremental streaming of metadata rows.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch the metadata for one `(store_id, version)` pair.
    async fn get(&self, store_id: &str, version: &str) -> Result<SnapshotMeta>;

    /// Upsert metadata by `(store_id, version)`.
    async fn put(&self, meta: SnapshotMeta) -> Result<()>;

    /// Delete metadata for one `(store_id, version)` pair. Idempotent —
    /// deleting a missing key returns `Ok(())`.
    async fn delete(&self, store_id: &str, version: &str) -> Result<()>;

    /// List metadata for a store, filtered, ordered `created_at`
    /// descending (ties broken by `version` descending), and limited per
    /// `opts`.
    async fn list(&self, store_id: &str, opts: &ListOptions) -> Result<Vec<SnapshotMeta>>;

    /// Fetch the metadata with the greatest `(created_at, version)` for
    /// a store.
    async fn get_latest(&self, store_id: &str) -> Result<SnapshotMeta> {
        let opts = ListOptions::with_limit(1);
        let results = self.list(store_id, &opts).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| crate::error::CrateError::NotFound(store_id.to_string()))
    }

    /// All metas whose `parents` contain `(parent_store_id, parent_version)`.
    /// `role` is not used in the match.
    async fn get_children(
        &self,
        parent_store_id: &str,
        parent_version: &str,
    ) -> Result<Vec<SnapshotMeta>>;

    /// The metadata, if any, already stored for `(store_id, content_hash)`.
    async fn find_by_hash(&self, store_id: &str, content_hash: &str) -> Result<Option<SnapshotMeta>>;
}
