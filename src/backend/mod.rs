/*!
A [Backend] bundles the three storage capabilities a
[crate::engine::SnapshotEngine] or [crate::observations::ObservationsClient]
consumes: metadata, data, and (optionally) observations, plus a shared
event sink. [memory], [filesystem], and (behind the `sql-backend`
feature) [sql] provide concrete backends; [layered] composes any number
of them into one.
*/

pub mod filesystem;
pub mod layered;
pub mod memory;
#[cfg(feature = "sql-backend")]
pub mod sql;

use std::sync::Arc;

use crate::error::{CrateError, Result};
use crate::model::event::EventSink;
use crate::observations::storage_adapter::ObservationsStorage;
use crate::store::{DataStore, MetadataStore};

/// A complete set of storage capabilities for one deployment.
///
/// `observations` is optional: a backend that only ever serves snapshots
/// (no typed facts layered on top) simply leaves it `None`.
pub struct Backend {
    /// Metadata storage.
    pub metadata: Arc<dyn MetadataStore>,
    /// Data blob storage.
    pub data: Arc<dyn DataStore>,
    /// Observation row storage, if this backend supports observations.
    pub observations: Option<Arc<dyn ObservationsStorage>>,
    /// Shared event sink, wired into the constituent stores at
    /// construction time.
    pub on_event: Option<EventSink>,
}

/// How a [layered::LayeredBackend] combines `list` results across its
/// read layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStrategy {
    /// Gather every read layer's results, dedup by `version` (first
    /// occurrence wins), sort by `created_at` descending, then limit.
    Merge,
    /// Yield only the first read layer's results, unmodified.
    First,
}

/// Construction knobs for the local filesystem backend.
///
/// Validated eagerly: an empty `base_path` is an [CrateError::InvalidConfig]
/// at construction, matching `iceberg-rs`'s `TableBuilder::new` posture
/// for its own required fields.
#[derive(Debug, Clone)]
pub struct FilesystemConfig {
    /// Root directory the backend reads and writes under.
    pub base_path: String,
}

impl FilesystemConfig {
    /// Validate and build a filesystem config.
    pub fn new(base_path: impl Into<String>) -> Result<Self> {
        let base_path = base_path.into();
        if base_path.trim().is_empty() {
            return Err(CrateError::InvalidConfig("base_path must not be empty".to_string()));
        }
        Ok(FilesystemConfig { base_path })
    }
}

/// Construction knobs for a [layered::LayeredBackend].
#[derive(Clone)]
pub struct LayeredConfig {
    /// Ordered backends consulted for reads, first success wins.
    pub read: Vec<Arc<Backend>>,
    /// Ordered backends written to on every write, first failure
    /// short-circuits.
    pub write: Vec<Arc<Backend>>,
    /// How `list` combines results across `read`.
    pub list_strategy: ListStrategy,
}

impl LayeredConfig {
    /// Validate and build a layered config. At least one of `read` or
    /// `write` must be non-empty — an entirely empty layered backend is
    /// a configuration mistake, not a useful no-op.
    pub fn new(read: Vec<Arc<Backend>>, write: Vec<Arc<Backend>>, list_strategy: ListStrategy) -> Result<Self> {
        if read.is_empty() && write.is_empty() {
            return Err(CrateError::InvalidConfig(
                "layered backend needs at least one read or write layer".to_string(),
            ));
        }
        Ok(LayeredConfig { read, write, list_strategy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_config_rejects_empty_base_path() {
        let err = FilesystemConfig::new("  ").unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn test_filesystem_config_accepts_nonempty_base_path() {
        assert!(FilesystemConfig::new("/tmp/store").is_ok());
    }

    #[test]
    fn test_layered_config_rejects_fully_empty() {
        let err = LayeredConfig::new(vec![], vec![], ListStrategy::Merge).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }
}
