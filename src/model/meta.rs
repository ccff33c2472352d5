/*!
[SnapshotMeta] is the unit of versioning: an immutable, time-sortable
record of where a snapshot's encoded bytes live and what lineage it has.
[Snapshot] pairs a `SnapshotMeta` with its decoded `data` view.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reference to a parent snapshot, recording lineage.
///
/// `parents` forms a DAG by convention; nothing in this crate checks
/// acyclicity — callers must not create cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentRef {
    /// Store id of the parent snapshot.
    pub store_id: String,
    /// Version of the parent snapshot.
    pub version: String,
    /// Optional free-form label for the relationship (e.g. `"source"`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
}

impl ParentRef {
    /// Build a parent reference with no role.
    pub fn new(store_id: impl Into<String>, version: impl Into<String>) -> Self {
        ParentRef {
            store_id: store_id.into(),
            version: version.into(),
            role: None,
        }
    }

    /// Build a parent reference carrying a role label.
    pub fn with_role(
        store_id: impl Into<String>,
        version: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        ParentRef {
            store_id: store_id.into(),
            version: version.into(),
            role: Some(role.into()),
        }
    }
}

/// Metadata describing one version of a logical store's content.
///
/// `(store_id, version)` is unique; a `put` of the same pair overwrites
/// metadata only, never the underlying data blob, which is immutable by
/// hash and may be shared by many `SnapshotMeta`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotMeta {
    /// Stable identifier of the logical store this snapshot belongs to.
    pub store_id: String,
    /// Unique, lexicographically time-sortable version string.
    pub version: String,
    /// Lowercase hex SHA-256 of the encoded payload (64 chars).
    pub content_hash: String,
    /// MIME content type declared by the codec that produced this snapshot.
    pub content_type: String,
    /// Length in bytes of the encoded payload.
    pub size_bytes: u64,
    /// Opaque key identifying the physical blob in the data store.
    pub data_key: String,
    /// Wall-clock instant the metadata was assembled.
    pub created_at: DateTime<Utc>,
    /// Optional caller-supplied logical event time, distinct from `created_at`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub invoked_at: Option<DateTime<Utc>>,
    /// Ordered lineage references.
    #[serde(default)]
    pub parents: Vec<ParentRef>,
    /// Optional ordered list of short tags.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tags: Option<Vec<String>>,
}

impl SnapshotMeta {
    /// True if `self.tags` includes every tag in `required` (AND semantics).
    ///
    /// An empty or absent `required` list always matches. A `self` with no
    /// tags only matches an empty/absent `required` list.
    pub fn matches_tags(&self, required: &[String]) -> bool {
        if required.is_empty() {
            return true;
        }
        match &self.tags {
            Some(tags) => required.iter().all(|t| tags.contains(t)),
            None => false,
        }
    }

    /// True if `self.parents` contains a reference to `(store_id, version)`.
    /// `role` is ignored in the match.
    pub fn has_parent(&self, store_id: &str, version: &str) -> bool {
        self.parents
            .iter()
            .any(|p| p.store_id == store_id && p.version == version)
    }
}

/// A decoded snapshot: immutable metadata plus a transient decoded view
/// of the underlying data.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// The snapshot's metadata.
    pub meta: SnapshotMeta,
    /// The decoded payload.
    pub data: T,
}

/// Options accepted by [crate::engine::SnapshotEngine::put].
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Lineage references to record on the new `SnapshotMeta`.
    pub parents: Vec<ParentRef>,
    /// Caller-supplied logical event time.
    pub invoked_at: Option<DateTime<Utc>>,
    /// Tags to attach to the new snapshot.
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta(tags: Option<Vec<&str>>) -> SnapshotMeta {
        SnapshotMeta {
            store_id: "s".into(),
            version: "v1".into(),
            content_hash: "h".into(),
            content_type: "application/json".into(),
            size_bytes: 10,
            data_key: "s/h".into(),
            created_at: Utc::now(),
            invoked_at: None,
            parents: vec![],
            tags: tags.map(|ts| ts.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn test_matches_tags_and_semantics() {
        let meta = sample_meta(Some(vec!["a", "b"]));
        assert!(meta.matches_tags(&["a".into()]));
        assert!(meta.matches_tags(&["a".into(), "b".into()]));
        assert!(!meta.matches_tags(&["a".into(), "c".into()]));
    }

    #[test]
    fn test_matches_tags_empty_filter_always_matches() {
        let meta = sample_meta(None);
        assert!(meta.matches_tags(&[]));
    }

    #[test]
    fn test_matches_tags_missing_meta_tags_excluded() {
        let meta = sample_meta(None);
        assert!(!meta.matches_tags(&["a".into()]));
    }

    #[test]
    fn test_has_parent_ignores_role() {
        let mut meta = sample_meta(None);
        meta.parents.push(ParentRef::with_role("p", "v1", "source"));
        assert!(meta.has_parent("p", "v1"));
        assert!(!meta.has_parent("p", "v2"));
    }
}
