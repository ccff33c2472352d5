/*!
Options accepted by [crate::store::MetadataStore::list] and
[crate::observations::ObservationsClient::query].
*/

use chrono::{DateTime, Utc};

/// Filtering, ordering, and pagination options for metadata listing.
///
/// Ordering is always `created_at` descending, ties broken by `version`
/// descending; this is not configurable.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only include metas with `created_at` strictly before this instant.
    pub before: Option<DateTime<Utc>>,
    /// Only include metas with `created_at` strictly after this instant.
    pub after: Option<DateTime<Utc>>,
    /// Only include metas whose tags include every one of these (AND).
    pub tags: Vec<String>,
    /// Cap the number of results. `Some(0)` yields nothing.
    pub limit: Option<usize>,
    /// Reserved for backend-specific pagination; not honored by the
    /// in-memory or filesystem backends.
    pub cursor: Option<String>,
}

impl ListOptions {
    /// Start building options with a limit.
    pub fn with_limit(limit: usize) -> Self {
        ListOptions {
            limit: Some(limit),
            ..Default::default()
        }
    }
}

/// A resolver mapping a store id to the version(s) considered canonical
/// for staleness purposes, used by [QueryOptions::version_resolver].
pub enum VersionResolver {
    /// Resolve to the store's latest version via the metadata client.
    Latest,
    /// A single explicit version is canonical for every store queried.
    Exact(String),
    /// Any version in this set is considered canonical.
    Set(Vec<String>),
}

/// Filtering, staleness, and pagination options for observation queries.
#[derive(Default)]
pub struct QueryOptions {
    /// Only include observations of these types (OR). Empty means "any type".
    pub types: Vec<String>,
    /// Only include observations whose source store equals this.
    pub source_store: Option<String>,
    /// Only include observations whose source version equals this.
    pub source_version: Option<String>,
    /// Only include observations whose source version starts with this prefix.
    pub source_prefix: Option<String>,
    /// Only include observations created strictly after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Only include observations created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Only include observations observed strictly after this instant.
    /// Rows with no `observed_at` are excluded when this is set.
    pub observed_after: Option<DateTime<Utc>>,
    /// Only include observations observed strictly before this instant.
    /// Rows with no `observed_at` are excluded when this is set.
    pub observed_before: Option<DateTime<Utc>>,
    /// Cap the number of results.
    pub limit: Option<usize>,
    /// When false (the default), stale rows are excluded; see
    /// [crate::observations::ObservationsClient::is_stale].
    pub include_stale: bool,
    /// How to resolve the canonical version per source store when
    /// filtering staleness. `None` falls back to "latest via the
    /// metadata client".
    pub version_resolver: Option<VersionResolver>,
}

impl QueryOptions {
    /// Options that include everything, including stale rows.
    pub fn include_all() -> Self {
        QueryOptions {
            include_stale: true,
            ..Default::default()
        }
    }
}
