/*!
[Event] is the uniform observability hook emitted synchronously at
backend decision points: every metadata/data/snapshot get, put, delete,
and list, plus errors.
*/

/// A plain tagged record describing one backend operation.
#[derive(Debug, Clone)]
pub enum Event {
    /// A metadata read was attempted.
    MetaGet {
        /// Store the read targeted.
        store_id: String,
        /// Version read, if a specific version was requested.
        version: Option<String>,
        /// Whether a matching row was found.
        found: bool,
    },
    /// A metadata row was written.
    MetaPut {
        /// Store the write targeted.
        store_id: String,
        /// Version written.
        version: String,
    },
    /// A metadata row was deleted.
    MetaDelete {
        /// Store the delete targeted.
        store_id: String,
        /// Version deleted.
        version: String,
    },
    /// A metadata listing was performed.
    MetaList {
        /// Store listed.
        store_id: String,
        /// Number of rows returned.
        count: usize,
    },
    /// A data blob was read.
    DataGet {
        /// Key that was read.
        data_key: String,
        /// Whether the blob was found.
        found: bool,
    },
    /// A data blob was written.
    DataPut {
        /// Key that was written.
        data_key: String,
        /// Whether an existing blob with the same key was reused.
        deduplicated: bool,
    },
    /// A data blob was deleted.
    DataDelete {
        /// Key that was deleted.
        data_key: String,
    },
    /// A full snapshot read (metadata + data + decode) was attempted.
    SnapshotGet {
        /// Store the read targeted.
        store_id: String,
        /// Version read.
        version: String,
        /// Whether the snapshot was found.
        found: bool,
    },
    /// A full snapshot write (encode + hash + data + metadata) completed.
    SnapshotPut {
        /// Store written to.
        store_id: String,
        /// Version assigned to the new snapshot.
        version: String,
        /// Content hash of the encoded payload.
        content_hash: String,
        /// Whether the data blob was deduplicated against an existing one.
        deduplicated: bool,
    },
    /// An operation failed.
    Error {
        /// The operation that failed, e.g. `"data_put"`.
        operation: String,
        /// The error's wire-stable `kind` discriminant.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
}

/// A synchronous observability callback, invoked at the decision points
/// described above. Distinct from structured `tracing` diagnostics:
/// this is a programmatic hook for callers, not an operator-facing log.
pub type EventSink = std::sync::Arc<dyn Fn(Event) + Send + Sync>;
