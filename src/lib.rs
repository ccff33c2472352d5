#![deny(missing_docs)]
/*!
# corpus

`corpus` is a versioned, content-addressed snapshot store with
pluggable backends and a typed observations layer.

[engine::SnapshotEngine] is the main entry point: it encodes values
through a [codec::Codec], deduplicates identical content by SHA-256
hash, and persists metadata through a [store::MetadataStore] and blob
bytes through a [store::DataStore]. [backend] provides ready-made
backends (in-memory, local filesystem, an embedded-SQL store behind the
`sql-backend` feature, and a layered composite of any number of them).

[observations::ObservationsClient] layers typed facts on top of
snapshots, each pointing at a specific snapshot location via
[model::pointer::SnapshotPointer], with built-in staleness filtering
against the metadata store.

[pointer_resolve] resolves a `SnapshotPointer` against a registry of
live stores, navigating into JSON paths and character spans.
*/
pub mod backend;
pub mod codec;
pub mod concurrency;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hash;
pub mod model;
pub mod observations;
pub mod pipe;
pub mod pointer_resolve;
pub mod store;
pub mod version;

pub use engine::SnapshotEngine;
pub use error::{CrateError, Result};
pub use observations::ObservationsClient;

pub use object_store;
