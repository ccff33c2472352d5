/*!
The two storage abstractions backends must implement: [MetadataStore]
for `SnapshotMeta` rows, and [DataStore] for opaque content blobs.
*/

pub mod data;
pub mod metadata;

pub use data::{DataHandle, DataStore};
pub use metadata::MetadataStore;
