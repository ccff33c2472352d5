/*!
The observations subsystem: typed facts pointing into snapshot
locations. [ObservationsClient] is the public façade; [storage_adapter]
defines what a backend must implement to hold observation rows.
*/

pub mod client;
pub mod id;
pub mod row;
pub mod storage_adapter;

pub use client::{ObservationMeta, ObservationsClient};
pub use row::ObservationRow;
pub use storage_adapter::ObservationsStorage;
