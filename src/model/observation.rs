/*!
[Observation] records a typed fact pointing into a specific location of
an existing snapshot. [ObservationTypeDef] pairs a type name with a
schema the content must validate against.
*/

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::pointer::SnapshotPointer;

/// Structural stand-in for "anything offering a fallible `parse`".
///
/// Systems languages without structural typing expose this as an
/// explicit trait; any schema validator for an observation's content
/// type implements it.
pub trait TypeSchema<T>: Send + Sync {
    /// Validate and deserialize `value` into `T`, or fail with a
    /// [crate::error::CrateError::ValidationError].
    fn parse(&self, value: &Value) -> Result<T>;
}

/// Definition of an observation type: its name and the schema its
/// content must validate against.
#[derive(Clone)]
pub struct ObservationTypeDef<T> {
    /// Name used as the `type` field on observations of this kind.
    pub name: String,
    /// Schema validator for `content`.
    pub schema: Arc<dyn TypeSchema<T>>,
}

impl<T> ObservationTypeDef<T> {
    /// Construct a type definition from a name and a schema.
    pub fn new(name: impl Into<String>, schema: Arc<dyn TypeSchema<T>>) -> Self {
        ObservationTypeDef {
            name: name.into(),
            schema,
        }
    }
}

/// A typed fact pointing into a snapshot location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation<T> {
    /// Unique, opaque id: `obs_<timestamp36>_<random36>`.
    pub id: String,
    /// Name of the observation's [ObservationTypeDef].
    #[serde(rename = "type")]
    pub type_name: String,
    /// Location inside a snapshot this observation is about.
    pub source: SnapshotPointer,
    /// Schema-validated payload.
    pub content: T,
    /// Optional confidence in `[0,1]` (advisory, not enforced).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<f64>,
    /// Optional wall-clock instant the fact was observed (distinct from
    /// `created_at`, which is always the write time).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub observed_at: Option<DateTime<Utc>>,
    /// Wall-clock instant stamped on write.
    pub created_at: DateTime<Utc>,
    /// Ordered provenance chain of pointers this observation was derived from.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub derived_from: Option<Vec<SnapshotPointer>>,
}

/// Input to [crate::observations::ObservationsClient::put].
#[derive(Debug, Clone)]
pub struct NewObservation<T> {
    /// Location inside a snapshot this observation is about.
    pub source: SnapshotPointer,
    /// Content to validate and store.
    pub content: T,
    /// Optional confidence in `[0,1]`.
    pub confidence: Option<f64>,
    /// Optional logical observation time.
    pub observed_at: Option<DateTime<Utc>>,
    /// Optional provenance chain.
    pub derived_from: Option<Vec<SnapshotPointer>>,
}

impl<T> NewObservation<T> {
    /// Build a new observation input with only the required `source` and
    /// `content` set.
    pub fn new(source: SnapshotPointer, content: T) -> Self {
        NewObservation {
            source,
            content,
            confidence: None,
            observed_at: None,
            derived_from: None,
        }
    }
}
