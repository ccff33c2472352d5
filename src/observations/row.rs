/*!
[ObservationRow] is the backend-agnostic wire shape a storage adapter
persists: the typed [crate::model::observation::Observation] with its
`content` projected to JSON, matching the `corpus_observations` SQL
columns and the filesystem backend's observation file entries.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CrateError, Result};
use crate::model::observation::{NewObservation, Observation, ObservationTypeDef};
use crate::model::pointer::{Span, SnapshotPointer};

/// A row as persisted by an [crate::observations::storage_adapter::ObservationsStorage].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRow {
    /// Unique id, see [crate::observations::id::generate_id].
    pub id: String,
    /// Observation type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Source store id.
    pub source_store_id: String,
    /// Source version.
    pub source_version: String,
    /// Source JSON path, if the pointer has one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_path: Option<String>,
    /// Source span start, if the pointer has one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_span_start: Option<usize>,
    /// Source span end, if the pointer has one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_span_end: Option<usize>,
    /// Schema-validated content, projected to JSON.
    pub content: Value,
    /// Optional confidence in `[0,1]`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<f64>,
    /// Optional logical observation time.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub observed_at: Option<DateTime<Utc>>,
    /// Wall-clock write time.
    pub created_at: DateTime<Utc>,
    /// Optional provenance chain.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub derived_from: Option<Vec<SnapshotPointer>>,
}

impl ObservationRow {
    /// Build a row from validated `new` input, stamping `id`/`created_at`.
    pub fn from_new(type_name: &str, id: String, new: &NewObservation<Value>, created_at: DateTime<Utc>) -> Self {
        ObservationRow {
            id,
            type_name: type_name.to_string(),
            source_store_id: new.source.store_id.clone(),
            source_version: new.source.version.clone(),
            source_path: new.source.path.clone(),
            source_span_start: new.source.span.map(|s| s.start),
            source_span_end: new.source.span.map(|s| s.end),
            content: new.content.clone(),
            confidence: new.confidence,
            observed_at: new.observed_at,
            created_at,
            derived_from: new.derived_from.clone(),
        }
    }

    /// Reconstruct the [SnapshotPointer] this row's source fields encode.
    pub fn source_pointer(&self) -> SnapshotPointer {
        SnapshotPointer {
            store_id: self.source_store_id.clone(),
            version: self.source_version.clone(),
            path: self.source_path.clone(),
            span: match (self.source_span_start, self.source_span_end) {
                (Some(start), Some(end)) => Some(Span { start, end }),
                _ => None,
            },
        }
    }

    /// Deserialize this row's content into a typed [Observation], validating
    /// against `type_def.schema`.
    pub fn into_observation<T>(self, type_def: &ObservationTypeDef<T>) -> Result<Observation<T>> {
        if self.type_name != type_def.name {
            return Err(CrateError::ValidationError(format!(
                "row type '{}' does not match requested type '{}'",
                self.type_name, type_def.name
            )));
        }
        let content = type_def.schema.parse(&self.content)?;
        Ok(Observation {
            id: self.id,
            type_name: self.type_name,
            source: self.source_pointer(),
            content,
            confidence: self.confidence,
            observed_at: self.observed_at,
            created_at: self.created_at,
            derived_from: self.derived_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::json::PlainDeserialize;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_source_pointer_round_trips_span() {
        let row = ObservationRow {
            id: "obs_1_2".into(),
            type_name: "note".into(),
            source_store_id: "s".into(),
            source_version: "v1".into(),
            source_path: Some("$.a".into()),
            source_span_start: Some(0),
            source_span_end: Some(5),
            content: json!({}),
            confidence: None,
            observed_at: None,
            created_at: Utc::now(),
            derived_from: None,
        };
        let pointer = row.source_pointer();
        assert_eq!(pointer.span, Some(Span { start: 0, end: 5 }));
    }

    #[test]
    fn test_into_observation_rejects_mismatched_type() {
        let row = ObservationRow {
            id: "obs_1_2".into(),
            type_name: "other".into(),
            source_store_id: "s".into(),
            source_version: "v1".into(),
            source_path: None,
            source_span_start: None,
            source_span_end: None,
            content: json!({"a": 1}),
            confidence: None,
            observed_at: None,
            created_at: Utc::now(),
            derived_from: None,
        };
        let type_def = ObservationTypeDef::new("note", Arc::new(PlainDeserialize::<Value>::new()));
        assert!(row.into_observation(&type_def).is_err());
    }
}
