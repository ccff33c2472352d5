/*!
JSON codec: encodes via canonical `serde_json` serialization, decodes by
parsing JSON and then validating against a caller-supplied schema.
*/

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::codec::Codec;
use crate::error::{CrateError, Result};
use crate::model::observation::TypeSchema;

/// JSON codec parameterized by a schema validator.
///
/// The validator is the structural-typing workaround described in the
/// design notes: anything offering a fallible `parse(&Value) -> Result<T>`
/// can be used, including the trivial [PlainDeserialize] validator that
/// just defers to `serde`.
pub struct JsonCodec<T> {
    schema: Arc<dyn TypeSchema<T>>,
    _marker: PhantomData<T>,
}

impl<T> JsonCodec<T> {
    /// Build a JSON codec backed by an explicit schema validator.
    pub fn new(schema: Arc<dyn TypeSchema<T>>) -> Self {
        JsonCodec {
            schema,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + 'static> JsonCodec<T> {
    /// Build a JSON codec that validates only via `serde`'s own
    /// `Deserialize` implementation (no additional schema constraints).
    pub fn plain() -> Self {
        JsonCodec::new(Arc::new(PlainDeserialize::<T>::new()))
    }
}

impl<T: Serialize + Send + Sync> Codec<T> for JsonCodec<T> {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CrateError::EncodeError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| CrateError::DecodeError(e.to_string()))?;
        self.schema.parse(&value)
    }
}

/// [TypeSchema] that defers entirely to `serde`'s `Deserialize`, used by
/// [JsonCodec::plain] and anywhere schema validation beyond structural
/// deserialization is unnecessary.
pub struct PlainDeserialize<T> {
    _marker: PhantomData<T>,
}

impl<T> PlainDeserialize<T> {
    /// Construct a pass-through validator.
    pub fn new() -> Self {
        PlainDeserialize {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for PlainDeserialize<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + Send + Sync> TypeSchema<T> for PlainDeserialize<T> {
    fn parse(&self, value: &Value) -> Result<T> {
        serde_json::from_value(value.clone()).map_err(|e| CrateError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        a: i64,
    }

    #[test]
    fn test_round_trip() {
        let codec = JsonCodec::<Doc>::plain();
        let value = Doc { a: 1 };
        let bytes = codec.encode(&value).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_content_type() {
        let codec = JsonCodec::<Doc>::plain();
        assert_eq!(codec.content_type(), "application/json");
    }

    #[test]
    fn test_decode_invalid_json_is_decode_error() {
        let codec = JsonCodec::<Doc>::plain();
        let err = codec.decode(b"not json").unwrap_err();
        assert_eq!(err.kind(), "decode_error");
    }

    #[test]
    fn test_decode_schema_mismatch_is_validation_error() {
        let codec = JsonCodec::<Doc>::plain();
        let err = codec.decode(br#"{"a":"not a number"}"#).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_encode_decode_round_trips_for_any_value(a in any::<i64>()) {
            let codec = JsonCodec::<Doc>::plain();
            let value = Doc { a };
            let bytes = codec.encode(&value).unwrap();
            let decoded = codec.decode(&bytes).unwrap();
            prop_assert_eq!(value, decoded);
        }
    }
}
