/*!
Plain-text codec: UTF-8 bytes pass through unchanged in both directions.
*/

use crate::codec::Codec;
use crate::error::{CrateError, Result};

/// UTF-8 pass-through codec for `String` payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCodec;

impl Codec<String> for TextCodec {
    fn content_type(&self) -> &str {
        "text/plain"
    }

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CrateError::DecodeError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let codec = TextCodec;
        let value = "hello, world".to_string();
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let codec = TextCodec;
        let err = codec.decode(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), "decode_error");
    }
}
