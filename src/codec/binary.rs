/*!
Raw binary codec: the identity function on `Vec<u8>`.
*/

use crate::codec::Codec;
use crate::error::Result;

/// Identity codec for raw byte payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryCodec;

impl Codec<Vec<u8>> for BinaryCodec {
    fn content_type(&self) -> &str {
        "application/octet-stream"
    }

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let codec = BinaryCodec;
        let value = vec![1, 2, 3, 4];
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value);
    }
}
