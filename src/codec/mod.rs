/*!
[Codec] is the bidirectional value ↔ bytes bridge the snapshot engine
uses to encode data for storage and decode it back on read.

Three built-ins are provided: [json::JsonCodec] (JSON + schema
validation), [text::TextCodec] (UTF-8 pass-through), and
[binary::BinaryCodec] (identity).
*/

pub mod binary;
pub mod json;
pub mod text;

use crate::error::Result;

/// Bidirectional value ↔ bytes bridge with a declared content type.
///
/// Encode is not required to validate; a caller may legally encode data
/// whose decode later fails — the engine surfaces encode/decode
/// failures as typed errors rather than preventing the encode.
pub trait Codec<T>: Send + Sync {
    /// MIME content type this codec declares for its encoded output.
    fn content_type(&self) -> &str;

    /// Encode `value` to bytes, or fail with
    /// [crate::error::CrateError::EncodeError].
    fn encode(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode bytes back to a value, or fail with
    /// [crate::error::CrateError::DecodeError] or
    /// [crate::error::CrateError::ValidationError].
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}
