/*!
SHA-256 hashing of encoded snapshot bytes, used for content-addressed
deduplication (see [crate::engine]).
*/

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of `bytes`.
///
/// Deterministic and collision-resistant for deduplication purposes; no
/// streaming variant is offered, payloads are hashed after a full encode.
pub fn hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
