/*!
Defines the [CrateError] and [Result] types used across the crate.

The `kind` taxonomy mirrors the wire-stable error names consumers may
match on: `not_found`, `already_exists`, `storage_error`, `decode_error`,
`encode_error`, `hash_mismatch`, `invalid_config`, `validation_error`,
`observation_not_found`.
*/

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum CrateError {
    /// No metadata or data exists for the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// An entity that must be unique already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A backend (metadata, data, or observations store) failed to
    /// complete an operation. Carries the failing operation's name and
    /// the underlying cause.
    #[error("storage error during {operation}: {source}")]
    StorageError {
        /// The operation that failed, e.g. `"meta_get"` or `"data_put"`.
        operation: String,
        /// The underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// A codec failed to decode previously-encoded bytes.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// A codec failed to encode a value.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// A read-path integrity check found a hash mismatch.
    #[error("hash mismatch: expected {expected}, found {found}")]
    HashMismatch {
        /// Expected content hash.
        expected: String,
        /// Hash actually computed.
        found: String,
    },

    /// A backend or builder was misconfigured.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A value failed schema or structural validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No observation exists for the requested id.
    #[error("observation not found: {0}")]
    ObservationNotFound(String),
}

impl CrateError {
    /// The wire-stable discriminant name for this error's `kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            CrateError::NotFound(_) => "not_found",
            CrateError::AlreadyExists(_) => "already_exists",
            CrateError::StorageError { .. } => "storage_error",
            CrateError::DecodeError(_) => "decode_error",
            CrateError::EncodeError(_) => "encode_error",
            CrateError::HashMismatch { .. } => "hash_mismatch",
            CrateError::InvalidConfig(_) => "invalid_config",
            CrateError::ValidationError(_) => "validation_error",
            CrateError::ObservationNotFound(_) => "observation_not_found",
        }
    }

    /// True for domain-miss errors composites treat as "try the next backend".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CrateError::NotFound(_) | CrateError::ObservationNotFound(_)
        )
    }

    /// Wrap an arbitrary error as a [CrateError::StorageError] tagged with `operation`.
    pub fn storage(operation: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        CrateError::StorageError {
            operation: operation.into(),
            source: source.into(),
        }
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, CrateError>;
