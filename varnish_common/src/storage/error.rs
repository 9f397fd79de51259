//! Error types for storage specification parsing.

use thiserror::Error;

/// Errors raised while parsing or validating a storage specification.
///
/// All variants are fatal to the current call. Callers are expected to abort
/// configuration generation and report the message to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageSpecError {
    /// Leading token is not `malloc`, `file` or `persistent`.
    #[error("Invalid storage type: '{kind}'")]
    InvalidStorageType {
        /// Offending type token
        kind: String,
    },

    /// Size token is malformed or exceeds its capacity.
    #[error("{reason}")]
    InvalidStorageSize {
        /// Human-readable cause
        reason: String,
    },

    /// Path token is not an absolute path.
    #[error("Invalid storage path: {path}; expected an absolute path")]
    InvalidStoragePath {
        /// Offending path token
        path: String,
    },

    /// No known mountpoint is a prefix of the path.
    #[error(
        "unable to find mountpoint for path: {path}; \
         are the varnish module's mountpoint facts loading correctly?"
    )]
    UnableToFindMountpoint {
        /// Path that could not be resolved
        path: String,
    },
}

impl StorageSpecError {
    /// Returns true for errors caused by the storage spec text itself (type, size or
    /// path), as opposed to missing host facts.
    pub fn is_invalid_spec(&self) -> bool {
        !matches!(self, Self::UnableToFindMountpoint { .. })
    }

    pub(crate) fn invalid_size(reason: impl Into<String>) -> Self {
        Self::InvalidStorageSize {
            reason: reason.into(),
        }
    }
}

/// Result type for storage specification operations
pub type StorageResult<T> = Result<T, StorageSpecError>;
