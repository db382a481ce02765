//! Error types for the cache engine.
//!
//! Provides unified error handling using thiserror. Absence of a key is never
//! an error: lookups report it as `Ok(None)`. Errors are reserved for codec
//! failures and for configurations that cannot produce a working cache.

use thiserror::Error;

// == Codec Error ==
/// Failure raised by a serializer or deserializer hook.
///
/// User-supplied codecs build one with [`CodecError::new`]; the bundled JSON
/// codec converts `serde_json` failures into it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CodecError {
    message: String,
}

impl CodecError {
    /// Creates a codec error carrying the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

// == Cache Error Enum ==
/// Unified error type for cache construction and cache operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The configured serializer rejected a value; the write did not happen.
    #[error("serialization failed: {0}")]
    Serialize(#[source] CodecError),

    /// The configured deserializer rejected a stored value.
    #[error("deserialization failed: {0}")]
    Deserialize(#[source] CodecError),

    /// The requested eviction policy is not provided by this crate.
    #[error("unsupported eviction policy: {0}")]
    UnsupportedPolicy(String),

    /// The configuration cannot produce a working cache.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
