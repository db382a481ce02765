//! Value Codecs
//!
//! A cache can be configured with a serializer/deserializer pair. When it is,
//! every value is encoded to bytes on `set` and decoded back on `get`, so the
//! table only ever holds owned byte buffers. Without a codec values are stored
//! as-is and cloned out on reads.
//!
//! Codecs are plain function values. They must be pure: the cache calls them
//! from any thread without synchronization.
//!
//! ```
//! use localcache::codec::Codec;
//! use localcache::error::CodecError;
//!
//! let codec: Codec<String> = Codec::new(
//!     |v: &String| Ok(v.as_bytes().to_vec()),
//!     |b: &[u8]| String::from_utf8(b.to_vec()).map_err(|e| CodecError::new(e.to_string())),
//! );
//! let bytes = codec.encode(&"hi".to_string()).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), "hi");
//! ```

use crate::error::{CacheError, CodecError, Result};
use std::fmt;
use std::sync::Arc;

/// Serializer hook: turns a value into its stored byte form.
pub type SerializeFn<V> =
    Arc<dyn Fn(&V) -> std::result::Result<Vec<u8>, CodecError> + Send + Sync>;

/// Deserializer hook: rebuilds a value from its stored byte form.
pub type DeserializeFn<V> =
    Arc<dyn Fn(&[u8]) -> std::result::Result<V, CodecError> + Send + Sync>;

/// A symmetric serializer/deserializer pair applied around storage.
pub struct Codec<V> {
    serialize: SerializeFn<V>,
    deserialize: DeserializeFn<V>,
}

impl<V> Codec<V> {
    /// Creates a codec from a serializer and a deserializer.
    pub fn new<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&V) -> std::result::Result<Vec<u8>, CodecError> + Send + Sync + 'static,
        D: Fn(&[u8]) -> std::result::Result<V, CodecError> + Send + Sync + 'static,
    {
        Self {
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    /// Creates a codec from already shared hooks.
    pub fn from_parts(serialize: SerializeFn<V>, deserialize: DeserializeFn<V>) -> Self {
        Self {
            serialize,
            deserialize,
        }
    }

    /// Splits the codec back into its hooks.
    pub fn into_parts(self) -> (SerializeFn<V>, DeserializeFn<V>) {
        (self.serialize, self.deserialize)
    }

    /// Encodes a value with the serializer hook.
    pub fn encode(&self, value: &V) -> std::result::Result<Vec<u8>, CodecError> {
        (self.serialize)(value)
    }

    /// Decodes a stored buffer with the deserializer hook.
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<V, CodecError> {
        (self.deserialize)(bytes)
    }
}

impl<V> Clone for Codec<V> {
    fn clone(&self) -> Self {
        Self {
            serialize: Arc::clone(&self.serialize),
            deserialize: Arc::clone(&self.deserialize),
        }
    }
}

impl<V> fmt::Debug for Codec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

/// Returns a codec that stores values as JSON documents.
///
/// This is the default codec for any `serde` type.
///
/// ```
/// use localcache::codec;
///
/// let codec = codec::json::<Vec<u32>>();
/// let bytes = codec.encode(&vec![1, 2, 3]).unwrap();
/// assert_eq!(bytes, b"[1,2,3]");
/// assert_eq!(codec.decode(&bytes).unwrap(), vec![1, 2, 3]);
/// ```
#[cfg(feature = "serde")]
pub fn json<V>() -> Codec<V>
where
    V: serde::Serialize + serde::de::DeserializeOwned + 'static,
{
    Codec::new(
        |value: &V| serde_json::to_vec(value).map_err(CodecError::from),
        |bytes: &[u8]| serde_json::from_slice(bytes).map_err(CodecError::from),
    )
}

/// The form a value takes inside the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoredValue<V> {
    Plain(V),
    Encoded(Vec<u8>),
}

impl<V: Clone> StoredValue<V> {
    /// Converts a caller value into its stored form, serializing if a codec
    /// is configured.
    pub(crate) fn store(codec: Option<&Codec<V>>, value: V) -> Result<Self> {
        match codec {
            Some(codec) => codec
                .encode(&value)
                .map(StoredValue::Encoded)
                .map_err(CacheError::Serialize),
            None => Ok(StoredValue::Plain(value)),
        }
    }

    /// Produces the caller-facing value, deserializing if needed.
    pub(crate) fn load(&self, codec: Option<&Codec<V>>) -> Result<V> {
        match (self, codec) {
            (StoredValue::Plain(value), _) => Ok(value.clone()),
            (StoredValue::Encoded(bytes), Some(codec)) => {
                codec.decode(bytes).map_err(CacheError::Deserialize)
            }
            (StoredValue::Encoded(_), None) => Err(CacheError::Deserialize(CodecError::new(
                "no deserializer configured for encoded value",
            ))),
        }
    }
}
