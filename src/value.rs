//! Value codec for the shared backend.
//!
//! The in-process store keeps computed values by ownership; only the shared
//! backend needs them as bytes. Encoding goes through bincode over serde,
//! which round-trips any `Serialize + DeserializeOwned` value to an equal
//! value under host equality.
//!
//! A cached `None::<T>` needs no sentinel: `get` returns `Option<V>`, so a
//! cached inner `None` surfaces as `Some(None)` and is never mistaken for a
//! miss.

use core::fmt;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Value (de)serialization failure. Treated as a cache bypass by the
/// dispatcher, never an error for the caller: the computation's own result
/// is still returned.
#[derive(Debug)]
pub struct CodecError {
    inner: bincode::Error,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value codec: {}", self.inner)
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl From<bincode::Error> for CodecError {
    fn from(inner: bincode::Error) -> Self {
        CodecError { inner }
    }
}

/// Encode a computed result for storage in an entry cell.
pub fn encode_value<V: Serialize>(value: &V) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(CodecError::from)
}

/// Decode a stored cell back into a value.
///
/// Fails if the stored bytes were written by a different type (for example
/// after a deploy changed the cached function's return type); callers treat
/// that as a miss and drop the entry.
pub fn decode_value<V: DeserializeOwned>(bytes: &[u8]) -> Result<V, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::from)
}
