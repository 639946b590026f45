//! Codec trait and implementations for persisting session records.
//!
//! A session store that lives outside the process (Redis, for example)
//! needs [`CachedSession`](crate::CachedSession) as bytes. The store
//! doesn't care HOW the record is serialized, only that something
//! implements [`Codec`].

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec is owned by a store that is
/// shared across every request task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON keeps store entries readable from `redis-cli`, which is worth the
/// extra bytes for records this small.
///
/// ## Example
///
/// ```rust
/// use tokenward_protocol::{Codec, Identity, JsonCodec};
///
/// let codec = JsonCodec;
/// let identity = Identity::new(1, "alice").with_role("admin");
///
/// let bytes = codec.encode(&identity).unwrap();
/// let decoded: Identity = codec.decode(&bytes).unwrap();
/// assert_eq!(identity, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
