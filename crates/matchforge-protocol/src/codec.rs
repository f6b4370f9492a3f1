//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and raw bytes. Rooms hand their
//! snapshots to whatever [`Codec`] the session layer picked; swapping the
//! format never touches room code.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec is shared by every connection
/// task on the runtime.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
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
/// Integer map keys (user ids, round numbers, hit outcomes) become JSON
/// object keys and are parsed back losslessly.
///
/// ## Example
///
/// ```rust
/// use matchforge_protocol::{Codec, JsonCodec, RoomRequest, RoomStatus};
///
/// let codec = JsonCodec;
/// let request = RoomRequest::RequestTransition { target: RoomStatus::UserPicks };
///
/// let bytes = codec.encode(&request).unwrap();
/// let decoded: RoomRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(request, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
