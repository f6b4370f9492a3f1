//! Error types for the protocol layer.
//!
//! Each crate in Matchforge defines its own error enum. A `ProtocolError`
//! always means the problem is in turning values into bytes (or back), or
//! in a decoded value that breaks a structural rule.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// wrong data types, or truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but violates a protocol rule, e.g. an unknown
    /// status discriminant or a snapshot whose round history runs past
    /// its round counter.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
