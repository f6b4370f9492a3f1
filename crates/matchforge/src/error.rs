//! Unified error type for Matchforge.

use std::path::PathBuf;

use matchforge_protocol::ProtocolError;
use matchforge_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MatchforgeError {
    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (bad transition, unknown user, closed phase).
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
