//! # Matchforge
//!
//! Matchmaking room coordination for rhythm-game matches.
//!
//! A room takes a fixed roster through rounds: users pick items, one item
//! is rolled from the picks, everyone plays it, and the submitted scores are
//! turned into per-round placements and points. The room keeps cumulative
//! standings and pushes a [`RoomSnapshot`] to every subscriber after each
//! change.
//!
//! This crate ties the pieces together: it re-exports the protocol and
//! room crates, and adds a unified error type, logging setup, and JSON
//! config loading.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use matchforge::prelude::*;
//!
//! # async fn demo() -> Result<(), MatchforgeError> {
//! matchforge::logging::init();
//! let config = matchforge::config::load("config/match.json")?;
//!
//! let mut rooms = RoomManager::new();
//! let room = rooms.create_room_with_roster(config, vec![UserId(1), UserId(2)])?;
//! rooms.route_request(UserId(1), RoomRequest::AdvanceRound).await?;
//! println!("{:?}", rooms.snapshot(room).await?.room_status);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod logging;
pub mod sim;

pub use error::MatchforgeError;

pub use matchforge_protocol as protocol;
pub use matchforge_room as room;

/// Everything needed to run rooms, in one import.
pub mod prelude {
    pub use crate::MatchforgeError;
    pub use matchforge_protocol::{
        Codec, HitOutcome, ItemId, JsonCodec, ParticipantState, RoomId, RoomRequest,
        RoomSnapshot, RoomStatus, RoundRecord, ScoreSubmission, UserId,
    };
    pub use matchforge_room::{
        MatchConfig, RoomError, RoomHandle, RoomInfo, RoomManager, RoomStateMachine,
        SnapshotSender,
    };
}
