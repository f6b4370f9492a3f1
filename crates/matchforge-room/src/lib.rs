//! Matchmaking room coordination for Matchforge.
//!
//! A room takes a fixed roster through rounds of pick → play → score and
//! keeps the standings. Each room runs as an isolated Tokio task (actor
//! model) that owns a synchronous [`RoomStateMachine`].
//!
//! # Key types
//!
//! - [`RoomStateMachine`]: status transitions, picks, scoring, standings
//! - [`PlacementEngine`]: per-round competition ranking and points
//! - [`compare_standings`]: the aggregate order, shared with [`ScoreList`]
//! - [`SelectionLedger`]: live picks during `UserPicks`
//! - [`roll`]: narrowing picks to the round's item
//! - [`RoomManager`] / [`RoomHandle`]: spawn rooms and talk to them
//! - [`MatchConfig`]: points table, playlist, seeds

mod config;
mod error;
mod machine;
mod manager;
mod placement;
pub mod roll;
mod room;
mod score_list;
mod selection;

pub use config::{MatchConfig, DEFAULT_CHANNEL_SIZE, DEFAULT_POINTS_TABLE};
pub use error::RoomError;
pub use machine::RoomStateMachine;
pub use manager::RoomManager;
pub use placement::{
    compare_standings, sort_standings, standings_order, PlacementEngine, RoundPlacement,
    Standing,
};
pub use roll::RollOutcome;
pub use room::{RoomHandle, RoomInfo, SnapshotSender};
pub use score_list::{ScoreList, UserScore};
pub use selection::SelectionLedger;
