//! Wire protocol for Matchforge.
//!
//! This crate defines what rooms and their clients exchange:
//!
//! - **Types** ([`UserId`], [`RoomStatus`], [`RoomRequest`], etc.): ids,
//!   the room lifecycle enum, and inbound requests.
//! - **State** ([`RoomSnapshot`], [`ParticipantState`], [`RoundRecord`]):
//!   the snapshot broadcast after every room mutation.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about room rules; it only describes
//! and (de)serializes data.

mod codec;
mod error;
mod state;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use state::{ParticipantState, RoomSnapshot, RoundRecord};
pub use types::{
    HitOutcome, ItemId, RoomId, RoomRequest, RoomStatus, ScoreSubmission, UserId,
};
