//! Error types for the room layer.
//!
//! Every variant is returned from a call that left the room untouched:
//! validation always runs to completion before anything is mutated.

use matchforge_protocol::{ItemId, RoomId, RoomStatus, UserId};

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The requested status change is not a forward edge from the
    /// current status.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: RoomStatus, to: RoomStatus },

    /// The operation names a user who is not a participant.
    #[error("user {0} is not a participant")]
    UnknownUser(UserId),

    /// Scores for this round were already recorded.
    #[error("scores for round {round} were already submitted")]
    DuplicateScoreSubmission { round: i32 },

    /// Nothing could be rolled: no user picked anything and the playlist
    /// is empty.
    #[error("no eligible items to roll from")]
    EmptyCandidateSet,

    /// Scores were submitted for a round other than the current one.
    #[error("scores for round {got} submitted during round {expected}")]
    RoundMismatch { expected: i32, got: i32 },

    /// The picked item is not on the playlist (or not in the user's hand).
    #[error("user {user} cannot pick item {item}")]
    UnknownItem { user: UserId, item: ItemId },

    /// Picks are only accepted during `UserPicks`.
    #[error("selections are closed while the room is in {0}")]
    SelectionClosed(RoomStatus),

    /// Scores are only accepted during `Gameplay` or `RoundEnd`.
    #[error("scores cannot be recorded while the room is in {0}")]
    ScoringClosed(RoomStatus),

    /// A submitted score is malformed.
    #[error("invalid score: {0}")]
    InvalidScore(String),

    /// The roster is fixed once the first round has started.
    #[error("roster is locked while the room is in {0}")]
    RosterLocked(RoomStatus),

    /// The user is already in this room.
    #[error("user {0} already in room {1}")]
    AlreadyInRoom(UserId, RoomId),

    /// The room's config can't drive scoring.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
