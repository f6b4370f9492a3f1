//! Core protocol types for Matchforge's wire format.
//!
//! Everything in this module travels "on the wire": identifiers, the room
//! status enum, hit outcomes, and the inbound requests a session layer
//! forwards into a room. Integer-valued enums serialize as plain integers
//! so clients in any language can decode them without a string table.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user taking part in a room.
///
/// Newtype over `i32` so a `UserId` can't be confused with a round number
/// or an item id. `#[serde(transparent)]` keeps the wire form a bare
/// integer, which also lets it be used as a JSON map key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a room (one matchmaking session).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A playlist entry (beatmap) that can be picked and played in a round.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle stage of a room.
///
/// Stages only move forward, one round at a time:
///
/// ```text
/// RoomStart → RoundStart → UserPicks → SelectBeatmap → PrepareBeatmap
///           → PrepareGameplay → Gameplay → RoundEnd ─┬→ RoundStart (next round)
///                                                    └→ RoomEnd (terminal)
/// ```
///
/// Serialized as its integer discriminant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum RoomStatus {
    RoomStart = 0,
    RoundStart = 1,
    UserPicks = 2,
    SelectBeatmap = 3,
    PrepareBeatmap = 4,
    PrepareGameplay = 5,
    Gameplay = 6,
    RoundEnd = 7,
    RoomEnd = 8,
}

impl RoomStatus {
    /// Every status, in progression order.
    pub const ALL: [RoomStatus; 9] = [
        Self::RoomStart,
        Self::RoundStart,
        Self::UserPicks,
        Self::SelectBeatmap,
        Self::PrepareBeatmap,
        Self::PrepareGameplay,
        Self::Gameplay,
        Self::RoundEnd,
        Self::RoomEnd,
    ];

    /// The statuses reachable from `self` in a single step.
    pub fn successors(self) -> &'static [RoomStatus] {
        match self {
            Self::RoomStart => &[Self::RoundStart],
            Self::RoundStart => &[Self::UserPicks],
            Self::UserPicks => &[Self::SelectBeatmap],
            Self::SelectBeatmap => &[Self::PrepareBeatmap],
            Self::PrepareBeatmap => &[Self::PrepareGameplay],
            Self::PrepareGameplay => &[Self::Gameplay],
            Self::Gameplay => &[Self::RoundEnd],
            Self::RoundEnd => &[Self::RoundStart, Self::RoomEnd],
            Self::RoomEnd => &[],
        }
    }

    /// Returns `true` if moving to `target` is a documented forward edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.successors().contains(&target)
    }

    /// Returns `true` once the room has finished for good.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::RoomEnd)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RoomStart => "RoomStart",
            Self::RoundStart => "RoundStart",
            Self::UserPicks => "UserPicks",
            Self::SelectBeatmap => "SelectBeatmap",
            Self::PrepareBeatmap => "PrepareBeatmap",
            Self::PrepareGameplay => "PrepareGameplay",
            Self::Gameplay => "Gameplay",
            Self::RoundEnd => "RoundEnd",
            Self::RoomEnd => "RoomEnd",
        };
        f.write_str(name)
    }
}

impl From<RoomStatus> for i32 {
    fn from(status: RoomStatus) -> Self {
        status as i32
    }
}

impl TryFrom<i32> for RoomStatus {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| *status as i32 == value)
            .ok_or_else(|| {
                ProtocolError::InvalidMessage(format!(
                    "unknown room status {value}"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// HitOutcome
// ---------------------------------------------------------------------------

/// A judgement bucket in a play's hit statistics.
///
/// Serialized as its integer discriminant so that `statistics` maps use
/// integer keys on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum HitOutcome {
    None = 0,
    Miss = 1,
    Meh = 2,
    Ok = 3,
    Good = 4,
    Great = 5,
    Perfect = 6,
    SmallTickMiss = 7,
    SmallTickHit = 8,
    LargeTickMiss = 9,
    LargeTickHit = 10,
    SmallBonus = 11,
    LargeBonus = 12,
    IgnoreMiss = 13,
    IgnoreHit = 14,
    ComboBreak = 15,
    SliderTailHit = 16,
}

impl HitOutcome {
    const ALL: [HitOutcome; 17] = [
        Self::None,
        Self::Miss,
        Self::Meh,
        Self::Ok,
        Self::Good,
        Self::Great,
        Self::Perfect,
        Self::SmallTickMiss,
        Self::SmallTickHit,
        Self::LargeTickMiss,
        Self::LargeTickHit,
        Self::SmallBonus,
        Self::LargeBonus,
        Self::IgnoreMiss,
        Self::IgnoreHit,
        Self::ComboBreak,
        Self::SliderTailHit,
    ];
}

impl From<HitOutcome> for i32 {
    fn from(outcome: HitOutcome) -> Self {
        outcome as i32
    }
}

impl TryFrom<i32> for HitOutcome {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|outcome| *outcome as i32 == value)
            .ok_or_else(|| {
                ProtocolError::InvalidMessage(format!(
                    "unknown hit outcome {value}"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Inbound requests
// ---------------------------------------------------------------------------

/// One user's raw result for a round, as reported by the gameplay server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub user_id: UserId,
    pub total_score: i64,
    /// Fraction in `[0, 1]`.
    pub accuracy: f64,
    pub max_combo: i32,
    #[serde(default)]
    pub statistics: std::collections::BTreeMap<HitOutcome, i32>,
}

/// Requests the session layer forwards into a room, after checking that
/// the caller is a member.
///
/// `#[serde(tag = "type")]` gives the internally tagged form
/// `{ "type": "SubmitSelection", "userId": 3, "itemId": 12 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum RoomRequest {
    /// Change (or clear, with `null`) a user's pick for the current round.
    SubmitSelection {
        user_id: UserId,
        item_id: Option<ItemId>,
    },

    /// Pick `item_id`, or release it if it is already the user's pick.
    ToggleSelection { user_id: UserId, item_id: ItemId },

    /// Final results for `round`.
    SubmitScores {
        round: i32,
        results: Vec<ScoreSubmission>,
    },

    /// Move the room to `target` (usually fired by a phase countdown).
    RequestTransition { target: RoomStatus },

    /// Begin the next round.
    AdvanceRound,
}
