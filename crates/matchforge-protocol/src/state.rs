//! Room state as it is broadcast to clients and persisted.
//!
//! These structs are the snapshot shape: a [`RoomSnapshot`] is a complete,
//! self-consistent copy of a room, taken after a mutation has been fully
//! applied. Field names are camelCase on the wire.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{HitOutcome, ItemId, ProtocolError, RoomId, RoomStatus, UserId};

// ---------------------------------------------------------------------------
// RoundRecord
// ---------------------------------------------------------------------------

/// One user's finalized result for one round.
///
/// Written once when the round's scores are recorded and never touched
/// again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    /// 1-based competition rank within the round.
    pub placement: i32,
    pub total_score: i64,
    pub accuracy: f64,
    pub max_combo: i32,
    #[serde(default)]
    pub statistics: BTreeMap<HitOutcome, i32>,
}

// ---------------------------------------------------------------------------
// ParticipantState
// ---------------------------------------------------------------------------

/// Everything a room knows about one of its users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantState {
    pub user_id: UserId,

    /// Aggregate rank across the room, `None` until the first ranking pass.
    pub placement: Option<i32>,

    /// Cumulative points from every recorded round.
    pub points: i32,

    /// Round number (1-based) → result. Users who did not submit a score
    /// for a round have no entry for it.
    #[serde(default)]
    pub rounds: BTreeMap<i32, RoundRecord>,

    /// Items this user may pick from. Empty means "anything on the playlist".
    #[serde(default)]
    pub hand: BTreeSet<ItemId>,

    #[serde(default)]
    pub life: i32,

    /// `false` once the user's connection has gone away. The record stays
    /// so standings remain continuous.
    #[serde(default = "default_connected")]
    pub connected: bool,
}

fn default_connected() -> bool {
    true
}

impl ParticipantState {
    /// A fresh participant with no history.
    pub fn new(user_id: UserId, life: i32) -> Self {
        Self {
            user_id,
            placement: None,
            points: 0,
            rounds: BTreeMap::new(),
            hand: BTreeSet::new(),
            life,
            connected: true,
        }
    }

    /// The recorded result for `round`, if any.
    pub fn round(&self, round: i32) -> Option<&RoundRecord> {
        self.rounds.get(&round)
    }

    /// Checks that every recorded round lies in `1..=current_round` and
    /// that the stored points never go negative.
    pub fn validate_rounds(&self, current_round: i32) -> Result<(), ProtocolError> {
        if let Some((&first, _)) = self.rounds.first_key_value() {
            if first < 1 {
                return Err(ProtocolError::InvalidMessage(format!(
                    "user {} has a record for round {first}",
                    self.user_id
                )));
            }
        }
        if let Some((&last, _)) = self.rounds.last_key_value() {
            if last > current_round {
                return Err(ProtocolError::InvalidMessage(format!(
                    "user {} has a record for round {last} beyond current round {current_round}",
                    self.user_id
                )));
            }
        }
        if self.points < 0 {
            return Err(ProtocolError::InvalidMessage(format!(
                "user {} has negative points",
                self.user_id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RoomSnapshot
// ---------------------------------------------------------------------------

/// A complete copy of a room's state.
///
/// `version` increases by one on every successful mutation, so clients
/// receiving the same snapshot twice can drop the duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub version: u64,
    pub room_id: RoomId,
    pub room_status: RoomStatus,
    pub round: i32,
    #[serde(default)]
    pub candidate_items: Vec<ItemId>,
    pub final_item: Option<ItemId>,
    #[serde(default)]
    pub users: BTreeMap<UserId, ParticipantState>,
    /// Live picks for the current round.
    #[serde(default)]
    pub selections: BTreeMap<UserId, ItemId>,
}

impl RoomSnapshot {
    /// Structural checks for a snapshot that arrived from outside (e.g.
    /// restored from storage): map keys agree with the embedded ids and
    /// round history is consistent with the room's round counter.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.round < 0 {
            return Err(ProtocolError::InvalidMessage(format!(
                "negative round {}",
                self.round
            )));
        }
        for (key, user) in &self.users {
            if *key != user.user_id {
                return Err(ProtocolError::InvalidMessage(format!(
                    "users map key {key} does not match user id {}",
                    user.user_id
                )));
            }
            user.validate_rounds(self.round)?;
        }
        if let Some(stray) = self.selections.keys().find(|u| !self.users.contains_key(u)) {
            return Err(ProtocolError::InvalidMessage(format!(
                "selection from unknown user {stray}"
            )));
        }
        if let Some(item) = self.final_item {
            if !self.candidate_items.is_empty() && !self.candidate_items.contains(&item) {
                return Err(ProtocolError::InvalidMessage(format!(
                    "final item {item} is not among the candidates"
                )));
            }
        }
        Ok(())
    }
}
