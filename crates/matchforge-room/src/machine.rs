//! The room state machine: the only code allowed to change a room.
//!
//! [`RoomStateMachine`] is synchronous and owns all room state. Every
//! mutating method validates its input in full before touching anything,
//! so an `Err` always means the room (including its version counter) is
//! exactly as it was. The actor in [`room`](crate::room) serializes calls
//! into it and broadcasts a snapshot whenever [`version`] moves.
//!
//! [`version`]: RoomStateMachine::version

use std::collections::{BTreeMap, BTreeSet, HashSet};

use matchforge_protocol::{
    ItemId, ParticipantState, RoomId, RoomRequest, RoomSnapshot, RoomStatus, RoundRecord,
    ScoreSubmission, UserId,
};

use crate::placement::{sort_standings, PlacementEngine, RoundPlacement};
use crate::roll::{self, RollOutcome};
use crate::{MatchConfig, RoomError, SelectionLedger};

/// Server-authoritative state of one matchmaking room.
#[derive(Debug, Clone)]
pub struct RoomStateMachine {
    room_id: RoomId,
    config: MatchConfig,
    engine: PlacementEngine,
    version: u64,
    status: RoomStatus,
    round: i32,
    candidate_items: Vec<ItemId>,
    final_item: Option<ItemId>,
    participants: BTreeMap<UserId, ParticipantState>,
    ledger: SelectionLedger,
    /// Rounds whose scores have been recorded.
    scored_rounds: BTreeSet<i32>,
}

impl RoomStateMachine {
    /// A room in `RoomStart` with no participants.
    ///
    /// # Errors
    /// [`RoomError::InvalidConfig`] if `config` fails
    /// [`MatchConfig::validate`].
    pub fn new(room_id: RoomId, config: MatchConfig) -> Result<Self, RoomError> {
        config.validate()?;
        let engine = PlacementEngine::new(config.points_table.clone());
        Ok(Self {
            room_id,
            config,
            engine,
            version: 0,
            status: RoomStatus::RoomStart,
            round: 0,
            candidate_items: Vec::new(),
            final_item: None,
            participants: BTreeMap::new(),
            ledger: SelectionLedger::new(),
            scored_rounds: BTreeSet::new(),
        })
    }

    /// A room in `RoomStart` with `roster` already joined. Duplicate ids
    /// in the roster are joined once.
    pub fn with_roster(
        room_id: RoomId,
        config: MatchConfig,
        roster: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, RoomError> {
        let mut machine = Self::new(room_id, config)?;
        for user_id in roster {
            let life = machine.config.starting_life;
            machine
                .participants
                .entry(user_id)
                .or_insert_with(|| ParticipantState::new(user_id, life));
        }
        Ok(machine)
    }

    // -- Accessors --

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn round(&self) -> i32 {
        self.round
    }

    /// Increases by one on every successful mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn participant(&self, user_id: UserId) -> Option<&ParticipantState> {
        self.participants.get(&user_id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn ledger(&self) -> &SelectionLedger {
        &self.ledger
    }

    pub fn candidate_items(&self) -> &[ItemId] {
        &self.candidate_items
    }

    pub fn final_item(&self) -> Option<ItemId> {
        self.final_item
    }

    /// Participants in standings order. Once the room has reached
    /// `RoomEnd` these are the final results.
    pub fn standings(&self) -> Vec<&ParticipantState> {
        let mut ordered: Vec<&ParticipantState> = self.participants.values().collect();
        sort_standings(&mut ordered);
        ordered
    }

    /// A complete copy of the room as clients see it.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            version: self.version,
            room_id: self.room_id,
            room_status: self.status,
            round: self.round,
            candidate_items: self.candidate_items.clone(),
            final_item: self.final_item,
            users: self.participants.clone(),
            selections: self.ledger.selections().clone(),
        }
    }

    // -- Roster --

    /// Adds a participant. Only allowed before the first round starts.
    pub fn add_participant(&mut self, user_id: UserId) -> Result<(), RoomError> {
        if self.status != RoomStatus::RoomStart {
            return Err(RoomError::RosterLocked(self.status));
        }
        if self.participants.contains_key(&user_id) {
            return Err(RoomError::AlreadyInRoom(user_id, self.room_id));
        }
        self.participants.insert(
            user_id,
            ParticipantState::new(user_id, self.config.starting_life),
        );
        self.bump();
        tracing::info!(
            room_id = %self.room_id,
            %user_id,
            participants = self.participants.len(),
            "participant joined"
        );
        Ok(())
    }

    /// Marks a participant as disconnected. Their records and points stay
    /// so the standings remain continuous.
    pub fn participant_left(&mut self, user_id: UserId) -> Result<(), RoomError> {
        let participant = self
            .participants
            .get_mut(&user_id)
            .ok_or(RoomError::UnknownUser(user_id))?;
        if participant.connected {
            participant.connected = false;
            self.bump();
            tracing::info!(room_id = %self.room_id, %user_id, "participant left");
        }
        Ok(())
    }

    /// Replaces a participant's hand. While a hand is non-empty the user
    /// may only pick items from it.
    pub fn assign_hand(
        &mut self,
        user_id: UserId,
        items: impl IntoIterator<Item = ItemId>,
    ) -> Result<(), RoomError> {
        let hand: BTreeSet<ItemId> = items.into_iter().collect();
        let participant = self
            .participants
            .get_mut(&user_id)
            .ok_or(RoomError::UnknownUser(user_id))?;
        if participant.hand != hand {
            participant.hand = hand;
            self.bump();
        }
        Ok(())
    }

    // -- Lifecycle --

    /// Starts the next round. Allowed from `RoomStart` and `RoundEnd`.
    pub fn advance_round(&mut self) -> Result<(), RoomError> {
        if !self.status.can_transition_to(RoomStatus::RoundStart) {
            return Err(self.rejected(RoomStatus::RoundStart));
        }
        self.round += 1;
        self.status = RoomStatus::RoundStart;
        self.ledger.clear();
        self.candidate_items.clear();
        self.final_item = None;
        self.bump();
        tracing::info!(room_id = %self.room_id, round = self.round, "round started");
        Ok(())
    }

    /// Moves to `target` along a forward edge.
    ///
    /// Entering `SelectBeatmap` rolls the round's item from the ledger; if
    /// nothing can be rolled the transition fails with
    /// [`RoomError::EmptyCandidateSet`]. Requesting `RoundStart` is the
    /// same as [`advance_round`](Self::advance_round).
    pub fn transition(&mut self, target: RoomStatus) -> Result<(), RoomError> {
        if target == RoomStatus::RoundStart {
            return self.advance_round();
        }
        if !self.status.can_transition_to(target) {
            return Err(self.rejected(target));
        }

        if target == RoomStatus::SelectBeatmap {
            let outcome = self.roll_candidates().inspect_err(|_| {
                tracing::warn!(
                    room_id = %self.room_id,
                    round = self.round,
                    "no candidates to roll"
                );
            })?;
            tracing::debug!(
                room_id = %self.room_id,
                round = self.round,
                candidates = outcome.candidates.len(),
                final_item = %outcome.final_item,
                unanimous = outcome.unanimous,
                "candidates rolled"
            );
            self.candidate_items = outcome.candidates;
            self.final_item = Some(outcome.final_item);
        }

        let from = self.status;
        self.status = target;
        self.bump();
        tracing::info!(
            room_id = %self.room_id,
            round = self.round,
            %from,
            to = %target,
            "status changed"
        );
        if target.is_terminal() {
            tracing::info!(room_id = %self.room_id, rounds = self.round, "room ended");
        }
        Ok(())
    }

    fn roll_candidates(&self) -> Result<RollOutcome, RoomError> {
        let seed = roll::roll_seed(self.room_id, self.round, self.config.seed_salt);
        roll::compute(
            &self.ledger.tally(),
            self.participants.len(),
            &self.config.playlist,
            seed,
        )
    }

    // -- Picks --

    /// Sets (or clears, with `None`) a user's pick for this round.
    ///
    /// Returns `Ok(false)` when the pick was already in place.
    pub fn set_selection(
        &mut self,
        user_id: UserId,
        item: Option<ItemId>,
    ) -> Result<bool, RoomError> {
        self.check_pick(user_id, item)?;

        let changed = self.ledger.set_selection(user_id, item);
        if changed {
            self.bump();
            tracing::debug!(
                room_id = %self.room_id,
                %user_id,
                item = ?item,
                "selection changed"
            );
        }
        Ok(changed)
    }

    /// Picks `item`, or releases it when it is already the user's pick.
    /// Returns the user's pick afterwards.
    pub fn toggle_selection(
        &mut self,
        user_id: UserId,
        item: ItemId,
    ) -> Result<Option<ItemId>, RoomError> {
        self.check_pick(user_id, Some(item))?;

        let picked = self.ledger.toggle(user_id, item);
        self.bump();
        tracing::debug!(
            room_id = %self.room_id,
            %user_id,
            item = ?picked,
            "selection toggled"
        );
        Ok(picked)
    }

    /// The user exists, picks are open, and `item` (if any) is in the
    /// user's hand, or on the playlist when the hand is empty.
    fn check_pick(&self, user_id: UserId, item: Option<ItemId>) -> Result<(), RoomError> {
        let participant = self
            .participants
            .get(&user_id)
            .ok_or(RoomError::UnknownUser(user_id))?;
        if self.status != RoomStatus::UserPicks {
            return Err(RoomError::SelectionClosed(self.status));
        }
        if let Some(item) = item {
            let allowed = if participant.hand.is_empty() {
                self.config.has_item(item)
            } else {
                participant.hand.contains(&item)
            };
            if !allowed {
                return Err(RoomError::UnknownItem { user: user_id, item });
            }
        }
        Ok(())
    }

    // -- Scoring --

    /// Records scores for `round`, which must be the current round.
    pub fn submit_scores(
        &mut self,
        round: i32,
        results: &[ScoreSubmission],
    ) -> Result<(), RoomError> {
        if round != self.round {
            return Err(RoomError::RoundMismatch {
                expected: self.round,
                got: round,
            });
        }
        self.set_scores(results)
    }

    /// Records the current round's scores: ranks them, awards points,
    /// writes one [`RoundRecord`] per scored user and recomputes the
    /// aggregate placements.
    ///
    /// Accepted once per round, in `Gameplay` or `RoundEnd`. An empty
    /// result set is a no-op. Users absent from `results` get no record
    /// for this round.
    pub fn set_scores(&mut self, results: &[ScoreSubmission]) -> Result<(), RoomError> {
        if results.is_empty() {
            return Ok(());
        }
        if self.scored_rounds.contains(&self.round) {
            return Err(RoomError::DuplicateScoreSubmission { round: self.round });
        }
        if !matches!(self.status, RoomStatus::Gameplay | RoomStatus::RoundEnd) {
            return Err(RoomError::ScoringClosed(self.status));
        }
        self.validate_scores(results)?;

        let placements = self.engine.score_round(results);
        let totals = self.checked_totals(&placements)?;
        let by_user: BTreeMap<UserId, &ScoreSubmission> =
            results.iter().map(|r| (r.user_id, r)).collect();

        for (ranked, total) in placements.iter().zip(totals) {
            let submission = by_user[&ranked.user_id];
            if let Some(participant) = self.participants.get_mut(&ranked.user_id) {
                participant.points = total;
                participant.rounds.insert(
                    self.round,
                    RoundRecord {
                        placement: ranked.placement,
                        total_score: submission.total_score,
                        accuracy: submission.accuracy,
                        max_combo: submission.max_combo,
                        statistics: submission.statistics.clone(),
                    },
                );
            }
        }
        self.scored_rounds.insert(self.round);
        self.rank_participants();
        self.bump();

        tracing::info!(
            room_id = %self.room_id,
            round = self.round,
            scored = placements.len(),
            participants = self.participants.len(),
            "scores recorded"
        );
        Ok(())
    }

    /// Each ranked user's cumulative points after this round, in
    /// `placements` order.
    fn checked_totals(&self, placements: &[RoundPlacement]) -> Result<Vec<i32>, RoomError> {
        placements
            .iter()
            .map(|ranked| {
                let current = self
                    .participants
                    .get(&ranked.user_id)
                    .map_or(0, |p| p.points);
                current.checked_add(ranked.points).ok_or_else(|| {
                    RoomError::InvalidScore(format!(
                        "points for user {} would overflow",
                        ranked.user_id
                    ))
                })
            })
            .collect()
    }

    fn validate_scores(&self, results: &[ScoreSubmission]) -> Result<(), RoomError> {
        let mut seen = HashSet::with_capacity(results.len());
        for result in results {
            if !self.participants.contains_key(&result.user_id) {
                return Err(RoomError::UnknownUser(result.user_id));
            }
            if !seen.insert(result.user_id) {
                return Err(RoomError::InvalidScore(format!(
                    "user {} appears twice",
                    result.user_id
                )));
            }
            if !(0.0..=1.0).contains(&result.accuracy) {
                return Err(RoomError::InvalidScore(format!(
                    "accuracy {} for user {} is outside [0, 1]",
                    result.accuracy, result.user_id
                )));
            }
            if result.total_score < 0 || result.max_combo < 0 {
                return Err(RoomError::InvalidScore(format!(
                    "negative score or combo for user {}",
                    result.user_id
                )));
            }
        }
        Ok(())
    }

    /// Re-ranks every participant and writes their 1-based aggregate
    /// placement. Bumps the version only if some placement moved.
    pub fn aggregate_placements(&mut self) {
        if self.rank_participants() {
            self.bump();
        }
    }

    /// Returns `true` if any placement changed.
    fn rank_participants(&mut self) -> bool {
        let mut ordered: Vec<&mut ParticipantState> = self.participants.values_mut().collect();
        sort_standings(&mut ordered);

        let mut changed = false;
        for (rank, participant) in ordered.into_iter().enumerate() {
            let placement = Some(rank as i32 + 1);
            if participant.placement != placement {
                participant.placement = placement;
                changed = true;
            }
        }
        changed
    }

    // -- Requests --

    /// Applies an inbound request from the session layer.
    pub fn apply(&mut self, request: RoomRequest) -> Result<(), RoomError> {
        match request {
            RoomRequest::SubmitSelection { user_id, item_id } => {
                self.set_selection(user_id, item_id).map(|_| ())
            }
            RoomRequest::ToggleSelection { user_id, item_id } => {
                self.toggle_selection(user_id, item_id).map(|_| ())
            }
            RoomRequest::SubmitScores { round, results } => self.submit_scores(round, &results),
            RoomRequest::RequestTransition { target } => self.transition(target),
            RoomRequest::AdvanceRound => self.advance_round(),
        }
    }

    fn rejected(&self, target: RoomStatus) -> RoomError {
        tracing::debug!(
            room_id = %self.room_id,
            from = %self.status,
            to = %target,
            "transition rejected"
        );
        RoomError::InvalidTransition {
            from: self.status,
            to: target,
        }
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}
