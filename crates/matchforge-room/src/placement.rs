//! Turning raw round results into placements, points, and standings.
//!
//! Two pieces live here:
//!
//! - [`PlacementEngine`] ranks one round's scores with competition
//!   ranking ("1, 1, 1, 4") and looks up the points each placement earns.
//! - [`compare_standings`] orders participants across the whole room.
//!   It works over anything implementing [`Standing`], so the full
//!   round-history model and the lightweight [`ScoreList`](crate::ScoreList)
//!   are ranked by literally the same code.

use std::cmp::Ordering;

use matchforge_protocol::{ParticipantState, ScoreSubmission, UserId};

use crate::config::DEFAULT_POINTS_TABLE;

// ---------------------------------------------------------------------------
// Standing
// ---------------------------------------------------------------------------

/// The data the aggregate comparator needs about one competitor.
pub trait Standing {
    fn user_id(&self) -> UserId;

    /// Cumulative points.
    fn points(&self) -> i32;

    /// Placement in round `round` (1-based), if one was recorded.
    fn placement_in(&self, round: i32) -> Option<i32>;

    /// Highest round number with any recorded data, 0 if none.
    fn last_round(&self) -> i32;
}

impl Standing for ParticipantState {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn points(&self) -> i32 {
        self.points
    }

    fn placement_in(&self, round: i32) -> Option<i32> {
        self.round(round).map(|record| record.placement)
    }

    fn last_round(&self) -> i32 {
        self.rounds.last_key_value().map_or(0, |(round, _)| *round)
    }
}

impl<S: Standing + ?Sized> Standing for &S {
    fn user_id(&self) -> UserId {
        (**self).user_id()
    }

    fn points(&self) -> i32 {
        (**self).points()
    }

    fn placement_in(&self, round: i32) -> Option<i32> {
        (**self).placement_in(round)
    }

    fn last_round(&self) -> i32 {
        (**self).last_round()
    }
}

impl<S: Standing + ?Sized> Standing for &mut S {
    fn user_id(&self) -> UserId {
        (**self).user_id()
    }

    fn points(&self) -> i32 {
        (**self).points()
    }

    fn placement_in(&self, round: i32) -> Option<i32> {
        (**self).placement_in(round)
    }

    fn last_round(&self) -> i32 {
        (**self).last_round()
    }
}

/// Orders two competitors for the room standings. `Less` means `a` ranks
/// ahead of `b`.
///
/// 1. More points first.
/// 2. Walk rounds from 1 upward; the first round where the two differ
///    decides: the better (lower) placement wins, and having a placement
///    beats having none.
/// 3. Lower user id first.
///
/// Only two states with the same user id compare `Equal`.
pub fn compare_standings<S: Standing + ?Sized>(a: &S, b: &S) -> Ordering {
    b.points()
        .cmp(&a.points())
        .then_with(|| compare_history(a, b))
        .then_with(|| a.user_id().cmp(&b.user_id()))
}

fn compare_history<S: Standing + ?Sized>(a: &S, b: &S) -> Ordering {
    let last = a.last_round().max(b.last_round());
    for round in 1..=last {
        match (a.placement_in(round), b.placement_in(round)) {
            (Some(pa), Some(pb)) if pa != pb => return pa.cmp(&pb),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

/// Sorts `items` into standings order. Works on owned values and on
/// borrowed views (`&S`, `&mut S`) alike.
pub fn sort_standings<S: Standing>(items: &mut [S]) {
    items.sort_by(compare_standings);
}

/// Returns user ids in standings order without reordering the source.
pub fn standings_order<'a, S, I>(items: I) -> Vec<UserId>
where
    S: Standing + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut refs: Vec<&S> = items.into_iter().collect();
    sort_standings(&mut refs);
    refs.into_iter().map(|s| s.user_id()).collect()
}

// ---------------------------------------------------------------------------
// PlacementEngine
// ---------------------------------------------------------------------------

/// One user's outcome for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPlacement {
    pub user_id: UserId,
    pub placement: i32,
    pub points: i32,
}

/// Ranks a round's scores and awards points.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    points_table: Vec<i32>,
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new(DEFAULT_POINTS_TABLE.to_vec())
    }
}

impl PlacementEngine {
    pub fn new(points_table: Vec<i32>) -> Self {
        Self { points_table }
    }

    /// Points for a 1-based placement. Out-of-table placements earn 0.
    pub fn points_for(&self, placement: i32) -> i32 {
        usize::try_from(placement - 1)
            .ok()
            .and_then(|index| self.points_table.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Competition-ranks `results` by total score, highest first.
    ///
    /// Equal scores share a placement and the next distinct score skips
    /// ahead by the size of the tie: `[100, 100, 100, 50]` places
    /// `1, 1, 1, 4`. Output is ordered by placement, then user id.
    pub fn score_round(&self, results: &[ScoreSubmission]) -> Vec<RoundPlacement> {
        let mut sorted: Vec<&ScoreSubmission> = results.iter().collect();
        sorted.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let mut placements = Vec::with_capacity(sorted.len());
        let mut placement = 0;
        let mut previous: Option<i64> = None;
        for (index, result) in sorted.into_iter().enumerate() {
            if previous != Some(result.total_score) {
                placement = index as i32 + 1;
                previous = Some(result.total_score);
            }
            placements.push(RoundPlacement {
                user_id: result.user_id,
                placement,
                points: self.points_for(placement),
            });
        }
        placements
    }
}
