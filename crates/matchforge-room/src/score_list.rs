//! Streaming point accumulation without full round records.
//!
//! A [`ScoreList`] only remembers, per user, the running point total and
//! the placements in the order they were added. Entry `i` of the history
//! is round `i + 1`, so callers must add exactly one placement per user
//! per round, in round order. Ranking goes through the same
//! [`compare_standings`](crate::compare_standings) as the room itself.

use std::collections::BTreeMap;

use matchforge_protocol::UserId;

use crate::placement::{sort_standings, Standing};

/// One user's running total in a [`ScoreList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScore {
    pub user_id: UserId,
    /// Rank after the last [`ScoreList::adjust_placements`], `None` before.
    pub placement: Option<i32>,
    pub points: i32,
    pub round_placements: Vec<i32>,
}

impl UserScore {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            placement: None,
            points: 0,
            round_placements: Vec::new(),
        }
    }
}

impl Standing for UserScore {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn points(&self) -> i32 {
        self.points
    }

    fn placement_in(&self, round: i32) -> Option<i32> {
        let index = usize::try_from(round - 1).ok()?;
        self.round_placements.get(index).copied()
    }

    fn last_round(&self) -> i32 {
        self.round_placements.len() as i32
    }
}

/// Point totals for a set of users, ranked on demand.
#[derive(Debug, Clone, Default)]
pub struct ScoreList {
    scores: BTreeMap<UserId, UserScore>,
}

impl ScoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `placement` to the user's history and adds `points` to
    /// their total, creating the entry on first use.
    pub fn add_points(&mut self, user_id: UserId, placement: i32, points: i32) {
        let entry = self
            .scores
            .entry(user_id)
            .or_insert_with(|| UserScore::new(user_id));
        entry.round_placements.push(placement);
        entry.points += points;
    }

    /// Re-ranks every entry and stores the 1-based rank in `placement`.
    pub fn adjust_placements(&mut self) {
        let mut ordered: Vec<&mut UserScore> = self.scores.values_mut().collect();
        sort_standings(&mut ordered);
        for (rank, score) in ordered.into_iter().enumerate() {
            score.placement = Some(rank as i32 + 1);
        }
    }

    pub fn get(&self, user_id: UserId) -> Option<&UserScore> {
        self.scores.get(&user_id)
    }

    /// Entries in standings order.
    pub fn ranked(&self) -> Vec<&UserScore> {
        let mut ordered: Vec<&UserScore> = self.scores.values().collect();
        sort_standings(&mut ordered);
        ordered
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_points_accumulates() {
        let mut list = ScoreList::new();
        list.add_points(UserId(1), 2, 7);
        list.add_points(UserId(1), 1, 8);

        let score = list.get(UserId(1)).unwrap();
        assert_eq!(score.points, 15);
        assert_eq!(score.round_placements, vec![2, 1]);
        assert_eq!(score.placement, None);
    }

    #[test]
    fn test_adjust_placements_points_then_history_then_id() {
        let mut list = ScoreList::new();
        // Round 1
        list.add_points(UserId(3), 1, 8);
        list.add_points(UserId(1), 2, 7);
        list.add_points(UserId(2), 2, 7);
        // Round 2
        list.add_points(UserId(3), 3, 6);
        list.add_points(UserId(1), 1, 8);
        list.add_points(UserId(2), 1, 8);

        list.adjust_placements();

        // 3 ends on 14; 1 and 2 on 15 with identical histories.
        assert_eq!(list.get(UserId(1)).unwrap().placement, Some(1));
        assert_eq!(list.get(UserId(2)).unwrap().placement, Some(2));
        assert_eq!(list.get(UserId(3)).unwrap().placement, Some(3));
    }

    #[test]
    fn test_earliest_round_decides_equal_points() {
        let mut list = ScoreList::new();
        list.add_points(UserId(1), 2, 7);
        list.add_points(UserId(2), 1, 8);
        list.add_points(UserId(1), 1, 8);
        list.add_points(UserId(2), 2, 7);

        let order: Vec<UserId> = list.ranked().iter().map(|s| s.user_id).collect();
        assert_eq!(order, vec![UserId(2), UserId(1)]);
    }

    #[test]
    fn test_empty_list() {
        let mut list = ScoreList::new();
        list.adjust_placements();
        assert!(list.is_empty());
        assert!(list.ranked().is_empty());
    }
}
