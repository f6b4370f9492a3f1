//! Narrowing the round's picks down to the item that gets played.
//!
//! Everything here is a pure function of its arguments. Randomness comes
//! from a caller-supplied seed (or RNG), never a global source, so a given
//! room and round always roll the same way.

use std::collections::BTreeMap;

use matchforge_protocol::{ItemId, RoomId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::RoomError;

/// Golden-ratio multiplier used to spread room ids across the seed space.
const SEED_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// The result of a roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Every item that was still in the running, ascending by id when they
    /// came from picks, playlist order otherwise.
    pub candidates: Vec<ItemId>,
    /// The item that will be played.
    pub final_item: ItemId,
    /// `true` if every participant picked `final_item`.
    pub unanimous: bool,
}

/// Derives the roll seed for a room's round.
pub fn roll_seed(room_id: RoomId, round: i32, salt: u64) -> u64 {
    room_id.0.wrapping_mul(SEED_MULTIPLIER) ^ (round as u64) ^ salt
}

/// Rolls using a [`StdRng`] seeded with `seed`.
///
/// See [`compute_with`] for the selection rules.
pub fn compute(
    tally: &BTreeMap<ItemId, usize>,
    participant_count: usize,
    playlist: &[ItemId],
    seed: u64,
) -> Result<RollOutcome, RoomError> {
    let mut rng = StdRng::seed_from_u64(seed);
    compute_with(tally, participant_count, playlist, &mut rng)
}

/// Rolls with an injected random source.
///
/// Candidates are all items tied for the highest tally. With no picks at
/// all, every playlist item is a candidate. A single candidate wins
/// outright; otherwise one is drawn uniformly from `rng`.
///
/// # Errors
/// [`RoomError::EmptyCandidateSet`] if there are no picks and the
/// playlist is empty.
pub fn compute_with<R: Rng>(
    tally: &BTreeMap<ItemId, usize>,
    participant_count: usize,
    playlist: &[ItemId],
    rng: &mut R,
) -> Result<RollOutcome, RoomError> {
    let top = tally.values().copied().max().unwrap_or(0);

    let candidates: Vec<ItemId> = if top == 0 {
        let mut items = Vec::with_capacity(playlist.len());
        for item in playlist {
            if !items.contains(item) {
                items.push(*item);
            }
        }
        items
    } else {
        tally
            .iter()
            .filter(|(_, count)| **count == top)
            .map(|(item, _)| *item)
            .collect()
    };

    let final_item = match candidates.as_slice() {
        [] => return Err(RoomError::EmptyCandidateSet),
        [only] => *only,
        many => many[rng.random_range(0..many.len())],
    };

    Ok(RollOutcome {
        unanimous: top > 0 && top == participant_count,
        candidates,
        final_item,
    })
}
