//! Scripted match: drives a real room actor through a fixed sequence of
//! rounds. Used by the `matchforge-sim` binary and as a smoke test.

use matchforge_protocol::{ItemId, RoomSnapshot, RoomStatus, ScoreSubmission, UserId};
use matchforge_room::RoomHandle;

use crate::MatchforgeError;

/// One scripted round: a total score per user, in roster order.
pub struct ScriptedRound {
    pub scores: Vec<(UserId, i64)>,
}

/// The default two-round script for users 1 to 4.
///
/// Round one has a tie at the top, round two a tie in the middle. The
/// final standings are users 1, 2, 3, 4 on 16, 15, 13 and 10 points.
pub fn default_script() -> (Vec<UserId>, Vec<ScriptedRound>) {
    let users: Vec<UserId> = (1..=4).map(UserId).collect();
    let rounds = vec![
        ScriptedRound {
            scores: vec![
                (UserId(1), 1000),
                (UserId(2), 1000),
                (UserId(3), 500),
                (UserId(4), 0),
            ],
        },
        ScriptedRound {
            scores: vec![
                (UserId(1), 900),
                (UserId(2), 200),
                (UserId(3), 200),
                (UserId(4), 100),
            ],
        },
    ];
    (users, rounds)
}

/// Plays every round of `script` in the room behind `handle`, then ends
/// the room. Returns the final snapshot.
///
/// In round `n`, user `i` of the script picks `playlist[(i + n) % len]`,
/// so picks spread across the playlist. With an empty playlist nobody
/// picks and the roll has nothing to choose from.
pub async fn run(
    handle: &RoomHandle,
    playlist: &[ItemId],
    script: &[ScriptedRound],
) -> Result<RoomSnapshot, MatchforgeError> {
    for (n, round) in script.iter().enumerate() {
        handle.advance_round().await?;
        handle.request_transition(RoomStatus::UserPicks).await?;

        if !playlist.is_empty() {
            for (i, (user_id, _)) in round.scores.iter().enumerate() {
                let item = playlist[(i + n) % playlist.len()];
                handle.submit_selection(*user_id, Some(item)).await?;
            }
        }

        for status in [
            RoomStatus::SelectBeatmap,
            RoomStatus::PrepareBeatmap,
            RoomStatus::PrepareGameplay,
            RoomStatus::Gameplay,
        ] {
            handle.request_transition(status).await?;
        }

        let snapshot = handle.snapshot().await?;
        let results = round
            .scores
            .iter()
            .map(|(user_id, total)| ScoreSubmission {
                user_id: *user_id,
                total_score: *total,
                accuracy: 1.0,
                max_combo: 0,
                statistics: Default::default(),
            })
            .collect();
        handle.submit_scores(snapshot.round, results).await?;
        handle.request_transition(RoomStatus::RoundEnd).await?;

        tracing::info!(
            room_id = %handle.room_id(),
            round = snapshot.round,
            item = ?snapshot.final_item,
            "round played"
        );
    }

    handle.request_transition(RoomStatus::RoomEnd).await?;
    handle.snapshot().await.map_err(Into::into)
}
