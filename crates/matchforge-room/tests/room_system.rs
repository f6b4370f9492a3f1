//! Integration tests for room actors and the room manager.

use std::collections::BTreeMap;

use matchforge_protocol::{
    ItemId, RoomId, RoomRequest, RoomSnapshot, RoomStatus, ScoreSubmission, UserId,
};
use matchforge_room::{MatchConfig, RoomError, RoomManager};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn uid(id: i32) -> UserId {
    UserId(id)
}

fn config() -> MatchConfig {
    MatchConfig::with_playlist([ItemId(10), ItemId(20), ItemId(30)])
}

fn score(user: i32, total: i64) -> ScoreSubmission {
    ScoreSubmission {
        user_id: uid(user),
        total_score: total,
        accuracy: 0.95,
        max_combo: 100,
        statistics: BTreeMap::new(),
    }
}

/// Creates a manager with one four-player room.
fn manager_with_room() -> (RoomManager, RoomId) {
    let mut mgr = RoomManager::new();
    let room = mgr
        .create_room_with_roster(config(), vec![uid(1), uid(2), uid(3), uid(4)])
        .unwrap();
    (mgr, room)
}

async fn walk(mgr: &RoomManager, user: UserId, path: &[RoomStatus]) {
    for target in path {
        mgr.route_request(user, RoomRequest::RequestTransition { target: *target })
            .await
            .unwrap();
    }
}

// =========================================================================
// RoomManager tests
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_unique_ids() {
    let mut mgr = RoomManager::new();
    let r1 = mgr.create_room(MatchConfig::default()).unwrap();
    let r2 = mgr.create_room(MatchConfig::default()).unwrap();
    assert_ne!(r1, r2);
    assert_eq!(mgr.room_count(), 2);

    let mut ids = mgr.room_ids();
    ids.sort();
    assert_eq!(ids, vec![r1.min(r2), r1.max(r2)]);
}

#[tokio::test]
async fn test_roster_room_indexes_users() {
    let (mgr, room) = manager_with_room();

    assert_eq!(mgr.user_room(&uid(3)), Some(room));
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.participant_count, 4);
    assert_eq!(info.status, RoomStatus::RoomStart);
    assert_eq!(info.round, 0);
}

#[tokio::test]
async fn test_roster_member_already_placed_is_rejected() {
    let (mut mgr, room) = manager_with_room();
    let before = mgr.room_count();

    let result = mgr.create_room_with_roster(config(), vec![uid(9), uid(2)]);
    assert_eq!(result, Err(RoomError::AlreadyInRoom(uid(2), room)));
    assert_eq!(mgr.room_count(), before);
    assert_eq!(mgr.user_room(&uid(9)), None);
}

#[tokio::test]
async fn test_invalid_points_table_creates_no_room() {
    let mut mgr = RoomManager::new();
    let negative = MatchConfig {
        points_table: vec![-5, -10],
        ..config()
    };
    let increasing = MatchConfig {
        points_table: vec![1, 2, 3],
        ..config()
    };

    assert!(matches!(
        mgr.create_room(negative.clone()),
        Err(RoomError::InvalidConfig(_))
    ));
    assert!(matches!(
        mgr.create_room_with_roster(increasing, vec![uid(1), uid(2)]),
        Err(RoomError::InvalidConfig(_))
    ));
    assert!(matches!(
        mgr.create_room_with_roster(negative, vec![uid(3)]),
        Err(RoomError::InvalidConfig(_))
    ));
    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.user_room(&uid(1)), None);
    assert_eq!(mgr.user_room(&uid(3)), None);
}

#[tokio::test]
async fn test_join_room_success() {
    let mut mgr = RoomManager::new();
    let room = mgr.create_room(config()).unwrap();

    mgr.join_room(uid(1), room).await.unwrap();

    assert_eq!(mgr.user_room(&uid(1)), Some(room));
    let snapshot = mgr.snapshot(room).await.unwrap();
    assert!(snapshot.users.contains_key(&uid(1)));
}

#[tokio::test]
async fn test_join_room_not_found() {
    let mut mgr = RoomManager::new();
    let result = mgr.join_room(uid(1), RoomId(999_999)).await;
    assert_eq!(result, Err(RoomError::NotFound(RoomId(999_999))));
}

#[tokio::test]
async fn test_join_room_one_room_at_a_time() {
    let mut mgr = RoomManager::new();
    let r1 = mgr.create_room(config()).unwrap();
    let r2 = mgr.create_room(config()).unwrap();

    mgr.join_room(uid(1), r1).await.unwrap();
    let result = mgr.join_room(uid(1), r2).await;
    assert_eq!(result, Err(RoomError::AlreadyInRoom(uid(1), r1)));
}

#[tokio::test]
async fn test_join_after_first_round_is_rejected() {
    let (mut mgr, room) = manager_with_room();
    mgr.route_request(uid(1), RoomRequest::AdvanceRound)
        .await
        .unwrap();

    let result = mgr.join_room(uid(5), room).await;
    assert_eq!(result, Err(RoomError::RosterLocked(RoomStatus::RoundStart)));
    assert_eq!(mgr.user_room(&uid(5)), None);
}

#[tokio::test]
async fn test_disconnect_keeps_participant() {
    let (mgr, room) = manager_with_room();

    mgr.user_disconnected(uid(2)).await.unwrap();

    let snapshot = mgr.snapshot(room).await.unwrap();
    assert!(!snapshot.users[&uid(2)].connected);
    assert!(snapshot.users[&uid(1)].connected);
    assert_eq!(snapshot.users.len(), 4);
}

#[tokio::test]
async fn test_route_request_not_in_room() {
    let mgr = RoomManager::new();
    let result = mgr.route_request(uid(1), RoomRequest::AdvanceRound).await;
    assert_eq!(result, Err(RoomError::UnknownUser(uid(1))));
}

#[tokio::test]
async fn test_rejected_request_reports_error() {
    let (mgr, _room) = manager_with_room();
    let result = mgr
        .route_request(
            uid(1),
            RoomRequest::RequestTransition {
                target: RoomStatus::Gameplay,
            },
        )
        .await;
    assert_eq!(
        result,
        Err(RoomError::InvalidTransition {
            from: RoomStatus::RoomStart,
            to: RoomStatus::Gameplay,
        })
    );
}

#[tokio::test]
async fn test_destroy_room() {
    let (mut mgr, room) = manager_with_room();
    let handle = mgr.room(room).unwrap().clone();

    mgr.destroy_room(room).await.unwrap();

    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.user_room(&uid(1)), None);
    assert!(matches!(mgr.room(room), Err(RoomError::NotFound(_))));
    // The actor is gone; stale handles report it.
    assert_eq!(handle.snapshot().await, Err(RoomError::Unavailable(room)));
}

#[tokio::test]
async fn test_destroy_room_not_found() {
    let mut mgr = RoomManager::new();
    let result = mgr.destroy_room(RoomId(999_999)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_list_rooms_sorted() {
    let mut mgr = RoomManager::new();
    assert!(mgr.list_rooms().await.is_empty());

    let r1 = mgr.create_room(config()).unwrap();
    let r2 = mgr.create_room(config()).unwrap();

    let rooms: Vec<RoomId> = mgr.list_rooms().await.iter().map(|i| i.room_id).collect();
    assert_eq!(rooms, vec![r1, r2]);
}

// =========================================================================
// Snapshot broadcast
// =========================================================================

#[tokio::test]
async fn test_subscribe_delivers_current_snapshot() {
    let (mgr, room) = manager_with_room();
    let (tx, mut rx) = mpsc::unbounded_channel();

    mgr.subscribe(room, tx).await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first, mgr.snapshot(room).await.unwrap());
    assert_eq!(first.room_status, RoomStatus::RoomStart);
}

#[tokio::test]
async fn test_every_change_is_broadcast_in_order() {
    let (mgr, room) = manager_with_room();
    let (tx, mut rx) = mpsc::unbounded_channel();
    mgr.subscribe(room, tx).await.unwrap();
    let initial = rx.recv().await.unwrap();

    mgr.route_request(uid(1), RoomRequest::AdvanceRound)
        .await
        .unwrap();
    walk(&mgr, uid(1), &[RoomStatus::UserPicks]).await;

    let started = rx.recv().await.unwrap();
    let picking = rx.recv().await.unwrap();
    assert_eq!(started.room_status, RoomStatus::RoundStart);
    assert_eq!(started.round, 1);
    assert_eq!(picking.room_status, RoomStatus::UserPicks);
    assert!(initial.version < started.version);
    assert!(started.version < picking.version);
}

#[tokio::test]
async fn test_rejected_request_is_not_broadcast() {
    let (mgr, room) = manager_with_room();
    let (tx, mut rx) = mpsc::unbounded_channel::<RoomSnapshot>();
    mgr.subscribe(room, tx).await.unwrap();
    let initial = rx.recv().await.unwrap();

    let result = mgr
        .route_request(
            uid(1),
            RoomRequest::RequestTransition {
                target: RoomStatus::RoomEnd,
            },
        )
        .await;
    assert!(result.is_err());

    // A query round-trip guarantees the actor finished the request.
    let current = mgr.snapshot(room).await.unwrap();
    assert_eq!(current, initial);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_closed_subscriber_does_not_stall_room() {
    let (mgr, room) = manager_with_room();
    let (gone_tx, gone_rx) = mpsc::unbounded_channel();
    let (live_tx, mut live_rx) = mpsc::unbounded_channel();
    mgr.subscribe(room, gone_tx).await.unwrap();
    mgr.subscribe(room, live_tx).await.unwrap();
    drop(gone_rx);
    live_rx.recv().await.unwrap();

    mgr.route_request(uid(1), RoomRequest::AdvanceRound)
        .await
        .unwrap();
    mgr.route_request(
        uid(1),
        RoomRequest::RequestTransition {
            target: RoomStatus::UserPicks,
        },
    )
    .await
    .unwrap();

    assert_eq!(live_rx.recv().await.unwrap().round, 1);
    assert_eq!(
        live_rx.recv().await.unwrap().room_status,
        RoomStatus::UserPicks
    );
}

// =========================================================================
// Full match through the actor
// =========================================================================

#[tokio::test]
async fn test_match_runs_end_to_end() {
    let (mgr, room) = manager_with_room();
    let handle = mgr.room(room).unwrap().clone();

    // Round 1: unanimous pick.
    handle.advance_round().await.unwrap();
    handle
        .request_transition(RoomStatus::UserPicks)
        .await
        .unwrap();
    for user in 1..=4 {
        handle
            .submit_selection(uid(user), Some(ItemId(20)))
            .await
            .unwrap();
    }
    handle
        .request_transition(RoomStatus::SelectBeatmap)
        .await
        .unwrap();

    let rolled = handle.snapshot().await.unwrap();
    assert_eq!(rolled.candidate_items, vec![ItemId(20)]);
    assert_eq!(rolled.final_item, Some(ItemId(20)));
    assert_eq!(rolled.selections.len(), 4);

    walk(
        &mgr,
        uid(1),
        &[
            RoomStatus::PrepareBeatmap,
            RoomStatus::PrepareGameplay,
            RoomStatus::Gameplay,
        ],
    )
    .await;
    handle
        .submit_scores(
            1,
            vec![score(1, 1000), score(2, 1000), score(3, 500), score(4, 0)],
        )
        .await
        .unwrap();
    assert_eq!(
        handle.submit_scores(1, vec![score(1, 5)]).await,
        Err(RoomError::DuplicateScoreSubmission { round: 1 })
    );
    handle
        .request_transition(RoomStatus::RoundEnd)
        .await
        .unwrap();

    // Round 2: no picks, so the whole playlist is in play.
    handle.advance_round().await.unwrap();
    let fresh = handle.snapshot().await.unwrap();
    assert!(fresh.selections.is_empty());
    assert_eq!(fresh.final_item, None);

    handle
        .request_transition(RoomStatus::UserPicks)
        .await
        .unwrap();
    handle
        .request_transition(RoomStatus::SelectBeatmap)
        .await
        .unwrap();
    let rolled = handle.snapshot().await.unwrap();
    assert_eq!(rolled.candidate_items, vec![ItemId(10), ItemId(20), ItemId(30)]);
    assert!(rolled.candidate_items.contains(&rolled.final_item.unwrap()));

    walk(
        &mgr,
        uid(2),
        &[
            RoomStatus::PrepareBeatmap,
            RoomStatus::PrepareGameplay,
            RoomStatus::Gameplay,
        ],
    )
    .await;
    handle
        .submit_scores(
            2,
            vec![score(1, 900), score(2, 200), score(3, 200), score(4, 100)],
        )
        .await
        .unwrap();
    walk(&mgr, uid(1), &[RoomStatus::RoundEnd, RoomStatus::RoomEnd]).await;

    let last = handle.snapshot().await.unwrap();
    last.validate().unwrap();
    assert_eq!(last.room_status, RoomStatus::RoomEnd);
    assert_eq!(last.round, 2);

    let points: Vec<i32> = (1..=4).map(|u| last.users[&uid(u)].points).collect();
    assert_eq!(points, vec![16, 15, 13, 10]);
    let placements: Vec<Option<i32>> = (1..=4).map(|u| last.users[&uid(u)].placement).collect();
    assert_eq!(placements, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert_eq!(last.users[&uid(2)].round(2).unwrap().placement, 2);
    assert_eq!(last.users[&uid(3)].round(2).unwrap().placement, 2);

    // Nothing moves after the room has ended.
    assert!(matches!(
        handle.advance_round().await,
        Err(RoomError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_hand_restricts_picks_through_actor() {
    let (mgr, room) = manager_with_room();
    let handle = mgr.room(room).unwrap().clone();

    handle
        .assign_hand(uid(1), vec![ItemId(30)])
        .await
        .unwrap();
    handle.advance_round().await.unwrap();
    handle
        .request_transition(RoomStatus::UserPicks)
        .await
        .unwrap();

    assert_eq!(
        handle.submit_selection(uid(1), Some(ItemId(10))).await,
        Err(RoomError::UnknownItem {
            user: uid(1),
            item: ItemId(10),
        })
    );
    handle
        .submit_selection(uid(1), Some(ItemId(30)))
        .await
        .unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.selections.get(&uid(1)), Some(&ItemId(30)));
    assert!(snapshot.users[&uid(1)].hand.contains(&ItemId(30)));
}

#[tokio::test]
async fn test_toggle_selection_through_actor() {
    let (mgr, room) = manager_with_room();
    let handle = mgr.room(room).unwrap().clone();

    assert_eq!(
        handle.toggle_selection(uid(1), ItemId(20)).await,
        Err(RoomError::SelectionClosed(RoomStatus::RoomStart))
    );
    handle.advance_round().await.unwrap();
    handle
        .request_transition(RoomStatus::UserPicks)
        .await
        .unwrap();

    handle.toggle_selection(uid(1), ItemId(20)).await.unwrap();
    mgr.route_request(
        uid(2),
        RoomRequest::ToggleSelection {
            user_id: uid(2),
            item_id: ItemId(30),
        },
    )
    .await
    .unwrap();
    let picked = handle.snapshot().await.unwrap();
    assert_eq!(picked.selections.get(&uid(1)), Some(&ItemId(20)));
    assert_eq!(picked.selections.get(&uid(2)), Some(&ItemId(30)));

    // Toggling the same item again releases it.
    handle.toggle_selection(uid(1), ItemId(20)).await.unwrap();
    let released = handle.snapshot().await.unwrap();
    assert_eq!(released.selections.get(&uid(1)), None);
    assert!(released.version > picked.version);

    assert_eq!(
        handle.toggle_selection(uid(1), ItemId(99)).await,
        Err(RoomError::UnknownItem {
            user: uid(1),
            item: ItemId(99),
        })
    );
}
