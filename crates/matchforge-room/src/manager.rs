//! Room manager: creates, tracks, and routes users to rooms.
//!
//! Rooms never share mutable state. The manager only holds handles and a
//! `user → room` index; each room's state lives in its own actor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use matchforge_protocol::{RoomId, RoomRequest, RoomSnapshot, UserId};

use crate::room::spawn_room;
use crate::{MatchConfig, RoomError, RoomHandle, RoomInfo, SnapshotSender};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Arena of running rooms, keyed by room id.
///
/// This is the entry point for room operations from the session layer.
pub struct RoomManager {
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each user to the room they're in.
    /// A user can be in at most ONE room at a time.
    user_rooms: HashMap<UserId, RoomId>,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            user_rooms: HashMap::new(),
        }
    }

    /// Creates an empty room and returns its ID.
    ///
    /// Fails with [`RoomError::InvalidConfig`] if `config` doesn't pass
    /// [`MatchConfig::validate`].
    pub fn create_room(&mut self, config: MatchConfig) -> Result<RoomId, RoomError> {
        config.validate()?;
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room(room_id, config, Vec::new())?;
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, "room created");
        Ok(room_id)
    }

    /// Creates a room for an already-grouped roster.
    ///
    /// Fails without creating anything if `config` is invalid or a roster
    /// member is already in another room.
    pub fn create_room_with_roster(
        &mut self,
        config: MatchConfig,
        roster: Vec<UserId>,
    ) -> Result<RoomId, RoomError> {
        config.validate()?;
        if let Some(user_id) = roster.iter().find(|u| self.user_rooms.contains_key(*u)) {
            return Err(RoomError::AlreadyInRoom(*user_id, self.user_rooms[user_id]));
        }

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let users = roster.clone();
        let handle = spawn_room(room_id, config, roster)?;
        for user_id in &users {
            self.user_rooms.insert(*user_id, room_id);
        }
        let players = users.len();
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, players, "room created");
        Ok(room_id)
    }

    /// Adds a user to a room that hasn't started its first round yet.
    pub async fn join_room(
        &mut self,
        user_id: UserId,
        room_id: RoomId,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.user_rooms.get(&user_id) {
            return Err(RoomError::AlreadyInRoom(user_id, *current));
        }

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        handle.join(user_id).await?;
        self.user_rooms.insert(user_id, room_id);
        Ok(())
    }

    /// Reports that a user's connection went away. The user stays on
    /// the room's roster for ranking.
    pub async fn user_disconnected(&self, user_id: UserId) -> Result<(), RoomError> {
        self.user_handle(user_id)?.leave(user_id).await
    }

    /// Routes a request from a user to their current room.
    pub async fn route_request(
        &self,
        user_id: UserId,
        request: RoomRequest,
    ) -> Result<(), RoomError> {
        self.user_handle(user_id)?.request(request).await
    }

    /// Returns the handle for a room.
    pub fn room(&self, room_id: RoomId) -> Result<&RoomHandle, RoomError> {
        self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))
    }

    /// Subscribes `sender` to a room's snapshots.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
        sender: SnapshotSender,
    ) -> Result<(), RoomError> {
        self.room(room_id)?.subscribe(sender).await
    }

    pub async fn snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        self.room(room_id)?.snapshot().await
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        self.room(room_id)?.get_info().await
    }

    /// Shuts down a room and forgets all its users.
    pub async fn destroy_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;

        self.user_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room ID a user is currently in, if any.
    pub fn user_room(&self, user_id: &UserId) -> Option<RoomId> {
        self.user_rooms.get(user_id).copied()
    }

    /// Info for every room that still responds.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                infos.push(info);
            }
        }
        infos.sort_by_key(|info| info.room_id);
        infos
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room IDs.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    fn user_handle(&self, user_id: UserId) -> Result<&RoomHandle, RoomError> {
        let room_id = self
            .user_rooms
            .get(&user_id)
            .ok_or(RoomError::UnknownUser(user_id))?;
        self.room(*room_id)
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
