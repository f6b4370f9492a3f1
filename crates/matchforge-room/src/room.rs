//! Room actor: an isolated Tokio task that owns one room's state machine.
//!
//! Each room runs in its own task and is reached only through an mpsc
//! channel, so commands are applied one at a time in arrival order. After
//! every command that changed the room, the actor pushes a fresh
//! [`RoomSnapshot`] to each subscriber over an unbounded channel. Those
//! sends never wait, so a slow or vanished client can't hold the room up.

use matchforge_protocol::{
    ItemId, RoomId, RoomRequest, RoomSnapshot, RoomStatus, ScoreSubmission, UserId,
};
use tokio::sync::{mpsc, oneshot};

use crate::{MatchConfig, RoomError, RoomStateMachine};

/// Channel sender a room pushes snapshots into.
pub type SnapshotSender = mpsc::UnboundedSender<RoomSnapshot>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `reply` carry a oneshot "reply channel": the caller
/// sends the command and awaits the answer there.
pub(crate) enum RoomCommand {
    Join {
        user_id: UserId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Leave {
        user_id: UserId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    AssignHand {
        user_id: UserId,
        items: Vec<ItemId>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Request {
        request: RoomRequest,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Register an observer. It immediately receives the current snapshot.
    Subscribe {
        sender: SnapshotSender,
        reply: oneshot::Sender<()>,
    },

    GetSnapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A summary of a room (not the full snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub round: i32,
    pub participant_count: usize,
    pub version: u64,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone; it's just an `mpsc::Sender` wrapper. The
/// [`RoomManager`](crate::RoomManager) holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Adds a user to the roster (only before the first round).
    pub async fn join(&self, user_id: UserId) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Join { user_id, reply }).await?
    }

    /// Marks a user as disconnected. Their history stays in the room.
    pub async fn leave(&self, user_id: UserId) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Leave { user_id, reply }).await?
    }

    pub async fn assign_hand(
        &self,
        user_id: UserId,
        items: Vec<ItemId>,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::AssignHand {
            user_id,
            items,
            reply,
        })
        .await?
    }

    /// Applies an inbound request and waits for the verdict.
    pub async fn request(&self, request: RoomRequest) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Request { request, reply })
            .await?
    }

    pub async fn submit_selection(
        &self,
        user_id: UserId,
        item_id: Option<ItemId>,
    ) -> Result<(), RoomError> {
        self.request(RoomRequest::SubmitSelection { user_id, item_id })
            .await
    }

    pub async fn toggle_selection(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<(), RoomError> {
        self.request(RoomRequest::ToggleSelection { user_id, item_id })
            .await
    }

    pub async fn submit_scores(
        &self,
        round: i32,
        results: Vec<ScoreSubmission>,
    ) -> Result<(), RoomError> {
        self.request(RoomRequest::SubmitScores { round, results })
            .await
    }

    pub async fn request_transition(
        &self,
        target: RoomStatus,
    ) -> Result<(), RoomError> {
        self.request(RoomRequest::RequestTransition { target }).await
    }

    pub async fn advance_round(&self) -> Result<(), RoomError> {
        self.request(RoomRequest::AdvanceRound).await
    }

    /// Subscribes `sender` to state changes. The current snapshot is
    /// delivered first.
    pub async fn subscribe(&self, sender: SnapshotSender) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Subscribe { sender, reply })
            .await
    }

    /// Requests the current snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.call(|reply| RoomCommand::GetSnapshot { reply }).await
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.call(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    machine: RoomStateMachine,
    subscribers: Vec<SnapshotSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        let room_id = self.machine.room_id();
        tracing::info!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            let version = self.machine.version();
            match cmd {
                RoomCommand::Join { user_id, reply } => {
                    let _ = reply.send(self.machine.add_participant(user_id));
                }
                RoomCommand::Leave { user_id, reply } => {
                    let _ = reply.send(self.machine.participant_left(user_id));
                }
                RoomCommand::AssignHand {
                    user_id,
                    items,
                    reply,
                } => {
                    let _ = reply.send(self.machine.assign_hand(user_id, items));
                }
                RoomCommand::Request { request, reply } => {
                    let result = self.machine.apply(request);
                    if let Err(e) = &result {
                        tracing::debug!(%room_id, error = %e, "request rejected");
                    }
                    let _ = reply.send(result);
                }
                RoomCommand::Subscribe { sender, reply } => {
                    if sender.send(self.machine.snapshot()).is_ok() {
                        self.subscribers.push(sender);
                    }
                    let _ = reply.send(());
                }
                RoomCommand::GetSnapshot { reply } => {
                    let _ = reply.send(self.machine.snapshot());
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_id, "room shutting down");
                    break;
                }
            }

            if self.machine.version() != version {
                self.broadcast();
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    /// Pushes the current snapshot to every subscriber, dropping those
    /// whose receiver is gone.
    fn broadcast(&mut self) {
        let snapshot = self.machine.snapshot();
        let before = self.subscribers.len();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            tracing::warn!(
                room_id = %self.machine.room_id(),
                dropped,
                "dropped closed subscribers"
            );
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.machine.room_id(),
            status: self.machine.status(),
            round: self.machine.round(),
            participant_count: self.machine.participant_count(),
            version: self.machine.version(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `config.channel_size` bounds the command channel; when it fills up,
/// senders wait. Nothing is spawned if `config` is invalid.
pub(crate) fn spawn_room(
    room_id: RoomId,
    config: MatchConfig,
    roster: Vec<UserId>,
) -> Result<RoomHandle, RoomError> {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let machine = RoomStateMachine::with_roster(room_id, config, roster)?;

    let actor = RoomActor {
        machine,
        subscribers: Vec::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    Ok(RoomHandle {
        room_id,
        sender: tx,
    })
}
