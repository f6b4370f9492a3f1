//! Runs the scripted two-round match through a room actor and prints every
//! snapshot the room publishes, one JSON document per line.
//!
//! ```text
//! matchforge-sim [config.json]
//! ```

use matchforge::prelude::*;
use matchforge::{config, logging, sim};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), MatchforgeError> {
    logging::init();

    let path = config::resolve_path(std::env::args().nth(1));
    let mut match_config = config::load(&path)?;
    if match_config.playlist.is_empty() {
        match_config.playlist = vec![ItemId(101), ItemId(102), ItemId(103)];
        tracing::info!("no playlist configured; using demo items");
    }
    let playlist = match_config.playlist.clone();

    let (users, script) = sim::default_script();
    let mut rooms = RoomManager::new();
    let room_id = rooms.create_room_with_roster(match_config, users)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<RoomSnapshot>();
    rooms.subscribe(room_id, tx).await?;
    let printer = tokio::spawn(async move {
        let codec = JsonCodec;
        while let Some(snapshot) = rx.recv().await {
            match codec.encode(&snapshot) {
                Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
                Err(e) => tracing::warn!(error = %e, "failed to encode snapshot"),
            }
        }
    });

    let last = sim::run(rooms.room(room_id)?, &playlist, &script).await?;
    let mut standings: Vec<&ParticipantState> = last.users.values().collect();
    standings.sort_by_key(|p| p.placement);
    for p in standings {
        tracing::info!(
            user_id = %p.user_id,
            placement = ?p.placement,
            points = p.points,
            "final standing"
        );
    }

    // Dropping the actor closes the subscriber channel, which ends the printer.
    rooms.destroy_room(room_id).await?;
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "snapshot printer failed");
    }
    Ok(())
}
