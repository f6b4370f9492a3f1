//! Room configuration.

use matchforge_protocol::ItemId;
use serde::{Deserialize, Serialize};

use crate::RoomError;

/// Points awarded for placements 1 through 8. Anything worse earns nothing.
pub const DEFAULT_POINTS_TABLE: [i32; 8] = [8, 7, 6, 5, 4, 3, 2, 1];

/// Default command channel size for room actors.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Settings for one matchmaking room.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides (`#[serde(default)]` on the struct).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Points for placement `i + 1` at index `i`. Placements past the end
    /// of the table earn 0.
    pub points_table: Vec<i32>,

    /// Items that can be picked. Also the fallback candidate set when
    /// nobody picks anything.
    pub playlist: Vec<ItemId>,

    /// Initial `life` for every participant.
    pub starting_life: i32,

    /// Mixed into every roll seed. Lets operators reshuffle outcomes
    /// without changing room ids.
    pub seed_salt: u64,

    /// Backpressure bound for the room actor's command channel.
    pub channel_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            points_table: DEFAULT_POINTS_TABLE.to_vec(),
            playlist: Vec::new(),
            starting_life: 0,
            seed_salt: 0,
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }
}

impl MatchConfig {
    /// A default config with the given playlist.
    pub fn with_playlist(playlist: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            playlist: playlist.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Returns `true` if `item` is on the playlist.
    pub fn has_item(&self, item: ItemId) -> bool {
        self.playlist.contains(&item)
    }

    /// Rejects configs a room can't run with: negative or increasing
    /// points, or a zero-sized command channel.
    pub fn validate(&self) -> Result<(), RoomError> {
        if let Some(points) = self.points_table.iter().find(|p| **p < 0) {
            return Err(RoomError::InvalidConfig(format!(
                "points table contains negative value {points}"
            )));
        }
        if self.points_table.windows(2).any(|w| w[0] < w[1]) {
            return Err(RoomError::InvalidConfig(
                "points table must not increase with placement".into(),
            ));
        }
        if self.channel_size == 0 {
            return Err(RoomError::InvalidConfig(
                "channel_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
