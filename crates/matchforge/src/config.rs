//! Loading [`MatchConfig`] from disk.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf};

use matchforge_room::MatchConfig;
use tracing::info;

use crate::MatchforgeError;

/// Where the sim looks for its config when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/match.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "MATCHFORGE_CONFIG";

/// Picks the config path: an explicit argument wins, then
/// `MATCHFORGE_CONFIG`, then [`DEFAULT_CONFIG_PATH`].
pub fn resolve_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| env::var(CONFIG_PATH_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Reads a JSON [`MatchConfig`] from `path`.
///
/// A missing file yields the defaults. Any other read failure, malformed
/// JSON, or a config that fails [`MatchConfig::validate`] is an error.
pub fn load(path: impl AsRef<Path>) -> Result<MatchConfig, MatchforgeError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "config file not found; using built-in defaults");
            return Ok(MatchConfig::default());
        }
        Err(source) => {
            return Err(MatchforgeError::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config = parse(&contents).map_err(|source| MatchforgeError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;

    info!(
        path = %path.display(),
        playlist = config.playlist.len(),
        paid_places = config.points_table.iter().filter(|p| **p > 0).count(),
        "loaded match config"
    );
    Ok(config)
}

fn parse(contents: &str) -> Result<MatchConfig, serde_json::Error> {
    serde_json::from_str(contents)
}
