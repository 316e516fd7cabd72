/// Playback timing configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Timings the playback controller runs on. Every field has a default, so
/// a RON file only needs to name what it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Pause between entering a scene and its first text starting.
    pub settle_ms: u64,
    /// Per-character speed for text blocks that do not set their own.
    pub default_speed_ms: u64,
    /// Delay between a choice being selected and the scene changing.
    /// Zero switches scenes immediately.
    pub choice_confirm_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            settle_ms: 300,
            default_speed_ms: 50,
            choice_confirm_ms: 0,
        }
    }
}

impl PlaybackConfig {
    pub fn load_from_ron(path: &Path) -> Result<PlaybackConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<PlaybackConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }
}
