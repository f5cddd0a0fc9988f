//! Match configuration.
//!
//! Persisted as JSON, separately from replays. The simulation core assumes
//! a validated configuration: `validate` exists for the config-loading edge,
//! and the hot path never re-checks these values.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_SCORE_TO_WIN;
use crate::sim::{PlayerSide, Ruleset};

/// Everything needed to set up a [`DuelMatch`](crate::sim::DuelMatch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Scoring variant
    pub ruleset: Ruleset,
    /// Points needed to win (margin rules per variant)
    pub score_to_win: u32,
    /// Side serving first
    pub starting_side: PlayerSide,
    /// Display names, left then right; also stored in replays
    pub player_names: [String; 2],
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ruleset: Ruleset::default(),
            score_to_win: DEFAULT_SCORE_TO_WIN,
            starting_side: PlayerSide::Left,
            player_names: ["Left Player".to_owned(), "Right Player".to_owned()],
        }
    }
}

impl MatchConfig {
    /// Check the invariants the simulation assumes. Call this where the
    /// configuration enters the program, not per tick.
    pub fn validate(&self) -> Result<(), String> {
        if self.score_to_win == 0 {
            return Err("score_to_win must be positive".to_owned());
        }
        for name in &self.player_names {
            if name.as_bytes().contains(&0) {
                return Err(format!("player name {name:?} contains a NUL byte"));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("config serialization cannot fail")
    }

    /// Load from a JSON file, falling back to defaults if it is missing.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        match fs::read_to_string(path.as_ref()) {
            Ok(json) => Self::from_json(&json)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.as_ref().display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_json())
    }
}
