use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::types::Wind;

pub const NUM_PLAYERS: usize = 4;

pub const STARTING_SCORE: i32 = 25000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Four rounds.
    EastOnly,
    /// Eight rounds.
    #[default]
    EastSouth,
}

impl GameMode {
    /// Round count at which the match ends.
    pub const fn end_round(self) -> u8 {
        match self {
            GameMode::EastOnly => 4,
            GameMode::EastSouth => 8,
        }
    }
}

/// Rules consumed when a table is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    pub game_mode: GameMode,
    pub attendance: u8,
    pub red_dora: bool,
    pub starting_score: i32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            game_mode: GameMode::EastSouth,
            attendance: NUM_PLAYERS as u8,
            red_dora: true,
            starting_score: STARTING_SCORE,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.attendance as usize != NUM_PLAYERS {
            return Err(EngineError::InvalidConfig {
                message: format!("only {}-player tables are supported, got {}", NUM_PLAYERS, self.attendance),
            });
        }
        if self.starting_score <= 0 {
            return Err(EngineError::InvalidConfig {
                message: format!("starting score must be positive, got {}", self.starting_score),
            });
        }
        Ok(())
    }
}

/// Prevailing wind of a round.
pub fn round_wind(round_count: u8) -> Wind {
    Wind::from(round_count / 4)
}

/// Display name such as `"South 2"`.
pub fn round_name(round_count: u8) -> String {
    format!("{:?} {}", round_wind(round_count), round_count % 4 + 1)
}
