//! Boundary to the external scorer.
//!
//! The engine never evaluates yaku or points itself. A win is described in a
//! [`ScoreRequest`] and handed to a [`ScoringOracle`], which answers with a
//! [`ScoreResponse`]. [`CommandScorer`] speaks the JSON protocol of an
//! external program over stdin/stdout.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::state::game_mode::NUM_PLAYERS;
use crate::tile::Tile;
use crate::types::{Meld, MeldKind, Wind};

/// Compact scorer notation: rank then suit letter, `0` for a red five.
pub fn scorer_notation(tile: &Tile) -> String {
    let rank = if tile.is_red() { 0 } else { tile.rank() };
    format!("{}{}", rank, tile.suit().letter())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreMeld {
    pub kind: MeldKind,
    pub tiles: Vec<String>,
}

impl From<&Meld> for ScoreMeld {
    fn from(meld: &Meld) -> Self {
        Self {
            kind: meld.kind,
            tiles: meld.tiles.iter().map(scorer_notation).collect(),
        }
    }
}

/// Everything the scorer needs to value one win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub winner: u8,
    /// Discarder on ron, `None` on tsumo.
    pub loser: Option<u8>,
    pub host: u8,
    /// Closed tiles without the winning tile.
    pub closed_tiles: Vec<String>,
    pub melds: Vec<ScoreMeld>,
    pub winning_tile: String,
    pub round_wind: Wind,
    pub seat_wind: Wind,
    pub is_tsumo: bool,
    pub is_riichi: bool,
    pub is_host: bool,
    pub dora_indicators: Vec<String>,
    /// Only filled for riichi winners.
    pub ura_dora_indicators: Vec<String>,
    pub honba: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Yaku {
    pub name: String,
    pub han: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Scorer's label for the hand value, e.g. `"mangan"`.
    pub score_type: String,
    pub raw_points: i32,
    pub final_points: i32,
    /// Point change per player id.
    pub payments: [i32; NUM_PLAYERS],
    pub yaku: Vec<Yaku>,
}

impl ScoreResponse {
    /// A response naming no yaku does not describe a legal win.
    pub fn validate(&self) -> EngineResult<()> {
        if self.yaku.is_empty() {
            return Err(EngineError::ScoringUnavailable {
                message: "response lists no yaku".to_string(),
            });
        }
        // Riichi deposits are not kept, so a win only moves points
        // between players.
        if self.payments.iter().sum::<i32>() != 0 {
            return Err(EngineError::ScoringUnavailable {
                message: format!("payments {:?} do not sum to zero", self.payments),
            });
        }
        Ok(())
    }
}

/// Values wins. Implementations must be shareable across simulator threads.
pub trait ScoringOracle: Send + Sync {
    fn score(&self, request: &ScoreRequest) -> EngineResult<ScoreResponse>;
}

/// Runs an external program per request: the request JSON goes to its stdin
/// and one response JSON document is read from its stdout.
#[derive(Debug, Clone)]
pub struct CommandScorer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandScorer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn unavailable(&self, message: impl std::fmt::Display) -> EngineError {
        EngineError::ScoringUnavailable {
            message: format!("{}: {}", self.program.display(), message),
        }
    }
}

impl ScoringOracle for CommandScorer {
    fn score(&self, request: &ScoreRequest) -> EngineResult<ScoreResponse> {
        let payload = serde_json::to_vec(request)?;
        trace!("scoring request {}", String::from_utf8_lossy(&payload));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).map_err(|e| self.unavailable(e))?;
        }
        let output = child.wait_with_output().map_err(|e| self.unavailable(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unavailable(format!("exited with {}: {}", output.status, stderr.trim())));
        }

        let response: ScoreResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| self.unavailable(format!("malformed response: {}", e)))?;
        response.validate()?;
        debug!(
            "player {} scored {} ({})",
            request.winner, response.final_points, response.score_type
        );
        Ok(response)
    }
}
