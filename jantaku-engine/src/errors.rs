use std::fmt;

use crate::types::MeldKind;

#[derive(Debug)]
pub enum EngineError {
    /// Tile id outside 0..136 or a code outside 0..34.
    InvalidTile { value: u32, message: String },
    /// Malformed tile notation.
    Parse { input: String, message: String },
    /// The discarded tile is not in the player's hand.
    IllegalDiscard { tile: String },
    /// A call whose legality predicate failed. Nothing was mutated.
    IllegalCall { kind: MeldKind, message: String },
    /// Riichi, tsumo or ron declared when not permitted.
    IllegalAction { message: String },
    /// Table configuration the engine cannot run.
    InvalidConfig { message: String },
    /// The shanten table artifact is stale, incomplete or corrupt.
    DataIntegrity { message: String },
    /// The scoring oracle failed or answered with something unusable.
    ScoringUnavailable { message: String },
    Serialization { message: String },
    Io { path: String, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidTile { value, message } => {
                write!(f, "Invalid tile {}: {}", value, message)
            }
            EngineError::Parse { input, message } => {
                write!(f, "Parse error on '{}': {}", input, message)
            }
            EngineError::IllegalDiscard { tile } => {
                write!(f, "Illegal discard: {} is not in hand", tile)
            }
            EngineError::IllegalCall { kind, message } => {
                write!(f, "Illegal {:?} call: {}", kind, message)
            }
            EngineError::IllegalAction { message } => {
                write!(f, "Illegal action: {}", message)
            }
            EngineError::InvalidConfig { message } => {
                write!(f, "Invalid table config: {}", message)
            }
            EngineError::DataIntegrity { message } => {
                write!(f, "Shanten table integrity error: {}", message)
            }
            EngineError::ScoringUnavailable { message } => {
                write!(f, "Scoring unavailable: {}", message)
            }
            EngineError::Serialization { message } => {
                write!(f, "Serialization error: {}", message)
            }
            EngineError::Io { path, message } => {
                write!(f, "I/O error on '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
