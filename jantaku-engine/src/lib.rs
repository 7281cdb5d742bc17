pub mod action;
pub mod errors;
pub mod hand_evaluator;
pub mod parser;
pub mod pattern;
pub mod score;
pub mod shanten_table;
pub mod state;
pub mod tile;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use errors::{EngineError, EngineResult};
pub use hand_evaluator::{Archetype, HandEvaluator, Outs, ShantenBreakdown, SHANTEN_UNREACHABLE};
pub use shanten_table::ShantenTable;
pub use state::game_mode::{GameMode, TableConfig};
pub use state::Table;
pub use tile::{Tile, TileCatalog};
