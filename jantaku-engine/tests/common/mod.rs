#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use jantaku_engine::parser::parse_tiles;
use jantaku_engine::types::HandVector;
use jantaku_engine::{HandEvaluator, ShantenTable, Tile, TileCatalog};

static TABLE: OnceLock<Arc<ShantenTable>> = OnceLock::new();

/// One generated table per test binary.
pub fn evaluator() -> HandEvaluator {
    let table = TABLE.get_or_init(|| Arc::new(ShantenTable::generate()));
    HandEvaluator::new(table.clone())
}

pub fn tiles(notation: &str) -> Vec<Tile> {
    parse_tiles(notation, &TileCatalog::default()).unwrap()
}

pub fn hand(notation: &str) -> HandVector {
    HandVector::from_tiles(&tiles(notation))
}
