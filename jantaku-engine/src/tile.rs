//! The fixed 136-tile universe.
//!
//! Every physical tile is an immutable [`Tile`] record indexed by its id
//! (0-135, four copies per code). A [`TileCatalog`] is the arena holding all
//! 136 records for one rule configuration; the only thing that differs
//! between catalogs is whether the three red fives are flagged. Who holds a
//! tile is tracked by the table, never by the tile itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Distinct tile codes (0-33).
pub const NUM_CODES: usize = 34;

/// Physical tiles in a set.
pub const NUM_TILES: usize = 136;

/// Copies of each code.
pub const COPIES_PER_CODE: u8 = 4;

pub const MANZU_START: u8 = 0;
pub const PINZU_START: u8 = 9;
pub const SOUZU_START: u8 = 18;
pub const HONOR_START: u8 = 27;

pub const EAST: u8 = 27;
pub const SOUTH: u8 = 28;
pub const WEST: u8 = 29;
pub const NORTH: u8 = 30;
pub const WHITE: u8 = 31;
pub const GREEN: u8 = 32;
pub const RED: u8 = 33;

/// Ids of the red fives (5m, 5p, 5s) when red dora is enabled.
pub const RED_FIVE_IDS: [u8; 3] = [19, 55, 91];

/// Terminal and honor codes, the thirteen orphans.
pub const ORPHAN_CODES: [u8; 13] = [0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33];

const CODE_NAMES: [&str; NUM_CODES] = [
    "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", //
    "1p", "2p", "3p", "4p", "5p", "6p", "7p", "8p", "9p", //
    "1s", "2s", "3s", "4s", "5s", "6s", "7s", "8s", "9s", //
    "E", "S", "W", "N", "P", "F", "C",
];

// ---------------------------------------------------------------------------
// Suit
// ---------------------------------------------------------------------------

/// The three number suits plus honors. Each suit is one lookup group of the
/// shanten table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Manzu = 0,
    Pinzu = 1,
    Souzu = 2,
    Honor = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Manzu, Suit::Pinzu, Suit::Souzu, Suit::Honor];

    /// First code of this suit.
    #[inline]
    pub const fn start(self) -> u8 {
        match self {
            Suit::Manzu => MANZU_START,
            Suit::Pinzu => PINZU_START,
            Suit::Souzu => SOUZU_START,
            Suit::Honor => HONOR_START,
        }
    }

    /// Number of ranks: 9 for number suits, 7 for honors.
    #[inline]
    pub const fn ranks(self) -> u8 {
        match self {
            Suit::Honor => 7,
            _ => 9,
        }
    }

    /// Notation letter used by the hand parser.
    pub const fn letter(self) -> char {
        match self {
            Suit::Manzu => 'm',
            Suit::Pinzu => 'p',
            Suit::Souzu => 's',
            Suit::Honor => 'z',
        }
    }

    #[inline]
    pub const fn of_code(code: u8) -> Suit {
        match code {
            0..9 => Suit::Manzu,
            9..18 => Suit::Pinzu,
            18..27 => Suit::Souzu,
            _ => Suit::Honor,
        }
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One physical tile. Equality and ordering follow the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    id: u8,
    code: u8,
    suit: Suit,
    rank: u8,
    red: bool,
}

impl Tile {
    /// Builds the tile with this id. Only the catalog decides redness, so
    /// tiles built here are never red.
    pub fn from_id(id: u8) -> EngineResult<Tile> {
        Self::with_red(id, false)
    }

    fn with_red(id: u8, red: bool) -> EngineResult<Tile> {
        if id as usize >= NUM_TILES {
            return Err(EngineError::InvalidTile {
                value: id as u32,
                message: format!("tile id must be below {}", NUM_TILES),
            });
        }
        let code = id / COPIES_PER_CODE;
        let suit = Suit::of_code(code);
        Ok(Tile {
            id,
            code,
            suit,
            rank: code - suit.start() + 1,
            red,
        })
    }

    #[inline]
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// Code 0-33 (`suit * 9 + rank - 1`).
    #[inline]
    pub const fn code(&self) -> u8 {
        self.code
    }

    #[inline]
    pub const fn suit(&self) -> Suit {
        self.suit
    }

    /// 1-9 for number suits, 1-7 for honors.
    #[inline]
    pub const fn rank(&self) -> u8 {
        self.rank
    }

    #[inline]
    pub const fn is_red(&self) -> bool {
        self.red
    }

    #[inline]
    pub const fn is_honor(&self) -> bool {
        self.code >= HONOR_START
    }

    #[inline]
    pub const fn is_number(&self) -> bool {
        self.code < HONOR_START
    }

    /// Terminal (rank 1 or 9 of a number suit) or honor.
    #[inline]
    pub const fn is_orphan(&self) -> bool {
        is_orphan_code(self.code)
    }

    pub fn name(&self) -> &'static str {
        code_name(self.code)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.red {
            write!(f, "0{}", self.suit.letter())
        } else {
            f.write_str(self.name())
        }
    }
}

// ---------------------------------------------------------------------------
// Code helpers
// ---------------------------------------------------------------------------

/// Display name for a code; `"?"` when out of range.
pub fn code_name(code: u8) -> &'static str {
    CODE_NAMES.get(code as usize).copied().unwrap_or("?")
}

#[inline]
pub const fn is_orphan_code(code: u8) -> bool {
    if code >= HONOR_START {
        return code < NUM_CODES as u8;
    }
    let rank = code % 9;
    rank == 0 || rank == 8
}

/// All four ids of a code.
#[inline]
pub fn ids_of_code(code: u8) -> impl Iterator<Item = u8> {
    let base = code * COPIES_PER_CODE;
    base..base + COPIES_PER_CODE
}

/// Dora code indicated by `indicator`: the next rank within a number suit
/// (9 wraps to 1), winds cycle E→S→W→N→E and dragons P→F→C→P.
pub const fn next_dora_code(indicator: u8) -> u8 {
    match indicator {
        0..=8 => (indicator + 1) % 9,
        9..=17 => 9 + (indicator - 9 + 1) % 9,
        18..=26 => 18 + (indicator - 18 + 1) % 9,
        27..=30 => 27 + (indicator - 27 + 1) % 4,
        31..=33 => 31 + (indicator - 31 + 1) % 3,
        _ => indicator,
    }
}

// ---------------------------------------------------------------------------
// TileCatalog
// ---------------------------------------------------------------------------

/// Arena of the 136 tiles for one red-dora setting.
#[derive(Debug, Clone)]
pub struct TileCatalog {
    tiles: Vec<Tile>,
    red_dora: bool,
}

impl TileCatalog {
    pub fn new(red_dora: bool) -> Self {
        let tiles = (0..NUM_TILES as u8)
            .map(|id| Tile {
                red: red_dora && RED_FIVE_IDS.contains(&id),
                ..Self::plain(id)
            })
            .collect();
        Self { tiles, red_dora }
    }

    fn plain(id: u8) -> Tile {
        let code = id / COPIES_PER_CODE;
        let suit = Suit::of_code(code);
        Tile {
            id,
            code,
            suit,
            rank: code - suit.start() + 1,
            red: false,
        }
    }

    pub fn red_dora(&self) -> bool {
        self.red_dora
    }

    /// Looks up a tile, rejecting ids outside 0..136.
    pub fn get(&self, id: u8) -> EngineResult<Tile> {
        self.tiles
            .get(id as usize)
            .copied()
            .ok_or_else(|| EngineError::InvalidTile {
                value: id as u32,
                message: format!("tile id must be below {}", NUM_TILES),
            })
    }

    /// Checks that a tile record agrees with this catalog's record for the
    /// same id (code, rank and red flag).
    pub fn verify(&self, tile: &Tile) -> EngineResult<()> {
        let canonical = self.get(tile.id)?;
        if canonical != *tile {
            return Err(EngineError::InvalidTile {
                value: tile.id as u32,
                message: format!("record {:?} does not match catalog {:?}", tile, canonical),
            });
        }
        Ok(())
    }

    pub fn all(&self) -> &[Tile] {
        &self.tiles
    }

    /// The four copies of a code.
    pub fn copies_of(&self, code: u8) -> EngineResult<&[Tile]> {
        if code as usize >= NUM_CODES {
            return Err(EngineError::InvalidTile {
                value: code as u32,
                message: format!("tile code must be below {}", NUM_CODES),
            });
        }
        let start = code as usize * COPIES_PER_CODE as usize;
        Ok(&self.tiles[start..start + COPIES_PER_CODE as usize])
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_four_copies_of_every_code() {
        let catalog = TileCatalog::new(false);
        for code in 0..NUM_CODES as u8 {
            let copies = catalog.copies_of(code).unwrap();
            assert_eq!(copies.len(), 4);
            assert!(
                copies.iter().all(|t| t.code() == code),
                "copies of {code} should share the code"
            );
        }
    }

    #[test]
    fn suit_and_rank_classification() {
        let catalog = TileCatalog::new(false);
        let one_man = catalog.get(0).unwrap();
        assert_eq!((one_man.suit(), one_man.rank()), (Suit::Manzu, 1));
        let nine_pin = catalog.get(68).unwrap();
        assert_eq!((nine_pin.suit(), nine_pin.rank()), (Suit::Pinzu, 9));
        let red_dragon = catalog.get(135).unwrap();
        assert_eq!((red_dragon.suit(), red_dragon.rank()), (Suit::Honor, 7));
        assert_eq!(red_dragon.name(), "C");
    }

    #[test]
    fn red_fives_follow_the_catalog_setting() {
        let with_red = TileCatalog::new(true);
        let without_red = TileCatalog::new(false);
        for id in RED_FIVE_IDS {
            let tile = with_red.get(id).unwrap();
            assert!(tile.is_red(), "tile {id} should be red");
            assert_eq!(tile.rank(), 5);
            assert!(!without_red.get(id).unwrap().is_red());
        }
        assert_eq!(with_red.all().iter().filter(|t| t.is_red()).count(), 3);
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        assert!(matches!(
            Tile::from_id(136),
            Err(EngineError::InvalidTile { value: 136, .. })
        ));
        assert!(TileCatalog::new(true).get(200).is_err());
        assert!(TileCatalog::new(true).copies_of(34).is_err());
    }

    #[test]
    fn verify_catches_mismatched_red_flag() {
        let catalog = TileCatalog::new(true);
        let plain = Tile::from_id(19).unwrap();
        assert!(catalog.verify(&plain).is_err());
        assert!(catalog.verify(&catalog.get(19).unwrap()).is_ok());
    }

    #[test]
    fn orphan_codes_match_classification() {
        for code in 0..NUM_CODES as u8 {
            assert_eq!(
                is_orphan_code(code),
                ORPHAN_CODES.contains(&code),
                "code {code} orphan mismatch"
            );
        }
    }

    #[test]
    fn dora_successor_wraps_within_suit() {
        assert_eq!(next_dora_code(8), 0); // 9m -> 1m
        assert_eq!(next_dora_code(17), 9); // 9p -> 1p
        assert_eq!(next_dora_code(26), 18); // 9s -> 1s
        assert_eq!(next_dora_code(4), 5);
        assert_eq!(next_dora_code(NORTH), EAST);
        assert_eq!(next_dora_code(EAST), SOUTH);
        assert_eq!(next_dora_code(RED), WHITE);
        assert_eq!(next_dora_code(WHITE), GREEN);
    }

    #[test]
    fn display_uses_zero_for_red_fives() {
        let catalog = TileCatalog::new(true);
        assert_eq!(catalog.get(55).unwrap().to_string(), "0p");
        assert_eq!(catalog.get(54).unwrap().to_string(), "5p");
        assert_eq!(catalog.get(108).unwrap().to_string(), "E");
    }
}
