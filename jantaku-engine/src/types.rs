use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::tile::{Suit, Tile, COPIES_PER_CODE, NUM_CODES};

/// Code → count histogram of a tile multiset, the input to every shanten
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandVector {
    counts: [u8; NUM_CODES],
}

impl HandVector {
    pub fn from_tiles<'a>(tiles: impl IntoIterator<Item = &'a Tile>) -> Self {
        let mut counts = [0u8; NUM_CODES];
        for tile in tiles {
            counts[tile.code() as usize] += 1;
        }
        Self { counts }
    }

    /// Builds a vector from raw counts, rejecting any count above 4.
    pub fn from_counts(counts: [u8; NUM_CODES]) -> EngineResult<Self> {
        if let Some(code) = counts.iter().position(|&c| c > COPIES_PER_CODE) {
            return Err(EngineError::InvalidTile {
                value: code as u32,
                message: format!("{} copies exceed the 4-copy limit", counts[code]),
            });
        }
        Ok(Self { counts })
    }

    #[inline]
    pub fn counts(&self) -> &[u8; NUM_CODES] {
        &self.counts
    }

    #[inline]
    pub fn count(&self, code: u8) -> u8 {
        self.counts[code as usize]
    }

    pub fn total(&self) -> u8 {
        self.counts.iter().sum()
    }

    /// The sub-vector of one lookup group (9 ranks for number suits, 7 for
    /// honors).
    #[inline]
    pub fn group(&self, suit: Suit) -> &[u8] {
        let start = suit.start() as usize;
        &self.counts[start..start + suit.ranks() as usize]
    }

    /// Counterfactual hand with one more copy of `code`, or `None` when all
    /// four copies are already held.
    pub fn with_added(&self, code: u8) -> Option<Self> {
        let slot = self.counts.get(code as usize)?;
        if *slot >= COPIES_PER_CODE {
            return None;
        }
        let mut next = *self;
        next.counts[code as usize] += 1;
        Some(next)
    }
}

impl Default for HandVector {
    fn default() -> Self {
        Self {
            counts: [0; NUM_CODES],
        }
    }
}

/// Seat and round winds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wind {
    #[default]
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl Wind {
    /// Tile code of this wind.
    pub const fn code(self) -> u8 {
        27 + self as u8
    }
}

impl From<u8> for Wind {
    fn from(val: u8) -> Self {
        match val % 4 {
            0 => Wind::East,
            1 => Wind::South,
            2 => Wind::West,
            _ => Wind::North,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeldKind {
    Pon,
    Chi,
    ClosedKong,
    OpenKong,
    ExtendedKong,
}

impl MeldKind {
    pub const fn is_kong(self) -> bool {
        matches!(
            self,
            MeldKind::ClosedKong | MeldKind::OpenKong | MeldKind::ExtendedKong
        )
    }

    /// Whether the meld breaks the closed hand. Only the closed kong keeps it.
    pub const fn is_open(self) -> bool {
        !matches!(self, MeldKind::ClosedKong)
    }
}

/// A called group. `tiles` holds every tile of the group in id order,
/// including the called one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    pub kind: MeldKind,
    pub tiles: Vec<Tile>,
    /// Tile taken from another player's discard (pon, chi, open kong).
    pub called_tile: Option<Tile>,
    /// Player the called tile came from.
    pub from_player: Option<u8>,
}

impl Meld {
    pub fn new(kind: MeldKind, mut tiles: Vec<Tile>, called_tile: Option<Tile>, from_player: Option<u8>) -> Self {
        tiles.sort();
        Self {
            kind,
            tiles,
            called_tile,
            from_player,
        }
    }

    /// Code of the lowest tile, which identifies pons and kongs.
    pub fn base_code(&self) -> Option<u8> {
        self.tiles.iter().map(|t| t.code()).min()
    }
}
