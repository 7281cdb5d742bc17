//! Shanten and outs for the three hand archetypes.
//!
//! Normal-hand shanten combines four shanten-table lookups (one per suit
//! group) over every [`AgariPartition`] and keeps the cheapest; seven pairs
//! and thirteen orphans are closed-form. `-1` means a complete hand, `0`
//! tenpai.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pattern::{self, AgariPartition, MAX_MELDS};
use crate::shanten_table::ShantenTable;
use crate::tile::{ids_of_code, Suit, Tile, TileCatalog, NUM_CODES, NUM_TILES, ORPHAN_CODES};
use crate::types::HandVector;

/// Shanten of an archetype the hand can no longer reach.
pub const SHANTEN_UNREACHABLE: i8 = i8::MAX;

/// Closed tiles needed for seven pairs or thirteen orphans.
const CLOSED_HAND_TILES: u8 = 13;

const CHIITOITSU_PAIRS: i8 = 7;
const KOKUSHI_KINDS: i8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Normal,
    Chiitoitsu,
    Kokushi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShantenBreakdown {
    pub normal: i8,
    pub chiitoitsu: i8,
    pub kokushi: i8,
}

impl ShantenBreakdown {
    pub fn minimum(&self) -> i8 {
        self.normal.min(self.chiitoitsu).min(self.kokushi)
    }

    pub fn get(&self, archetype: Archetype) -> i8 {
        match archetype {
            Archetype::Normal => self.normal,
            Archetype::Chiitoitsu => self.chiitoitsu,
            Archetype::Kokushi => self.kokushi,
        }
    }

    /// Archetypes sitting at the minimum.
    pub fn best(&self) -> Vec<Archetype> {
        let min = self.minimum();
        [Archetype::Normal, Archetype::Chiitoitsu, Archetype::Kokushi]
            .into_iter()
            .filter(|&a| self.get(a) == min)
            .collect()
    }
}

/// Tiles that would lower shanten, per archetype. Tiles already in hand are
/// never listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outs {
    pub normal: Vec<Tile>,
    pub chiitoitsu: Vec<Tile>,
    pub kokushi: Vec<Tile>,
}

impl Outs {
    pub fn get(&self, archetype: Archetype) -> &[Tile] {
        match archetype {
            Archetype::Normal => &self.normal,
            Archetype::Chiitoitsu => &self.chiitoitsu,
            Archetype::Kokushi => &self.kokushi,
        }
    }
}

/// Distinct codes of a tile list, in code order.
pub fn distinct_codes(tiles: &[Tile]) -> Vec<u8> {
    tiles
        .iter()
        .map(|t| t.code())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Closed-form archetypes
// ---------------------------------------------------------------------------

/// `7 - pairs - 1`, or [`SHANTEN_UNREACHABLE`] once melds have been called.
pub fn shanten_chiitoitsu(hand: &HandVector) -> i8 {
    if hand.total() < CLOSED_HAND_TILES {
        return SHANTEN_UNREACHABLE;
    }
    let pairs = hand.counts().iter().filter(|&&c| c >= 2).count() as i8;
    CHIITOITSU_PAIRS - pairs - 1
}

/// `13 - distinct orphans - (1 if an orphan is paired)`, or
/// [`SHANTEN_UNREACHABLE`] once melds have been called.
pub fn shanten_kokushi(hand: &HandVector) -> i8 {
    if hand.total() < CLOSED_HAND_TILES {
        return SHANTEN_UNREACHABLE;
    }
    let kinds = ORPHAN_CODES.iter().filter(|&&c| hand.count(c) > 0).count() as i8;
    let head = ORPHAN_CODES.iter().any(|&c| hand.count(c) >= 2) as i8;
    KOKUSHI_KINDS - kinds - head
}

// ---------------------------------------------------------------------------
// HandEvaluator
// ---------------------------------------------------------------------------

/// Evaluates hands against a shared, read-only [`ShantenTable`]. Cloning is
/// cheap and every clone can be used from its own thread.
#[derive(Debug, Clone)]
pub struct HandEvaluator {
    table: Arc<ShantenTable>,
    /// Partition target slots, indexed by the number of called melds.
    partitions: Vec<Vec<[usize; 4]>>,
    catalog: TileCatalog,
}

impl HandEvaluator {
    /// Evaluator whose outs carry the red-five flags of the default catalog.
    pub fn new(table: Arc<ShantenTable>) -> Self {
        Self::with_catalog(table, TileCatalog::default())
    }

    pub fn with_catalog(table: Arc<ShantenTable>, catalog: TileCatalog) -> Self {
        let partitions = (0..=MAX_MELDS)
            .map(|called| {
                pattern::agari_partitions(called)
                    .iter()
                    .filter_map(partition_slots)
                    .collect()
            })
            .collect();
        Self {
            table,
            partitions,
            catalog,
        }
    }

    pub fn table(&self) -> &Arc<ShantenTable> {
        &self.table
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    /// Normal-hand shanten. The hand size implies how many melds were called:
    /// a 13/14-tile hand has none, 10/11 one, down to 1/2 with four.
    pub fn shanten_normal(&self, hand: &HandVector) -> i8 {
        let called = MAX_MELDS.saturating_sub(hand.total() / 3) as usize;
        let rows = [
            self.table.number().row(hand.group(Suit::Manzu)),
            self.table.number().row(hand.group(Suit::Pinzu)),
            self.table.number().row(hand.group(Suit::Souzu)),
            self.table.honor().row(hand.group(Suit::Honor)),
        ];
        let best = self.partitions[called]
            .iter()
            .map(|slots| {
                rows.iter()
                    .zip(slots)
                    .map(|(row, &slot)| row[slot] as u16)
                    .sum::<u16>()
            })
            .min()
            .unwrap_or(u16::from(u8::MAX));
        debug_assert!(best < u16::from(u8::MAX), "shanten table row is unset");
        best as i8 - 1
    }

    pub fn shanten(&self, hand: &HandVector) -> ShantenBreakdown {
        ShantenBreakdown {
            normal: self.shanten_normal(hand),
            chiitoitsu: shanten_chiitoitsu(hand),
            kokushi: shanten_kokushi(hand),
        }
    }

    pub fn shanten_of(&self, archetype: Archetype, hand: &HandVector) -> i8 {
        match archetype {
            Archetype::Normal => self.shanten_normal(hand),
            Archetype::Chiitoitsu => shanten_chiitoitsu(hand),
            Archetype::Kokushi => shanten_kokushi(hand),
        }
    }

    pub fn shanten_minimum(&self, hand: &HandVector) -> i8 {
        self.shanten(hand).minimum()
    }

    pub fn is_agari(&self, hand: &HandVector) -> bool {
        self.shanten_minimum(hand) == -1
    }

    pub fn is_tenpai(&self, hand: &HandVector) -> bool {
        self.shanten_minimum(hand) == 0
    }

    /// Codes that complete `hand`. A seven-pairs count that includes a
    /// triplet rates the hand tenpai while this list stays empty.
    pub fn winning_codes(&self, hand: &HandVector) -> Vec<u8> {
        (0..NUM_CODES as u8)
            .filter(|&code| hand.with_added(code).is_some_and(|next| self.is_agari(&next)))
            .collect()
    }

    /// Outs of every archetype for the closed tiles `tiles`.
    pub fn outs(&self, tiles: &[Tile]) -> Outs {
        let hand = HandVector::from_tiles(tiles);
        let mut held = [false; NUM_TILES];
        for tile in tiles {
            held[tile.id() as usize] = true;
        }
        Outs {
            normal: self.normal_outs(&hand, &held),
            chiitoitsu: self.chiitoitsu_outs(&hand, &held),
            kokushi: self.kokushi_outs(&hand, &held),
        }
    }

    /// Number of outs of the archetype(s) currently at the minimum shanten.
    /// A hand holding its drawn tile (3n+2 tiles) has no outs to count.
    pub fn count_minimum_outs(&self, tiles: &[Tile]) -> usize {
        if tiles.len() % 3 == 2 {
            return 0;
        }
        let hand = HandVector::from_tiles(tiles);
        let outs = self.outs(tiles);
        self.shanten(&hand)
            .best()
            .into_iter()
            .flat_map(|a| outs.get(a).iter().map(|t| t.id()))
            .collect::<BTreeSet<_>>()
            .len()
    }

    // ---- Per-archetype outs ----

    fn unheld_copies(&self, code: u8, held: &[bool; NUM_TILES]) -> Vec<Tile> {
        let tiles = self.catalog.all();
        ids_of_code(code)
            .filter(|&id| !held[id as usize])
            .map(|id| tiles[id as usize])
            .collect()
    }

    fn normal_outs(&self, hand: &HandVector, held: &[bool; NUM_TILES]) -> Vec<Tile> {
        let current = self.shanten_minimum(hand);
        (0..NUM_CODES as u8)
            .filter(|&code| {
                hand.with_added(code)
                    .is_some_and(|next| self.shanten_minimum(&next) < current)
            })
            .flat_map(|code| self.unheld_copies(code, held))
            .collect()
    }

    fn chiitoitsu_outs(&self, hand: &HandVector, held: &[bool; NUM_TILES]) -> Vec<Tile> {
        if shanten_chiitoitsu(hand) == SHANTEN_UNREACHABLE {
            return Vec::new();
        }
        (0..NUM_CODES as u8)
            .filter(|&code| hand.count(code) == 1)
            .flat_map(|code| self.unheld_copies(code, held))
            .collect()
    }

    fn kokushi_outs(&self, hand: &HandVector, held: &[bool; NUM_TILES]) -> Vec<Tile> {
        if shanten_kokushi(hand) == SHANTEN_UNREACHABLE {
            return Vec::new();
        }
        let has_head = ORPHAN_CODES.iter().any(|&c| hand.count(c) >= 2);
        ORPHAN_CODES
            .iter()
            .copied()
            .filter(|&code| !has_head || hand.count(code) == 0)
            .flat_map(|code| self.unheld_copies(code, held))
            .collect()
    }
}

fn partition_slots(partition: &AgariPartition) -> Option<[usize; 4]> {
    let mut slots = [0usize; 4];
    for (slot, &count) in slots.iter_mut().zip(partition) {
        *slot = pattern::target_slot(count)?;
    }
    Some(slots)
}
