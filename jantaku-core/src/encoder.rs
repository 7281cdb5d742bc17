//! Flat feature vector handed to the external agent.
//!
//! Layout, in order:
//!
//! - acting player (198): id, 34 hand counts, 4x34 meld counts,
//!   24 river slots, score, shanten, minimum outs
//! - each other player in seat order after the actor (3 x 162): id,
//!   4x34 meld counts, 24 river slots, score
//! - table (13): remaining tiles, 5 open dora slots, kong count, round,
//!   honba, host id, 3 children ids
//!
//! River and dora slots hold `code / 34`, padded with `-1`.

use jantaku_engine::state::game_mode::NUM_PLAYERS;
use jantaku_engine::state::player::Player;
use jantaku_engine::tile::NUM_CODES;
use jantaku_engine::{HandEvaluator, Table, Tile};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TILE_SCALE: f32 = NUM_CODES as f32;
const SCORE_SCALE: f32 = 100_000.0;
const SHANTEN_SCALE: f32 = 8.0;
const OUTS_SCALE: f32 = 13.0;

/// Meld slots per player.
pub const MELD_SLOTS: usize = 4;
/// River slots per player. Later discards are dropped.
pub const RIVER_SLOTS: usize = 24;
/// Open dora indicator slots.
pub const DORA_SLOTS: usize = 5;

const MELD_FEATURES: usize = MELD_SLOTS * NUM_CODES;
pub const SELF_FEATURES: usize = 1 + NUM_CODES + MELD_FEATURES + RIVER_SLOTS + 3;
pub const OTHER_FEATURES: usize = 1 + MELD_FEATURES + RIVER_SLOTS + 1;
pub const TABLE_FEATURES: usize = 1 + DORA_SLOTS + 5 + (NUM_PLAYERS - 1);
pub const FEATURE_SIZE: usize = SELF_FEATURES + (NUM_PLAYERS - 1) * OTHER_FEATURES + TABLE_FEATURES;

const PAD: f32 = -1.0;

// ---------------------------------------------------------------------------
// StateEncoder
// ---------------------------------------------------------------------------

/// Reusable feature buffer. Call [`StateEncoder::encode`] per decision.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    buffer: Vec<f32>,
}

impl StateEncoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(FEATURE_SIZE),
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }

    /// Encodes the table from `player`'s point of view.
    pub fn encode(&mut self, table: &Table, player: u8, evaluator: &HandEvaluator) -> &[f32] {
        self.buffer.clear();
        let players = table.players();
        let me = &players[player as usize % NUM_PLAYERS];
        self.push_self(me, evaluator);

        // Others follow in turn order after `me`.
        let order = table.wind_order();
        for &seat in order
            .iter()
            .cycle()
            .skip_while(|&&p| p != me.id())
            .skip(1)
            .take(NUM_PLAYERS - 1)
        {
            self.push_other(&players[seat as usize]);
        }
        self.push_table(table);
        debug_assert_eq!(self.buffer.len(), FEATURE_SIZE);
        &self.buffer
    }

    fn push_self(&mut self, player: &Player, evaluator: &HandEvaluator) {
        self.buffer.push(player.id() as f32);
        let hand = player.hand_vector();
        self.buffer.extend(hand.counts().iter().map(|&c| c as f32));
        self.push_melds(player);
        self.push_river(player.river());
        self.buffer.push(player.score() as f32 / SCORE_SCALE);
        let shanten = evaluator.shanten_minimum(&hand);
        self.buffer.push(shanten as f32 / SHANTEN_SCALE);
        let outs = evaluator.count_minimum_outs(player.hand());
        self.buffer.push(outs as f32 / OUTS_SCALE);
    }

    fn push_other(&mut self, player: &Player) {
        self.buffer.push(player.id() as f32);
        self.push_melds(player);
        self.push_river(player.river());
        self.buffer.push(player.score() as f32 / SCORE_SCALE);
    }

    fn push_melds(&mut self, player: &Player) {
        let start = self.buffer.len();
        self.buffer.resize(start + MELD_FEATURES, 0.0);
        for (slot, meld) in player.melds().iter().take(MELD_SLOTS).enumerate() {
            for tile in &meld.tiles {
                self.buffer[start + slot * NUM_CODES + tile.code() as usize] += 1.0;
            }
        }
    }

    fn push_river(&mut self, river: &[Tile]) {
        self.push_codes(river, RIVER_SLOTS);
    }

    fn push_codes(&mut self, tiles: &[Tile], slots: usize) {
        let start = self.buffer.len();
        self.buffer.resize(start + slots, PAD);
        for (slot, tile) in tiles.iter().take(slots).enumerate() {
            self.buffer[start + slot] = tile.code() as f32 / TILE_SCALE;
        }
    }

    fn push_table(&mut self, table: &Table) {
        self.buffer.push(table.wall().remaining() as f32);
        self.push_codes(table.open_dora_indicators(), DORA_SLOTS);
        self.buffer.push(table.wall().kong_count() as f32);
        self.buffer.push(table.round_count() as f32);
        self.buffer.push(table.honba_count() as f32);
        self.buffer.push(table.host() as f32);
        self.buffer.extend(table.children().iter().map(|&id| id as f32));
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new()
    }
}
