use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use crate::errors::{EngineError, EngineResult};
use crate::tile::{next_dora_code, Tile, TileCatalog, NUM_TILES};
use crate::types::MeldKind;

pub const LIVE_WALL_TILES: usize = 122;
pub const DEAD_WALL_TILES: usize = 14;
pub const MAX_KONGS: u8 = 4;

// Dead wall layout.
const OPEN_DORA_START: usize = 0;
const BLIND_DORA_START: usize = 5;
const REPLACEMENT_START: usize = 10;

/// The shuffled 136 tiles of one hand: a 122-tile live wall followed by the
/// 14-tile dead wall.
#[derive(Debug, Clone)]
pub struct TileWall {
    tiles: Vec<Tile>,
    draw_count: u8,
    kong_count: u8,
    digest: String,
    seed: Option<u64>,
    hand_index: u64,
}

impl TileWall {
    /// Builds and shuffles a wall. With a seed, the n-th shuffle of the wall
    /// is a pure function of `(seed, n)`.
    pub fn new(catalog: &TileCatalog, seed: Option<u64>) -> Self {
        let mut wall = Self {
            tiles: Vec::new(),
            draw_count: 0,
            kong_count: 0,
            digest: String::new(),
            seed,
            hand_index: 0,
        };
        wall.shuffle(catalog);
        wall
    }

    /// Uses `tiles` as the wall order, unshuffled. They must be the 136
    /// distinct tiles.
    pub fn from_tiles(tiles: Vec<Tile>) -> EngineResult<Self> {
        if tiles.len() != NUM_TILES {
            return Err(EngineError::InvalidTile {
                value: tiles.len() as u32,
                message: format!("a wall needs {} tiles", NUM_TILES),
            });
        }
        let mut seen = [false; NUM_TILES];
        for tile in &tiles {
            if std::mem::replace(&mut seen[tile.id() as usize], true) {
                return Err(EngineError::InvalidTile {
                    value: tile.id() as u32,
                    message: "tile appears twice in the wall".to_string(),
                });
            }
        }
        let digest = wall_digest(&tiles);
        Ok(Self {
            tiles,
            draw_count: 0,
            kong_count: 0,
            digest,
            seed: None,
            hand_index: 0,
        })
    }

    /// Reshuffles all 136 tiles and resets the counters.
    pub fn shuffle(&mut self, catalog: &TileCatalog) {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(splitmix64(seed.wrapping_add(self.hand_index))),
            None => ChaCha8Rng::from_os_rng(),
        };
        self.hand_index = self.hand_index.wrapping_add(1);

        let mut tiles = catalog.all().to_vec();
        fisher_yates_shuffle(&mut tiles, &mut rng);
        self.digest = wall_digest(&tiles);
        self.tiles = tiles;
        self.draw_count = 0;
        self.kong_count = 0;
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn live_tiles(&self) -> &[Tile] {
        &self.tiles[..LIVE_WALL_TILES]
    }

    pub fn dead_tiles(&self) -> &[Tile] {
        &self.tiles[LIVE_WALL_TILES..]
    }

    /// Hex SHA-256 of the tile order.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Shuffles performed so far.
    pub fn hand_index(&self) -> u64 {
        self.hand_index
    }

    pub fn draw_count(&self) -> u8 {
        self.draw_count
    }

    pub fn kong_count(&self) -> u8 {
        self.kong_count
    }

    /// Live tiles left. Each kong moves one live tile to the dead wall.
    pub fn remaining(&self) -> usize {
        LIVE_WALL_TILES.saturating_sub(self.draw_count as usize + self.kong_count as usize)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Next live tile, or `None` once the wall is exhausted.
    pub fn draw(&mut self) -> Option<Tile> {
        if self.is_exhausted() {
            return None;
        }
        let tile = self.tiles[self.draw_count as usize];
        self.draw_count += 1;
        Some(tile)
    }

    pub fn can_kong(&self) -> bool {
        self.kong_count < MAX_KONGS && !self.is_exhausted()
    }

    /// Records a kong: reveals one more dora and blind-dora indicator and
    /// returns the replacement tile. A fifth kong is refused as an illegal
    /// call of `kind`.
    pub fn increase_kong_count(&mut self, kind: MeldKind) -> EngineResult<Tile> {
        if !self.can_kong() {
            return Err(EngineError::IllegalCall {
                kind,
                message: format!("no kong possible after {} kongs", self.kong_count),
            });
        }
        let replacement = self.dead_tiles()[REPLACEMENT_START + self.kong_count as usize];
        self.kong_count += 1;
        Ok(replacement)
    }

    /// Revealed indicators, `kong_count + 1` of them.
    pub fn open_dora_indicators(&self) -> &[Tile] {
        let start = OPEN_DORA_START;
        &self.dead_tiles()[start..start + self.kong_count as usize + 1]
    }

    /// Blind (ura) indicators, same count as the open ones.
    pub fn blind_dora_indicators(&self) -> &[Tile] {
        let start = BLIND_DORA_START;
        &self.dead_tiles()[start..start + self.kong_count as usize + 1]
    }

    pub fn open_dora_codes(&self) -> Vec<u8> {
        self.open_dora_indicators()
            .iter()
            .map(|t| next_dora_code(t.code()))
            .collect()
    }

    pub fn blind_dora_codes(&self) -> Vec<u8> {
        self.blind_dora_indicators()
            .iter()
            .map(|t| next_dora_code(t.code()))
            .collect()
    }
}

pub fn fisher_yates_shuffle<T>(slice: &mut [T], rng: &mut impl Rng) {
    for i in (1..slice.len()).rev() {
        let j = rng.random_range(0..=i);
        slice.swap(i, j);
    }
}

fn wall_digest(tiles: &[Tile]) -> String {
    let mut hasher = Sha256::new();
    for tile in tiles {
        hasher.update([tile.id()]);
    }
    format!("{:x}", hasher.finalize())
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
