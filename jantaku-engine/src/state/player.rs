use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::hand_evaluator::HandEvaluator;
use crate::tile::{Tile, HONOR_START, NUM_CODES};
use crate::types::{HandVector, Meld, MeldKind, Wind};

/// Status recorded after every draw and discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandStatus {
    pub shanten: i8,
    pub minimum_outs: usize,
}

/// One seat's private and public state for the current hand, plus the
/// score that persists across hands.
#[derive(Debug, Clone)]
pub struct Player {
    id: u8,
    hand: Vec<Tile>,
    river: Vec<Tile>,
    melds: Vec<Meld>,
    menzen: bool,
    riichi: bool,
    drawn: Option<Tile>,
    score: i32,
    wind: Option<Wind>,
    rank: Option<u8>,
    point_history: Vec<i32>,
    hand_history: Vec<Vec<Tile>>,
    shanten_history: Vec<i8>,
    outs_history: Vec<usize>,
}

impl Player {
    pub fn new(id: u8, starting_score: i32) -> Self {
        Self {
            id,
            hand: Vec::with_capacity(14),
            river: Vec::with_capacity(24),
            melds: Vec::new(),
            menzen: true,
            riichi: false,
            drawn: None,
            score: starting_score,
            wind: None,
            rank: None,
            point_history: Vec::new(),
            hand_history: Vec::new(),
            shanten_history: Vec::new(),
            outs_history: Vec::new(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Closed tiles in acquisition order; the last entry is the latest draw.
    pub fn hand(&self) -> &[Tile] {
        &self.hand
    }

    /// Closed tiles sorted by id. Discard indices address this order.
    pub fn sorted_hand(&self) -> Vec<Tile> {
        let mut sorted = self.hand.clone();
        sorted.sort();
        sorted
    }

    pub fn hand_vector(&self) -> HandVector {
        HandVector::from_tiles(&self.hand)
    }

    pub fn river(&self) -> &[Tile] {
        &self.river
    }

    pub fn melds(&self) -> &[Meld] {
        &self.melds
    }

    pub fn is_menzen(&self) -> bool {
        self.menzen
    }

    pub fn is_riichi(&self) -> bool {
        self.riichi
    }

    /// Tile taken by the most recent draw, cleared on discard or call.
    pub fn drawn_tile(&self) -> Option<Tile> {
        self.drawn
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn wind(&self) -> Option<Wind> {
        self.wind
    }

    pub fn set_wind(&mut self, wind: Wind) {
        self.wind = Some(wind);
    }

    /// Final placing, 1-4, once assigned.
    pub fn rank(&self) -> Option<u8> {
        self.rank
    }

    pub fn set_rank(&mut self, rank: u8) {
        self.rank = Some(rank);
    }

    pub fn point_history(&self) -> &[i32] {
        &self.point_history
    }

    pub fn hand_history(&self) -> &[Vec<Tile>] {
        &self.hand_history
    }

    pub fn shanten_history(&self) -> &[i8] {
        &self.shanten_history
    }

    pub fn outs_history(&self) -> &[usize] {
        &self.outs_history
    }

    fn code_count(&self, code: u8) -> usize {
        self.hand.iter().filter(|t| t.code() == code).count()
    }

    fn holds_code(&self, code: u8) -> bool {
        self.hand.iter().any(|t| t.code() == code)
    }

    // -----------------------------------------------------------------------
    // Call predicates
    // -----------------------------------------------------------------------

    pub fn can_pon(&self, target: &Tile) -> bool {
        self.code_count(target.code()) >= 2
    }

    /// Code pairs from hand that form a run with `target`, lowest run first.
    /// Honors and nines are never called.
    pub fn chi_options(&self, target: &Tile) -> Vec<[u8; 2]> {
        let code = target.code();
        let rank = target.rank();
        if code >= HONOR_START || rank == 9 {
            return Vec::new();
        }
        let mut candidates = Vec::with_capacity(3);
        if rank >= 3 {
            candidates.push([code - 2, code - 1]);
        }
        if rank >= 2 {
            candidates.push([code - 1, code + 1]);
        }
        if rank <= 7 {
            candidates.push([code + 1, code + 2]);
        }
        candidates.retain(|pair| pair.iter().all(|&c| self.holds_code(c)));
        candidates
    }

    pub fn can_chi(&self, target: &Tile) -> bool {
        !self.chi_options(target).is_empty()
    }

    /// Codes held four times.
    pub fn ankan_codes(&self) -> Vec<u8> {
        let counts = self.hand_vector();
        (0..NUM_CODES as u8).filter(|&c| counts.count(c) == 4).collect()
    }

    pub fn can_ankan(&self) -> bool {
        !self.ankan_codes().is_empty()
    }

    pub fn can_daiminkan(&self, target: &Tile) -> bool {
        self.code_count(target.code()) == 3
    }

    /// Codes of pon melds whose fourth tile is in hand.
    pub fn kakan_codes(&self) -> Vec<u8> {
        self.melds
            .iter()
            .filter(|m| m.kind == MeldKind::Pon)
            .filter_map(|m| m.base_code())
            .filter(|&c| self.holds_code(c))
            .collect()
    }

    pub fn can_kakan(&self) -> bool {
        !self.kakan_codes().is_empty()
    }

    /// Closed with no melds at all, concealed kongs included.
    pub fn can_riichi(&self) -> bool {
        self.menzen && self.melds.is_empty() && !self.riichi
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn draw(&mut self, tile: Tile) {
        self.hand.push(tile);
        self.drawn = Some(tile);
    }

    pub fn discard(&mut self, tile: &Tile) -> EngineResult<()> {
        let pos = self
            .hand
            .iter()
            .position(|t| t.id() == tile.id())
            .ok_or_else(|| EngineError::IllegalDiscard {
                tile: tile.to_string(),
            })?;
        let removed = self.hand.remove(pos);
        self.river.push(removed);
        self.drawn = None;
        self.record_hand();
        Ok(())
    }

    /// Discards the tile at `index` of the sorted hand.
    pub fn discard_index(&mut self, index: usize) -> EngineResult<Tile> {
        let tile = self
            .sorted_hand()
            .get(index)
            .copied()
            .ok_or_else(|| EngineError::IllegalDiscard {
                tile: format!("index {} of {}", index, self.hand.len()),
            })?;
        self.discard(&tile)?;
        Ok(tile)
    }

    pub fn declare_riichi(&mut self, tile: &Tile) -> EngineResult<()> {
        if !self.can_riichi() {
            return Err(EngineError::IllegalAction {
                message: format!("player {} cannot declare riichi", self.id),
            });
        }
        self.discard(tile)?;
        self.riichi = true;
        Ok(())
    }

    pub fn pon(&mut self, target: Tile, from: u8) -> EngineResult<()> {
        if !self.can_pon(&target) {
            return Err(illegal(MeldKind::Pon, format!("fewer than two {} in hand", target.name())));
        }
        let taken = self.take_codes(&[target.code(), target.code()]);
        self.push_called_meld(MeldKind::Pon, taken, target, from);
        Ok(())
    }

    /// Calls a run using the hand codes in `pair`, which must be one of
    /// [`Player::chi_options`].
    pub fn chi(&mut self, target: Tile, pair: [u8; 2], from: u8) -> EngineResult<()> {
        if !self.chi_options(&target).contains(&pair) {
            return Err(illegal(
                MeldKind::Chi,
                format!("{:?} does not run with {}", pair, target.name()),
            ));
        }
        let taken = self.take_codes(&pair);
        self.push_called_meld(MeldKind::Chi, taken, target, from);
        Ok(())
    }

    pub fn ankan(&mut self, code: u8) -> EngineResult<()> {
        if self.code_count(code) != 4 {
            return Err(illegal(MeldKind::ClosedKong, format!("code {} is not held four times", code)));
        }
        let taken = self.take_codes(&[code; 4]);
        self.melds.push(Meld::new(MeldKind::ClosedKong, taken, None, None));
        self.drawn = None;
        self.record_hand();
        Ok(())
    }

    pub fn daiminkan(&mut self, target: Tile, from: u8) -> EngineResult<()> {
        if !self.can_daiminkan(&target) {
            return Err(illegal(
                MeldKind::OpenKong,
                format!("{} is not held three times", target.name()),
            ));
        }
        let taken = self.take_codes(&[target.code(); 3]);
        self.push_called_meld(MeldKind::OpenKong, taken, target, from);
        Ok(())
    }

    /// Extends the pon of `code` with the matching tile from hand. Returns
    /// the added tile.
    pub fn kakan(&mut self, code: u8) -> EngineResult<Tile> {
        let meld_index = self
            .melds
            .iter()
            .position(|m| m.kind == MeldKind::Pon && m.base_code() == Some(code))
            .filter(|_| self.holds_code(code))
            .ok_or_else(|| illegal(MeldKind::ExtendedKong, format!("no pon of code {} to extend", code)))?;
        let added = self.take_codes(&[code]);
        let meld = &mut self.melds[meld_index];
        meld.kind = MeldKind::ExtendedKong;
        meld.tiles.extend(added.iter().copied());
        meld.tiles.sort();
        self.menzen = false;
        self.drawn = None;
        self.record_hand();
        added
            .first()
            .copied()
            .ok_or_else(|| illegal(MeldKind::ExtendedKong, "no tile taken".to_string()))
    }

    /// Removes one tile per entry of `codes`. Callers validate counts first.
    fn take_codes(&mut self, codes: &[u8]) -> Vec<Tile> {
        let mut taken = Vec::with_capacity(codes.len());
        for &code in codes {
            // Keep red fives in hand when a plain copy serves.
            let pos = self
                .hand
                .iter()
                .enumerate()
                .filter(|(_, t)| t.code() == code)
                .min_by_key(|(_, t)| (t.is_red(), t.id()))
                .map(|(i, _)| i);
            if let Some(pos) = pos {
                taken.push(self.hand.remove(pos));
            }
        }
        taken
    }

    fn push_called_meld(&mut self, kind: MeldKind, mut tiles: Vec<Tile>, target: Tile, from: u8) {
        tiles.push(target);
        self.melds.push(Meld::new(kind, tiles, Some(target), Some(from)));
        self.menzen = false;
        self.drawn = None;
        self.record_hand();
    }

    fn record_hand(&mut self) {
        self.hand_history.push(self.hand.clone());
    }

    /// Appends the current shanten and minimum-outs count to the histories.
    pub fn record_hand_status(&mut self, evaluator: &HandEvaluator) -> HandStatus {
        let shanten = evaluator.shanten_minimum(&self.hand_vector());
        let minimum_outs = evaluator.count_minimum_outs(&self.hand);
        self.shanten_history.push(shanten);
        self.outs_history.push(minimum_outs);
        HandStatus {
            shanten,
            minimum_outs,
        }
    }

    pub fn award_point(&mut self, points: i32) {
        self.score += points;
        self.point_history.push(points);
    }

    /// Clears hand state for a new hand; score survives.
    pub fn restart(&mut self) {
        self.hand.clear();
        self.river.clear();
        self.melds.clear();
        self.menzen = true;
        self.riichi = false;
        self.drawn = None;
        self.wind = None;
        self.hand_history.clear();
        self.shanten_history.clear();
        self.outs_history.clear();
    }

    /// Clears everything for a new match.
    pub fn reset(&mut self, starting_score: i32) {
        self.restart();
        self.score = starting_score;
        self.rank = None;
        self.point_history.clear();
    }
}

fn illegal(kind: MeldKind, message: String) -> EngineError {
    EngineError::IllegalCall { kind, message }
}
