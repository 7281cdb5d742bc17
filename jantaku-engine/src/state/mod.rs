use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::errors::{EngineError, EngineResult};
use crate::hand_evaluator::HandEvaluator;
use crate::score::{scorer_notation, ScoreMeld, ScoreRequest, ScoreResponse};
use crate::tile::{Tile, TileCatalog, NUM_TILES};
use crate::types::{MeldKind, Wind};

pub mod game_mode;
pub mod legal_actions;
pub mod player;
pub mod wall;

use game_mode::{round_name, round_wind, TableConfig, NUM_PLAYERS};
use player::{HandStatus, Player};
use wall::{fisher_yates_shuffle, TileWall};

const STARTING_HAND_SIZE: usize = 13;

/// Seed stream used for seat shuffles, kept apart from the wall stream.
const SEAT_STREAM: u64 = 0x5EA7_0DE5;

/// One four-player table: the wall, the players and the round counters.
///
/// Tiles are immutable arena records; which player currently holds each tile
/// id is tracked here in `holders`.
#[derive(Debug, Clone)]
pub struct Table {
    config: TableConfig,
    catalog: TileCatalog,
    wall: TileWall,
    players: [Player; NUM_PLAYERS],
    seat_order: [u8; NUM_PLAYERS],
    round_count: u8,
    honba_count: u8,
    holders: [Option<u8>; NUM_TILES],
    rng: ChaCha8Rng,
}

impl Table {
    /// Builds a table with a shuffled wall and seat order. The same seed
    /// replays the same match given the same decisions.
    pub fn new(config: TableConfig, seed: Option<u64>) -> EngineResult<Self> {
        config.validate()?;
        let catalog = TileCatalog::new(config.red_dora);
        let wall = TileWall::new(&catalog, seed);
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ SEAT_STREAM),
            None => ChaCha8Rng::from_os_rng(),
        };
        let mut table = Self::assemble(config, catalog, wall, rng);
        fisher_yates_shuffle(&mut table.seat_order, &mut table.rng);
        table.assign_winds();
        Ok(table)
    }

    /// Builds a table over a prepared wall with seats in id order. Wall
    /// tiles must agree with the catalog implied by `config.red_dora`.
    pub fn with_wall(config: TableConfig, wall: TileWall) -> EngineResult<Self> {
        config.validate()?;
        let catalog = TileCatalog::new(config.red_dora);
        for tile in wall.tiles() {
            catalog.verify(tile)?;
        }
        let mut table = Self::assemble(config, catalog, wall, ChaCha8Rng::seed_from_u64(SEAT_STREAM));
        table.assign_winds();
        Ok(table)
    }

    fn assemble(config: TableConfig, catalog: TileCatalog, wall: TileWall, rng: ChaCha8Rng) -> Self {
        let score = config.starting_score;
        Self {
            players: std::array::from_fn(|id| Player::new(id as u8, score)),
            seat_order: std::array::from_fn(|id| id as u8),
            config,
            catalog,
            wall,
            round_count: 0,
            honba_count: 0,
            holders: [None; NUM_TILES],
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn wall(&self) -> &TileWall {
        &self.wall
    }

    pub fn players(&self) -> &[Player; NUM_PLAYERS] {
        &self.players
    }

    pub fn player(&self, id: u8) -> EngineResult<&Player> {
        self.players
            .get(id as usize)
            .ok_or_else(|| EngineError::IllegalAction {
                message: format!("no player {}", id),
            })
    }

    fn player_mut(&mut self, id: u8) -> EngineResult<&mut Player> {
        self.players
            .get_mut(id as usize)
            .ok_or_else(|| EngineError::IllegalAction {
                message: format!("no player {}", id),
            })
    }

    pub fn seat_order(&self) -> [u8; NUM_PLAYERS] {
        self.seat_order
    }

    pub fn round_count(&self) -> u8 {
        self.round_count
    }

    pub fn honba_count(&self) -> u8 {
        self.honba_count
    }

    pub fn round_name(&self) -> String {
        round_name(self.round_count)
    }

    pub fn round_wind(&self) -> Wind {
        round_wind(self.round_count)
    }

    /// Current holder of a tile id: the player whose hand, meld or river
    /// has it.
    pub fn holder(&self, tile_id: u8) -> Option<u8> {
        self.holders.get(tile_id as usize).copied().flatten()
    }

    /// Player ids in East, South, West, North order for this round.
    pub fn wind_order(&self) -> [u8; NUM_PLAYERS] {
        let mut order = self.seat_order;
        order.rotate_left(self.round_count as usize % NUM_PLAYERS);
        order
    }

    /// The dealer (East seat).
    pub fn host(&self) -> u8 {
        self.wind_order()[0]
    }

    pub fn children(&self) -> [u8; NUM_PLAYERS - 1] {
        let order = self.wind_order();
        [order[1], order[2], order[3]]
    }

    /// Player who acts after `player`.
    pub fn next_seat(&self, player: u8) -> EngineResult<u8> {
        let order = self.wind_order();
        let pos = order
            .iter()
            .position(|&p| p == player)
            .ok_or_else(|| EngineError::IllegalAction {
                message: format!("no player {}", player),
            })?;
        Ok(order[(pos + 1) % NUM_PLAYERS])
    }

    pub fn open_dora_indicators(&self) -> &[Tile] {
        self.wall.open_dora_indicators()
    }

    pub fn blind_dora_indicators(&self) -> &[Tile] {
        self.wall.blind_dora_indicators()
    }

    pub fn dora_codes(&self) -> Vec<u8> {
        self.wall.open_dora_codes()
    }

    pub fn is_wall_exhausted(&self) -> bool {
        self.wall.is_exhausted()
    }

    // -----------------------------------------------------------------------
    // Turn operations
    // -----------------------------------------------------------------------

    /// Deals 13 tiles to each player from the live wall, host first.
    pub fn deal_starting_hand(&mut self) {
        for player in self.wind_order() {
            for _ in 0..STARTING_HAND_SIZE {
                self.draw(player);
            }
        }
        debug!(
            "{} honba {}: dealt, host {}, wall {}",
            self.round_name(),
            self.honba_count,
            self.host(),
            &self.wall.digest()[..12]
        );
    }

    /// Gives `player` the next live tile. `None` once the wall is exhausted.
    pub fn draw(&mut self, player: u8) -> Option<Tile> {
        let tile = self.wall.draw()?;
        self.give(player, tile);
        Some(tile)
    }

    fn give(&mut self, player: u8, tile: Tile) {
        if let Some(p) = self.players.get_mut(player as usize) {
            p.draw(tile);
            self.holders[tile.id() as usize] = Some(player);
        }
    }

    pub fn discard(&mut self, player: u8, tile: &Tile) -> EngineResult<()> {
        self.player_mut(player)?.discard(tile)?;
        trace!("player {} discards {}", player, tile);
        Ok(())
    }

    /// Discards by index into the id-sorted hand.
    pub fn discard_index(&mut self, player: u8, index: usize) -> EngineResult<Tile> {
        let tile = self.player_mut(player)?.discard_index(index)?;
        trace!("player {} discards {}", player, tile);
        Ok(tile)
    }

    pub fn declare_riichi(&mut self, player: u8, tile: &Tile) -> EngineResult<()> {
        self.player_mut(player)?.declare_riichi(tile)?;
        trace!("player {} declares riichi on {}", player, tile);
        Ok(())
    }

    /// Appends `player`'s current shanten and minimum outs to its histories.
    pub fn record_hand_status(&mut self, player: u8, evaluator: &HandEvaluator) -> EngineResult<HandStatus> {
        Ok(self.player_mut(player)?.record_hand_status(evaluator))
    }

    /// Checks that `tile` is the latest, still unclaimed discard of
    /// `discarder` and that `caller` is someone else.
    fn check_claim(&self, kind: MeldKind, caller: u8, discarder: u8, tile: &Tile) -> EngineResult<()> {
        let reject = |message: String| Err(EngineError::IllegalCall { kind, message });
        if caller == discarder {
            return reject(format!("player {} cannot call their own discard", caller));
        }
        let latest = self.player(discarder)?.river().last();
        if latest != Some(tile) || self.holder(tile.id()) != Some(discarder) {
            return reject(format!("{} is not the live discard of player {}", tile, discarder));
        }
        Ok(())
    }

    fn claim(&mut self, caller: u8, tile: &Tile) {
        self.holders[tile.id() as usize] = Some(caller);
    }

    pub fn pon(&mut self, caller: u8, discarder: u8, tile: Tile) -> EngineResult<()> {
        self.check_claim(MeldKind::Pon, caller, discarder, &tile)?;
        self.player_mut(caller)?.pon(tile, discarder)?;
        self.claim(caller, &tile);
        trace!("player {} pons {} from {}", caller, tile, discarder);
        Ok(())
    }

    /// Chi is only open to the seat after the discarder.
    pub fn chi(&mut self, caller: u8, discarder: u8, tile: Tile, pair: [u8; 2]) -> EngineResult<()> {
        self.check_claim(MeldKind::Chi, caller, discarder, &tile)?;
        if self.next_seat(discarder)? != caller {
            return Err(EngineError::IllegalCall {
                kind: MeldKind::Chi,
                message: format!("player {} does not sit after player {}", caller, discarder),
            });
        }
        self.player_mut(caller)?.chi(tile, pair, discarder)?;
        self.claim(caller, &tile);
        trace!("player {} chis {} from {}", caller, tile, discarder);
        Ok(())
    }

    fn check_kong(&self, kind: MeldKind) -> EngineResult<()> {
        if self.wall.can_kong() {
            Ok(())
        } else {
            Err(EngineError::IllegalCall {
                kind,
                message: format!("no kong possible after {} kongs", self.wall.kong_count()),
            })
        }
    }

    /// Reveals a new indicator and hands the caller a replacement tile.
    fn replace_after_kong(&mut self, caller: u8, kind: MeldKind) -> EngineResult<Tile> {
        let replacement = self.wall.increase_kong_count(kind)?;
        self.give(caller, replacement);
        Ok(replacement)
    }

    pub fn daiminkan(&mut self, caller: u8, discarder: u8, tile: Tile) -> EngineResult<Tile> {
        self.check_kong(MeldKind::OpenKong)?;
        self.check_claim(MeldKind::OpenKong, caller, discarder, &tile)?;
        self.player_mut(caller)?.daiminkan(tile, discarder)?;
        self.claim(caller, &tile);
        trace!("player {} open kongs {} from {}", caller, tile, discarder);
        self.replace_after_kong(caller, MeldKind::OpenKong)
    }

    pub fn ankan(&mut self, player: u8, code: u8) -> EngineResult<Tile> {
        self.check_kong(MeldKind::ClosedKong)?;
        self.player_mut(player)?.ankan(code)?;
        trace!("player {} closed kongs code {}", player, code);
        self.replace_after_kong(player, MeldKind::ClosedKong)
    }

    pub fn kakan(&mut self, player: u8, code: u8) -> EngineResult<Tile> {
        self.check_kong(MeldKind::ExtendedKong)?;
        self.player_mut(player)?.kakan(code)?;
        trace!("player {} extends pon of code {}", player, code);
        self.replace_after_kong(player, MeldKind::ExtendedKong)
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    /// Describes a win for the scoring oracle. `loser` is the discarder on
    /// ron and `None` on tsumo; a tsumo winner already holds `winning_tile`.
    pub fn score_request(&self, winner: u8, winning_tile: Tile, loser: Option<u8>) -> EngineResult<ScoreRequest> {
        let player = self.player(winner)?;
        let closed_tiles = player
            .sorted_hand()
            .iter()
            .filter(|t| t.id() != winning_tile.id())
            .map(scorer_notation)
            .collect();
        let ura_dora_indicators = if player.is_riichi() {
            self.blind_dora_indicators().iter().map(scorer_notation).collect()
        } else {
            Vec::new()
        };
        let host = self.host();
        Ok(ScoreRequest {
            winner,
            loser,
            host,
            closed_tiles,
            melds: player.melds().iter().map(ScoreMeld::from).collect(),
            winning_tile: scorer_notation(&winning_tile),
            round_wind: self.round_wind(),
            seat_wind: player.wind().unwrap_or_default(),
            is_tsumo: loser.is_none(),
            is_riichi: player.is_riichi(),
            is_host: winner == host,
            dora_indicators: self.open_dora_indicators().iter().map(scorer_notation).collect(),
            ura_dora_indicators,
            honba: self.honba_count,
        })
    }

    /// Applies the oracle's per-player payments.
    pub fn apply_score(&mut self, response: &ScoreResponse) {
        for (player, &points) in self.players.iter_mut().zip(response.payments.iter()) {
            player.award_point(points);
        }
    }

    /// Player ids by score, highest first. Ties go to the earlier seat.
    pub fn ranked_players(&self) -> [u8; NUM_PLAYERS] {
        let mut ranked = self.seat_order;
        ranked.sort_by_key(|&id| std::cmp::Reverse(self.players[id as usize].score()));
        ranked
    }

    /// Stores each player's 1-based placing.
    pub fn assign_ranks(&mut self) {
        for (place, id) in self.ranked_players().into_iter().enumerate() {
            self.players[id as usize].set_rank(place as u8 + 1);
        }
    }

    // -----------------------------------------------------------------------
    // Round progression
    // -----------------------------------------------------------------------

    pub fn is_game_over(&self) -> bool {
        self.round_count >= self.config.game_mode.end_round()
            || self.players.iter().any(|p| p.score() < 0)
    }

    /// Replays the round with the same dealer and one more honba.
    pub fn restart(&mut self) {
        self.honba_count = self.honba_count.saturating_add(1);
        self.new_hand();
    }

    /// Moves to the next round; the deal passes to the next seat.
    pub fn proceed_to_next_round(&mut self) {
        self.round_count += 1;
        self.honba_count = 0;
        self.new_hand();
    }

    /// Starts a new match: fresh seats, counters and scores.
    pub fn reset(&mut self) {
        fisher_yates_shuffle(&mut self.seat_order, &mut self.rng);
        self.round_count = 0;
        self.honba_count = 0;
        let score = self.config.starting_score;
        for player in self.players.iter_mut() {
            player.reset(score);
        }
        self.new_hand();
    }

    fn new_hand(&mut self) {
        self.wall.shuffle(&self.catalog);
        for player in self.players.iter_mut() {
            player.restart();
        }
        self.holders = [None; NUM_TILES];
        self.assign_winds();
    }

    fn assign_winds(&mut self) {
        for (seat, id) in self.wind_order().into_iter().enumerate() {
            self.players[id as usize].set_wind(Wind::from(seat as u8));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game_mode::GameMode;

    fn ordered_table() -> Table {
        let wall = TileWall::from_tiles(TileCatalog::new(true).all().to_vec()).unwrap();
        Table::with_wall(TableConfig::default(), wall).unwrap()
    }

    #[test]
    fn deal_gives_thirteen_each_in_wind_order() {
        let mut table = ordered_table();
        table.deal_starting_hand();
        for player in table.players() {
            assert_eq!(player.hand().len(), 13);
        }
        // Host draws the first 13 ids.
        assert_eq!(table.host(), 0);
        assert_eq!(table.players()[0].sorted_hand()[0].id(), 0);
        assert_eq!(table.players()[1].sorted_hand()[0].id(), 13);
        assert_eq!(table.wall().draw_count(), 52);
        assert_eq!(table.holder(0), Some(0));
        assert_eq!(table.holder(60), None);
    }

    #[test]
    fn wind_order_rotates_with_rounds() {
        let mut table = ordered_table();
        assert_eq!(table.wind_order(), [0, 1, 2, 3]);
        assert_eq!(table.children(), [1, 2, 3]);
        table.proceed_to_next_round();
        assert_eq!(table.wind_order(), [1, 2, 3, 0]);
        assert_eq!(table.host(), 1);
        assert_eq!(table.players()[1].wind(), Some(Wind::East));
        assert_eq!(table.players()[0].wind(), Some(Wind::North));
        assert_eq!(table.next_seat(0).unwrap(), 1);
        assert_eq!(table.next_seat(1).unwrap(), 2);
    }

    #[test]
    fn next_seat_rejects_unknown_player() {
        let table = ordered_table();
        assert_eq!(table.next_seat(3).unwrap(), 0);
        assert!(matches!(
            table.next_seat(4),
            Err(EngineError::IllegalAction { .. })
        ));
    }

    #[test]
    fn restart_keeps_dealer_and_counts_honba() {
        let mut table = ordered_table();
        table.proceed_to_next_round();
        table.restart();
        assert_eq!(table.host(), 1);
        assert_eq!(table.honba_count(), 1);
        table.proceed_to_next_round();
        assert_eq!(table.honba_count(), 0);
        assert_eq!(table.round_name(), "East 3");
    }

    #[test]
    fn game_over_by_rounds_or_negative_score() {
        let config = TableConfig {
            game_mode: GameMode::EastOnly,
            ..TableConfig::default()
        };
        let mut table = Table::new(config, Some(1)).unwrap();
        for _ in 0..3 {
            table.proceed_to_next_round();
        }
        assert!(!table.is_game_over());
        table.proceed_to_next_round();
        assert!(table.is_game_over());

        let mut table = Table::new(TableConfig::default(), Some(1)).unwrap();
        table.players[2].award_point(-26000);
        assert!(table.is_game_over());
        table.reset();
        assert!(!table.is_game_over());
        assert_eq!(table.players()[2].score(), 25000);
    }

    #[test]
    fn claimed_discard_changes_holder_and_stays_in_river() {
        let mut table = ordered_table();
        table.deal_starting_hand();
        // Player 2 starts with 7m (id 26); player 1 holds the other two 7m.
        let seven_m = table.players()[2].sorted_hand()[0];
        assert_eq!(seven_m.code(), 6);
        table.discard(2, &seven_m).unwrap();
        assert!(table.players()[1].can_pon(&seven_m));
        table.pon(1, 2, seven_m).unwrap();
        assert_eq!(table.holder(seven_m.id()), Some(1));
        assert_eq!(table.players()[2].river(), &[seven_m]);
        // The same discard cannot be claimed twice.
        assert!(matches!(
            table.pon(3, 2, seven_m),
            Err(EngineError::IllegalCall { .. })
        ));
    }

    #[test]
    fn chi_only_from_previous_seat() {
        let mut table = ordered_table();
        table.deal_starting_hand();
        // Player 3 discards 1p; only player 0 sits after them.
        let tile = table.players()[3].sorted_hand()[0];
        table.discard(3, &tile).unwrap();
        let err = table.chi(1, 3, tile, [19, 20]).unwrap_err();
        assert!(matches!(err, EngineError::IllegalCall { kind: MeldKind::Chi, .. }));
    }

    #[test]
    fn ankan_draws_replacement_and_reveals_dora() {
        let mut table = ordered_table();
        table.deal_starting_hand();
        // Host holds ids 0..13: four copies of 1m, 2m and 3m.
        let replacement = table.ankan(0, 0).unwrap();
        assert_eq!(replacement.id(), 132);
        assert_eq!(table.holder(132), Some(0));
        assert_eq!(table.open_dora_indicators().len(), 2);
        assert_eq!(table.wall().remaining(), 122 - 52 - 1);
        assert!(table.players()[0].is_menzen());
    }

    #[test]
    fn fifth_kong_is_an_illegal_call() {
        let mut table = ordered_table();
        table.deal_starting_hand();
        for code in 0..3 {
            table.ankan(0, code).unwrap();
        }
        // Player 1 holds all four 5m and 6m.
        let code = table.players()[1].ankan_codes()[0];
        table.ankan(1, code).unwrap();
        let next = table.players()[1].ankan_codes()[0];
        assert!(matches!(
            table.ankan(1, next),
            Err(EngineError::IllegalCall {
                kind: MeldKind::ClosedKong,
                ..
            })
        ));
        assert_eq!(table.open_dora_indicators().len(), 5);
        assert_eq!(table.players()[1].melds().len(), 1);
    }

    #[test]
    fn ranking_breaks_ties_by_seat() {
        let mut table = ordered_table();
        table.players[3].award_point(1000);
        table.players[1].award_point(-1000);
        assert_eq!(table.ranked_players(), [3, 0, 2, 1]);
        table.assign_ranks();
        assert_eq!(table.players()[3].rank(), Some(1));
        assert_eq!(table.players()[1].rank(), Some(4));
    }

    #[test]
    fn score_request_describes_the_win() {
        let mut table = ordered_table();
        table.deal_starting_hand();
        let drawn = table.draw(0).unwrap();
        let request = table.score_request(0, drawn, None).unwrap();
        assert!(request.is_tsumo);
        assert!(request.is_host);
        assert_eq!(request.closed_tiles.len(), 13);
        assert_eq!(request.winning_tile, scorer_notation(&drawn));
        assert_eq!(request.dora_indicators.len(), 1);
        assert!(request.ura_dora_indicators.is_empty());
        assert_eq!(request.seat_wind, Wind::East);
    }

    #[test]
    fn with_wall_rejects_mismatched_red_flags() {
        let wall = TileWall::from_tiles(TileCatalog::new(false).all().to_vec()).unwrap();
        assert!(Table::with_wall(TableConfig::default(), wall).is_err());
    }

    #[test]
    fn seeded_tables_agree() {
        let a = Table::new(TableConfig::default(), Some(9)).unwrap();
        let b = Table::new(TableConfig::default(), Some(9)).unwrap();
        assert_eq!(a.seat_order(), b.seat_order());
        assert_eq!(a.wall().digest(), b.wall().digest());
    }

    #[test]
    fn hand_status_is_recorded_per_player() {
        let ev = crate::testing::shared_evaluator();
        let mut table = ordered_table();
        table.deal_starting_hand();
        // Four runs of 1-2-3m plus a lone 4m.
        let status = table.record_hand_status(0, &ev).unwrap();
        assert_eq!(status.shanten, 0);
        assert!(status.minimum_outs > 0);
        assert_eq!(table.players()[0].shanten_history(), &[0]);
        assert!(table.players()[1].shanten_history().is_empty());
        assert!(table.record_hand_status(9, &ev).is_err());
    }
}
