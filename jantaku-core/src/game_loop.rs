//! Match driver.
//!
//! [`GameRunner`] owns one [`Table`] and walks it through whole rounds:
//! deal, then per turn draw, self-turn decision, discard and the response
//! round of the other three players. Decisions come from an
//! [`ActionSelector`], which sees the encoded features and the legality mask
//! and never touches the table directly.
//!
//! In [`RunMode::TenpaiSpeed`] the runner plays a single discard-only
//! episode instead: no calls, no wins, and the episode ends as soon as the
//! drawing player holds a tenpai hand or the wall runs dry.

use std::sync::Arc;

use jantaku_engine::action::{ActionKind, ActionMask, Phase};
use jantaku_engine::score::ScoringOracle;
use jantaku_engine::state::game_mode::NUM_PLAYERS;
use jantaku_engine::state::legal_actions::TableLegalActions;
use jantaku_engine::types::MeldKind;
use jantaku_engine::{EngineError, EngineResult, HandEvaluator, Table, TableConfig, Tile};
use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::encoder::StateEncoder;
use crate::reward::RewardCalculator;
use crate::seeding::SessionRng;

/// Decisions a runner will take before giving up on a match.
pub const MAX_STEPS: u32 = 50_000;

/// Action selection policy: random agents, scripted tests, or a bridge to
/// an external learner.
pub trait ActionSelector {
    /// Picks one action that `mask` marks legal for `seat`.
    fn select_action(&mut self, seat: u8, features: &[f32], mask: &ActionMask) -> ActionKind;

    /// Reward earned by `seat`, after each of its discards and at every
    /// round end.
    fn observe_reward(&mut self, _seat: u8, _reward: f64, _round_over: bool) {}
}

/// Always picks the lowest legal index.
pub struct FirstLegalSelector;

impl ActionSelector for FirstLegalSelector {
    fn select_action(&mut self, _seat: u8, _features: &[f32], mask: &ActionMask) -> ActionKind {
        mask.legal_actions().first().copied().unwrap_or(ActionKind::Pass)
    }
}

/// Uniform choice among legal actions.
pub struct RandomSelector {
    rng: ChaCha8Rng,
}

impl RandomSelector {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self { rng }
    }
}

impl ActionSelector for RandomSelector {
    fn select_action(&mut self, _seat: u8, _features: &[f32], mask: &ActionMask) -> ActionKind {
        let legal = mask.legal_actions();
        if legal.is_empty() {
            return ActionKind::Pass;
        }
        legal[self.rng.random_range(0..legal.len())]
    }
}

/// What a runner plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum RunMode {
    /// Full matches with calls, wins and settlement.
    #[default]
    Match,
    /// One draw-and-discard episode that ends at the first tenpai.
    TenpaiSpeed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RoundEnd {
    Tsumo { winner: u8 },
    Ron { winner: u8, loser: u8 },
    /// Wall ran out; lists the players who were tenpai.
    ExhaustiveDraw { tenpai: Vec<u8> },
    /// A tenpai-speed episode ended with `player` holding a tenpai hand.
    TenpaiReached { player: u8 },
}

impl RoundEnd {
    pub fn winner(&self) -> Option<u8> {
        match self {
            RoundEnd::Tsumo { winner } | RoundEnd::Ron { winner, .. } => Some(*winner),
            RoundEnd::ExhaustiveDraw { .. } | RoundEnd::TenpaiReached { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub round: String,
    pub honba: u8,
    pub host: u8,
    pub end: RoundEnd,
    /// Scores after settlement.
    pub scores: [i32; NUM_PLAYERS],
    pub wall_digest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Deal,
    Draw(u8),
    /// The player holds a drawn or replacement tile.
    Turn(u8),
    /// The player called pon or chi and must discard.
    AfterCall(u8),
    Respond { discarder: u8, tile: Tile },
    Finished,
}

/// Runs one match to completion.
pub struct GameRunner {
    table: Table,
    evaluator: HandEvaluator,
    encoder: StateEncoder,
    rewards: RewardCalculator,
    scorer: Option<Arc<dyn ScoringOracle>>,
    mode: RunMode,
    stage: Stage,
    seed: Option<u64>,
    max_steps: u32,
    total_actions: u32,
    truncated: bool,
    rounds: Vec<RoundRecord>,
    reward_totals: [f64; NUM_PLAYERS],
}

impl GameRunner {
    pub fn new(config: TableConfig, seed: Option<u64>, evaluator: HandEvaluator) -> EngineResult<Self> {
        let table = Table::new(config, seed)?;
        let mut runner = Self::with_table(table, evaluator);
        runner.seed = seed;
        Ok(runner)
    }

    /// Takes the next game seed from `session`.
    pub fn new_with_session(
        session: &mut SessionRng,
        config: TableConfig,
        evaluator: HandEvaluator,
    ) -> EngineResult<Self> {
        Self::new(config, Some(session.next_game_seed()), evaluator)
    }

    /// Drives an undealt table as it is.
    pub fn with_table(table: Table, evaluator: HandEvaluator) -> Self {
        Self {
            table,
            evaluator,
            encoder: StateEncoder::new(),
            rewards: RewardCalculator::default(),
            scorer: None,
            mode: RunMode::Match,
            stage: Stage::Deal,
            seed: None,
            max_steps: MAX_STEPS,
            total_actions: 0,
            truncated: false,
            rounds: Vec::new(),
            reward_totals: [0.0; NUM_PLAYERS],
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn ScoringOracle>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_rewards(mut self, rewards: RewardCalculator) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Finished
    }

    /// True when the step cap ended the match early.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn total_actions(&self) -> u32 {
        self.total_actions
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn scores(&self) -> [i32; NUM_PLAYERS] {
        std::array::from_fn(|i| self.table.players()[i].score())
    }

    /// Final placings, 1-based. Zero for a player never ranked.
    pub fn ranks(&self) -> [u8; NUM_PLAYERS] {
        std::array::from_fn(|i| self.table.players()[i].rank().unwrap_or(0))
    }

    pub fn reward_totals(&self) -> [f64; NUM_PLAYERS] {
        self.reward_totals
    }
}

impl GameRunner {
    /// Advances the match by one stage. Returns false once it is over.
    pub fn step_once(&mut self, selector: &mut dyn ActionSelector) -> EngineResult<bool> {
        if self.is_done() {
            return Ok(false);
        }
        if self.total_actions >= self.max_steps {
            warn!("match stopped after {} actions", self.total_actions);
            self.truncated = true;
            self.stage = Stage::Finished;
            return Ok(false);
        }

        match self.stage {
            Stage::Deal => self.deal()?,
            Stage::Draw(player) => self.draw(player, selector)?,
            Stage::Turn(player) if self.mode == RunMode::TenpaiSpeed => self.plain_discard(player, selector)?,
            Stage::Turn(player) => self.self_turn(player, selector)?,
            Stage::AfterCall(player) => self.plain_discard(player, selector)?,
            Stage::Respond { discarder, tile } => self.respond(discarder, tile, selector)?,
            Stage::Finished => {}
        }
        Ok(!self.is_done())
    }

    pub fn run_to_completion(&mut self, selector: &mut dyn ActionSelector) -> EngineResult<()> {
        while self.step_once(selector)? {}
        Ok(())
    }

    fn deal(&mut self) -> EngineResult<()> {
        self.table.deal_starting_hand();
        for player in self.table.wind_order() {
            self.table.record_hand_status(player, &self.evaluator)?;
        }
        self.stage = Stage::Draw(self.table.host());
        Ok(())
    }

    fn draw(&mut self, player: u8, selector: &mut dyn ActionSelector) -> EngineResult<()> {
        let Some(tile) = self.table.draw(player) else {
            let tenpai = self.tenpai_players();
            let end = RoundEnd::ExhaustiveDraw { tenpai };
            return match self.mode {
                RunMode::Match => self.end_round(end, selector),
                RunMode::TenpaiSpeed => self.end_episode(player, end, selector),
            };
        };
        trace!("player {} draws {}", player, tile);
        if self.mode == RunMode::TenpaiSpeed {
            let hand = self.table.player(player)?.hand_vector();
            if self.evaluator.shanten_minimum(&hand) <= 0 {
                self.table.record_hand_status(player, &self.evaluator)?;
                return self.end_episode(player, RoundEnd::TenpaiReached { player }, selector);
            }
        }
        self.stage = Stage::Turn(player);
        Ok(())
    }

    /// Discard with every other self-turn action masked out.
    fn plain_discard(&mut self, player: u8, selector: &mut dyn ActionSelector) -> EngineResult<()> {
        let mask = self
            .table
            .legal_actions(player, &Phase::SelfTurn, &self.evaluator)
            .discards_only();
        let action = self.decide(player, &mask, selector)?;
        self.discard(player, action, false, selector)
    }

    fn self_turn(&mut self, player: u8, selector: &mut dyn ActionSelector) -> EngineResult<()> {
        let mask = self.table.legal_actions(player, &Phase::SelfTurn, &self.evaluator);
        let mut action = self.decide(player, &mask, selector)?;
        if action == ActionKind::Pass {
            action = self.decide(player, &mask.discards_only(), selector)?;
        }

        match action {
            ActionKind::Discard(_) => self.discard(player, action, false, selector),
            ActionKind::Tsumo => {
                let tile = self.table.player(player)?.drawn_tile().ok_or_else(|| {
                    EngineError::IllegalAction {
                        message: format!("player {} has no drawn tile to win on", player),
                    }
                })?;
                self.settle_win(player, tile, None, selector)
            }
            ActionKind::Ankan => {
                let code = first_code(self.table.player(player)?.ankan_codes(), ActionKind::Ankan)?;
                let replacement = self.table.ankan(player, code)?;
                trace!("player {} replaces with {}", player, replacement);
                Ok(())
            }
            ActionKind::Kakan => {
                let code = first_code(self.table.player(player)?.kakan_codes(), ActionKind::Kakan)?;
                let replacement = self.table.kakan(player, code)?;
                trace!("player {} replaces with {}", player, replacement);
                Ok(())
            }
            ActionKind::Riichi => {
                let mask = self.table.riichi_discards(player, &self.evaluator);
                let discard = self.decide(player, &mask, selector)?;
                self.discard(player, discard, true, selector)
            }
            other => Err(EngineError::IllegalAction {
                message: format!("{:?} is not a self-turn action", other),
            }),
        }
    }

    /// Discards by sorted-hand slot, records the new hand status and hands
    /// the step reward to the selector.
    fn discard(
        &mut self,
        player: u8,
        action: ActionKind,
        riichi: bool,
        selector: &mut dyn ActionSelector,
    ) -> EngineResult<()> {
        let ActionKind::Discard(index) = action else {
            return Err(EngineError::IllegalAction {
                message: format!("expected a discard from player {}, got {:?}", player, action),
            });
        };
        let tile = if riichi {
            let tile = self
                .table
                .player(player)?
                .sorted_hand()
                .get(index as usize)
                .copied()
                .ok_or_else(|| EngineError::IllegalDiscard {
                    tile: format!("index {}", index),
                })?;
            self.table.declare_riichi(player, &tile)?;
            tile
        } else {
            self.table.discard_index(player, index as usize)?
        };

        self.table.record_hand_status(player, &self.evaluator)?;
        let reward = self.rewards.round_continue_reward(self.table.player(player)?);
        self.credit(player, reward, false, selector);
        self.stage = match self.mode {
            RunMode::Match => Stage::Respond {
                discarder: player,
                tile,
            },
            RunMode::TenpaiSpeed => Stage::Draw(self.table.next_seat(player)?),
        };
        Ok(())
    }

    /// Asks every other player in seat order, then resolves the claims:
    /// ron first, then pon or open kong, then chi.
    fn respond(&mut self, discarder: u8, tile: Tile, selector: &mut dyn ActionSelector) -> EngineResult<()> {
        let phase = Phase::Response { discarder, tile };
        let mut claims: Vec<(u8, ActionKind)> = Vec::new();
        let mut seat = discarder;
        for _ in 1..NUM_PLAYERS {
            seat = self.table.next_seat(seat)?;
            let mask = self.table.legal_actions(seat, &phase, &self.evaluator);
            if mask.is_empty() {
                continue;
            }
            let action = self.decide(seat, &mask, selector)?;
            if action != ActionKind::Pass {
                claims.push((seat, action));
            }
        }

        let claim = |kinds: &[ActionKind]| claims.iter().find(|(_, a)| kinds.contains(a)).copied();

        if let Some((winner, _)) = claim(&[ActionKind::Ron]) {
            return self.settle_win(winner, tile, Some(discarder), selector);
        }
        if let Some((caller, action)) = claim(&[ActionKind::Pon, ActionKind::Daiminkan]) {
            if action == ActionKind::Pon {
                self.table.pon(caller, discarder, tile)?;
                self.stage = Stage::AfterCall(caller);
            } else {
                self.table.daiminkan(caller, discarder, tile)?;
                self.stage = Stage::Turn(caller);
            }
            return Ok(());
        }
        if let Some((caller, _)) = claim(&[ActionKind::Chi]) {
            let pair = self
                .table
                .player(caller)?
                .chi_options(&tile)
                .first()
                .copied()
                .ok_or_else(|| EngineError::IllegalCall {
                    kind: MeldKind::Chi,
                    message: format!("player {} has no run with {}", caller, tile),
                })?;
            self.table.chi(caller, discarder, tile, pair)?;
            self.stage = Stage::AfterCall(caller);
            return Ok(());
        }

        self.stage = Stage::Draw(self.table.next_seat(discarder)?);
        Ok(())
    }

    /// Values the win through the oracle when one is configured. Without
    /// one the win is recorded and scores stay as they are.
    fn settle_win(
        &mut self,
        winner: u8,
        tile: Tile,
        loser: Option<u8>,
        selector: &mut dyn ActionSelector,
    ) -> EngineResult<()> {
        if let Some(scorer) = &self.scorer {
            let request = self.table.score_request(winner, tile, loser)?;
            let response = scorer.score(&request)?;
            response.validate()?;
            debug!(
                "player {} wins on {}: {} for {} points",
                winner, tile, response.score_type, response.final_points
            );
            self.table.apply_score(&response);
        }
        let end = match loser {
            Some(loser) => RoundEnd::Ron { winner, loser },
            None => RoundEnd::Tsumo { winner },
        };
        self.end_round(end, selector)
    }

    fn end_round(&mut self, end: RoundEnd, selector: &mut dyn ActionSelector) -> EngineResult<()> {
        let host = self.table.host();
        let dealer_continues = match &end {
            RoundEnd::Tsumo { winner } | RoundEnd::Ron { winner, .. } => *winner == host,
            RoundEnd::ExhaustiveDraw { tenpai } => tenpai.contains(&host),
            RoundEnd::TenpaiReached { .. } => false,
        };

        self.table.assign_ranks();
        for player in self.table.players() {
            let reward = self.rewards.round_over_reward(player);
            self.reward_totals[player.id() as usize] += reward;
            selector.observe_reward(player.id(), reward, true);
        }

        self.record_round(end);

        if dealer_continues {
            self.table.restart();
        } else {
            self.table.proceed_to_next_round();
        }
        self.stage = if self.table.is_game_over() {
            Stage::Finished
        } else {
            Stage::Deal
        };
        Ok(())
    }

    /// Closes a tenpai-speed episode: only the drawing player is paid, and
    /// the table is left as it stands.
    fn end_episode(&mut self, player: u8, end: RoundEnd, selector: &mut dyn ActionSelector) -> EngineResult<()> {
        let reached = matches!(end, RoundEnd::TenpaiReached { .. });
        let reward = self.rewards.tenpai_speed_reward(reached);
        self.credit(player, reward, true, selector);
        self.table.assign_ranks();
        self.record_round(end);
        self.stage = Stage::Finished;
        Ok(())
    }

    fn record_round(&mut self, end: RoundEnd) {
        let record = RoundRecord {
            round: self.table.round_name(),
            honba: self.table.honba_count(),
            host: self.table.host(),
            end,
            scores: self.scores(),
            wall_digest: self.table.wall().digest().to_string(),
        };
        debug!(
            "{} honba {}: {:?}, scores {:?}",
            record.round, record.honba, record.end, record.scores
        );
        self.rounds.push(record);
    }

    fn tenpai_players(&self) -> Vec<u8> {
        self.table
            .players()
            .iter()
            .filter(|p| self.evaluator.is_tenpai(&p.hand_vector()))
            .map(|p| p.id())
            .collect()
    }

    /// Encodes the state for `seat`, asks the selector, and checks the
    /// answer against `mask`.
    fn decide(
        &mut self,
        seat: u8,
        mask: &ActionMask,
        selector: &mut dyn ActionSelector,
    ) -> EngineResult<ActionKind> {
        if mask.is_empty() {
            return Err(EngineError::IllegalAction {
                message: format!("player {} has no legal action", seat),
            });
        }
        let features = self.encoder.encode(&self.table, seat, &self.evaluator);
        let action = selector.select_action(seat, features, mask);
        let in_range = ActionKind::from_index(action.index()) == Some(action);
        if !in_range || !mask.is_legal(action) {
            return Err(EngineError::IllegalAction {
                message: format!("player {} chose {:?}, which is not legal", seat, action),
            });
        }
        self.total_actions += 1;
        trace!("player {} chooses {:?}", seat, action);
        Ok(action)
    }

    fn credit(&mut self, seat: u8, reward: f64, round_over: bool, selector: &mut dyn ActionSelector) {
        self.reward_totals[seat as usize % NUM_PLAYERS] += reward;
        selector.observe_reward(seat, reward, round_over);
    }
}

fn first_code(codes: Vec<u8>, action: ActionKind) -> EngineResult<u8> {
    codes.first().copied().ok_or_else(|| EngineError::IllegalAction {
        message: format!("{:?} offered without a candidate", action),
    })
}
