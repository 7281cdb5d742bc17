//! Batch game simulation with rayon parallelism.
//!
//! Runs N complete matches on a dedicated rayon ThreadPool. Every game owns
//! its table; the shanten table is shared through the cloned evaluator.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use jantaku_engine::score::ScoringOracle;
use jantaku_engine::state::game_mode::NUM_PLAYERS;
use jantaku_engine::{HandEvaluator, ShantenTable, TableConfig};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::game_loop::{ActionSelector, FirstLegalSelector, GameRunner, RandomSelector, RoundEnd, RunMode, MAX_STEPS};
use crate::reward::RewardCalculator;
use crate::seeding::SessionRng;

/// Offsets the selector stream from the table stream of the same game.
const SELECTOR_STREAM: u64 = 0x5E1E_C70B;

/// Built-in policies for simulated players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum SelectorKind {
    /// Lowest legal action index.
    First,
    /// Uniformly random legal action.
    #[default]
    Random,
}

impl SelectorKind {
    fn build(self, seed: Option<u64>) -> Box<dyn ActionSelector> {
        match self {
            SelectorKind::First => Box::new(FirstLegalSelector),
            SelectorKind::Random => Box::new(RandomSelector::new(seed.map(|s| s ^ SELECTOR_STREAM))),
        }
    }
}

/// Configuration for a batch simulation run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub num_games: usize,
    /// Session seed. Game `i` plays with the `i`-th derived seed; `None`
    /// plays every game from entropy.
    pub seed: Option<u64>,
    pub table: TableConfig,
    pub selector: SelectorKind,
    pub max_steps: u32,
    pub mode: RunMode,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_games: 100,
            seed: None,
            table: TableConfig::default(),
            selector: SelectorKind::default(),
            max_steps: MAX_STEPS,
            mode: RunMode::default(),
        }
    }
}

/// Result from a single completed game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    pub seed: Option<u64>,
    pub scores: [i32; NUM_PLAYERS],
    pub ranks: [u8; NUM_PLAYERS],
    pub rounds_played: u32,
    pub total_actions: u32,
    pub wins: u32,
    pub exhaustive_draws: u32,
    /// Tenpai-speed episodes that ended at tenpai.
    pub tenpai_reached: u32,
    pub truncated: bool,
    pub reward_totals: [f64; NUM_PLAYERS],
}

impl GameResult {
    pub fn from_runner(runner: &GameRunner) -> Self {
        let count = |pred: fn(&RoundEnd) -> bool| runner.rounds().iter().filter(|r| pred(&r.end)).count() as u32;
        Self {
            seed: runner.seed(),
            scores: runner.scores(),
            ranks: runner.ranks(),
            rounds_played: runner.rounds_played(),
            total_actions: runner.total_actions(),
            wins: count(|end| end.winner().is_some()),
            exhaustive_draws: count(|end| matches!(end, RoundEnd::ExhaustiveDraw { .. })),
            tenpai_reached: count(|end| matches!(end, RoundEnd::TenpaiReached { .. })),
            truncated: runner.is_truncated(),
            reward_totals: runner.reward_totals(),
        }
    }
}

/// Aggregate over a batch, printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub games: usize,
    pub rounds: u64,
    pub total_actions: u64,
    pub wins: u64,
    pub exhaustive_draws: u64,
    pub tenpai_reached: u64,
    pub truncated: usize,
    pub mean_scores: [f64; NUM_PLAYERS],
    pub mean_rewards: [f64; NUM_PLAYERS],
}

impl BatchSummary {
    pub fn from_results(results: &[GameResult]) -> Self {
        let games = results.len();
        let mut mean_scores = [0.0; NUM_PLAYERS];
        let mut mean_rewards = [0.0; NUM_PLAYERS];
        for result in results {
            for seat in 0..NUM_PLAYERS {
                mean_scores[seat] += result.scores[seat] as f64;
                mean_rewards[seat] += result.reward_totals[seat];
            }
        }
        if games > 0 {
            for seat in 0..NUM_PLAYERS {
                mean_scores[seat] /= games as f64;
                mean_rewards[seat] /= games as f64;
            }
        }
        Self {
            games,
            rounds: results.iter().map(|r| r.rounds_played as u64).sum(),
            total_actions: results.iter().map(|r| r.total_actions as u64).sum(),
            wins: results.iter().map(|r| r.wins as u64).sum(),
            exhaustive_draws: results.iter().map(|r| r.exhaustive_draws as u64).sum(),
            tenpai_reached: results.iter().map(|r| r.tenpai_reached as u64).sum(),
            truncated: results.iter().filter(|r| r.truncated).count(),
            mean_scores,
            mean_rewards,
        }
    }
}

/// Loads the configured shanten table artifact, or generates one in memory.
pub fn load_evaluator(config: &SimConfig) -> anyhow::Result<HandEvaluator> {
    let start = Instant::now();
    let table = match &config.shanten_table {
        Some(path) => ShantenTable::load_or_generate(path)
            .with_context(|| format!("preparing shanten table {}", path.display()))?,
        None => ShantenTable::generate(),
    };
    info!("shanten table ready in {:.2?}", start.elapsed());
    Ok(HandEvaluator::new(Arc::new(table)))
}

/// Plays one full game of `config`'s table, selector and mode.
pub fn simulate_single_game(
    config: &BatchConfig,
    seed: Option<u64>,
    evaluator: HandEvaluator,
    rewards: RewardCalculator,
    scorer: Option<Arc<dyn ScoringOracle>>,
) -> anyhow::Result<GameResult> {
    let mut runner = GameRunner::new(config.table.clone(), seed, evaluator)
        .context("building table")?
        .with_rewards(rewards)
        .with_max_steps(config.max_steps)
        .with_mode(config.mode);
    if let Some(scorer) = scorer {
        runner = runner.with_scorer(scorer);
    }
    let mut selector = config.selector.build(seed);
    runner
        .run_to_completion(selector.as_mut())
        .with_context(|| format!("game with seed {:?}", seed))?;
    Ok(GameResult::from_runner(&runner))
}

/// Parallel batch simulator using a dedicated rayon ThreadPool.
pub struct BatchSimulator {
    pool: rayon::ThreadPool,
    evaluator: HandEvaluator,
    rewards: RewardCalculator,
    scorer: Option<Arc<dyn ScoringOracle>>,
}

impl BatchSimulator {
    /// Create a new batch simulator with the given thread count.
    pub fn new(num_threads: Option<usize>, evaluator: HandEvaluator) -> anyhow::Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build().context("building simulator thread pool")?;
        Ok(Self {
            pool,
            evaluator,
            rewards: RewardCalculator::default(),
            scorer: None,
        })
    }

    /// Simulator wired from a loaded config: table artifact, reward
    /// constants and the external scorer.
    pub fn from_config(config: &SimConfig, num_threads: Option<usize>) -> anyhow::Result<Self> {
        let evaluator = load_evaluator(config)?;
        let mut simulator =
            Self::new(num_threads, evaluator)?.with_rewards(RewardCalculator::new(config.reward.clone()));
        if let Some(scorer) = &config.scorer {
            simulator = simulator.with_scorer(Arc::new(scorer.build()));
        }
        Ok(simulator)
    }

    pub fn with_rewards(mut self, rewards: RewardCalculator) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn ScoringOracle>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn evaluator(&self) -> &HandEvaluator {
        &self.evaluator
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run a batch of games in parallel. Results are in game order; the
    /// first failing game fails the batch.
    pub fn run_batch(&self, config: &BatchConfig) -> anyhow::Result<Vec<GameResult>> {
        let session = config.seed.map(SessionRng::from_u64);
        let start = Instant::now();
        let results = self.pool.install(|| {
            (0..config.num_games)
                .into_par_iter()
                .map(|i| {
                    let seed = session.as_ref().map(|s| s.game_seed(i as u64));
                    simulate_single_game(
                        config,
                        seed,
                        self.evaluator.clone(),
                        self.rewards.clone(),
                        self.scorer.clone(),
                    )
                })
                .collect::<anyhow::Result<Vec<_>>>()
        })?;
        info!(
            "simulated {} games on {} threads in {:.2?}",
            results.len(),
            self.num_threads(),
            start.elapsed()
        );
        Ok(results)
    }
}
