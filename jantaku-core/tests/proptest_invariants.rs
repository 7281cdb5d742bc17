//! Property-based invariants of the match loop.
//!
//! Random seeds drive whole matches with selectors that lean towards calls
//! and wins. Every offered action must be accepted by the table, so a
//! match that finishes with `Ok` has only ever seen executable masks.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use jantaku_core::encoder::FEATURE_SIZE;
use jantaku_core::game_loop::{ActionSelector, GameRunner, RandomSelector};
use jantaku_engine::action::{ActionKind, ActionMask};
use jantaku_engine::testing::shared_evaluator;
use jantaku_engine::{GameMode, TableConfig};

const STEP_CAP: u32 = 20_000;

fn east_only() -> TableConfig {
    TableConfig {
        game_mode: GameMode::EastOnly,
        ..TableConfig::default()
    }
}

/// Takes a call, kong, riichi or win whenever one is offered, otherwise a
/// random legal action. Checks what it is handed on every query.
struct Eager {
    rng: ChaCha8Rng,
    queries: u32,
}

impl Eager {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            queries: 0,
        }
    }
}

impl ActionSelector for Eager {
    fn select_action(&mut self, _seat: u8, features: &[f32], mask: &ActionMask) -> ActionKind {
        assert_eq!(features.len(), FEATURE_SIZE);
        assert!(features.iter().all(|f| f.is_finite()));
        assert!(!mask.is_empty());
        self.queries += 1;

        let legal = mask.legal_actions();
        let eager: Vec<ActionKind> = legal.iter().copied().filter(|a| a.is_call_or_win()).collect();
        if !eager.is_empty() && self.rng.random_bool(0.8) {
            return eager[self.rng.random_range(0..eager.len())];
        }
        legal[self.rng.random_range(0..legal.len())]
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn masks_only_offer_accepted_actions(seed in any::<u64>()) {
        let mut runner = GameRunner::new(east_only(), Some(seed), shared_evaluator())
            .unwrap()
            .with_max_steps(STEP_CAP);
        let mut selector = Eager::new(seed);
        while runner.step_once(&mut selector).unwrap() {
            for player in runner.table().players() {
                let held = player.hand().len();
                // Between deals hands are empty; otherwise 13 or 14 tiles
                // less three per meld.
                prop_assert!(held == 0 || held % 3 != 0, "player {} holds {}", player.id(), held);
                prop_assert!(player.melds().len() <= 4);
            }
        }
        prop_assert!(runner.is_done());
        prop_assert!(!runner.is_truncated());
        prop_assert!(selector.queries > 0);
        prop_assert_eq!(runner.scores().iter().sum::<i32>(), 100_000);
    }

    #[test]
    fn random_games_finish_cleanly(seed in any::<u64>()) {
        let mut runner = GameRunner::new(east_only(), Some(seed), shared_evaluator())
            .unwrap()
            .with_max_steps(STEP_CAP);
        let mut selector = RandomSelector::new(Some(seed));
        prop_assert!(runner.run_to_completion(&mut selector).is_ok());
        prop_assert!(!runner.is_truncated());
        prop_assert!(runner.rounds_played() >= 4);
        prop_assert_eq!(runner.rounds().len() as u32, runner.rounds_played());

        let mut ranks = runner.ranks();
        ranks.sort_unstable();
        prop_assert_eq!(ranks, [1, 2, 3, 4]);
        for record in runner.rounds() {
            prop_assert_eq!(record.scores.iter().sum::<i32>(), 100_000);
            prop_assert_eq!(record.wall_digest.len(), 64);
        }
    }
}
