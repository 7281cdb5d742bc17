//! Reward shaping for the external agent.

use jantaku_engine::state::player::Player;

use crate::config::RewardConfig;

#[derive(Debug, Clone, Default)]
pub struct RewardCalculator {
    config: RewardConfig,
}

impl RewardCalculator {
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Rank reward plus the normalized score. Unranked players get no rank
    /// component.
    pub fn round_over_reward(&self, player: &Player) -> f64 {
        let rank_reward = player
            .rank()
            .and_then(|rank| self.config.rank_rewards.get(rank.checked_sub(1)? as usize))
            .copied()
            .unwrap_or(0.0);
        rank_reward + player.score() as f64 / self.config.score_base
    }

    /// Compares the last two recorded hand statuses. Zero until two exist.
    pub fn round_continue_reward(&self, player: &Player) -> f64 {
        let shanten = player.shanten_history();
        let outs = player.outs_history();
        let (Some(&[old_shanten, shanten]), Some(&[old_outs, outs])) =
            (last_two(shanten), last_two(outs))
        else {
            return 0.0;
        };
        step_reward(old_shanten, shanten, old_outs, outs)
    }

    /// Terminal reward of a tenpai-speed episode.
    pub fn tenpai_speed_reward(&self, reached: bool) -> f64 {
        if reached {
            self.config.tenpai_reward
        } else {
            self.config.exhaustion_penalty
        }
    }
}

fn last_two<T>(history: &[T]) -> Option<&[T; 2]> {
    history.len().checked_sub(2).and_then(|start| history[start..].try_into().ok())
}

/// Progress reward between two consecutive hand statuses.
pub fn step_reward(old_shanten: i8, shanten: i8, old_outs: usize, outs: usize) -> f64 {
    if shanten < old_shanten || shanten == 0 {
        1.0
    } else if shanten == old_shanten && outs > old_outs {
        1.0
    } else if shanten == old_shanten && outs == old_outs {
        0.0
    } else {
        -1.0
    }
}
