//! Simulation configuration loaded from JSON.
//!
//! Every section falls back to its `Default`, and unknown fields are
//! rejected so a misspelled key fails loudly instead of being ignored.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use jantaku_engine::score::CommandScorer;
use jantaku_engine::TableConfig;
use serde::{Deserialize, Serialize};

use crate::game_loop::RunMode;

/// Hyper-parameters handed through to the external learning agent. The
/// simulator itself only range-checks them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub gamma: f64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    /// Steps over which epsilon decays from start to end.
    pub epsilon_decay: u64,
    pub replay_buffer_size: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub target_sync_interval: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 100_000,
            replay_buffer_size: 100_000,
            batch_size: 64,
            learning_rate: 1e-4,
            target_sync_interval: 1_000,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            bail!("agent.gamma must be in (0, 1], got {}", self.gamma);
        }
        for (name, value) in [
            ("epsilon_start", self.epsilon_start),
            ("epsilon_end", self.epsilon_end),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("agent.{} must be in [0, 1], got {}", name, value);
            }
        }
        if !(self.learning_rate > 0.0) {
            bail!("agent.learning_rate must be positive, got {}", self.learning_rate);
        }
        for (name, value) in [
            ("epsilon_decay", self.epsilon_decay),
            ("replay_buffer_size", self.replay_buffer_size as u64),
            ("batch_size", self.batch_size as u64),
            ("target_sync_interval", self.target_sync_interval),
        ] {
            if value == 0 {
                bail!("agent.{} must be greater than zero", name);
            }
        }
        if self.batch_size > self.replay_buffer_size {
            bail!(
                "agent.batch_size {} exceeds replay_buffer_size {}",
                self.batch_size,
                self.replay_buffer_size
            );
        }
        Ok(())
    }
}

/// Reward shaping constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    /// Reward by final placing, first to fourth.
    pub rank_rewards: [f64; 4],
    /// Final scores are divided by this before being added to the reward.
    pub score_base: f64,
    /// Paid when a tenpai-speed episode reaches tenpai.
    pub tenpai_reward: f64,
    /// Paid when a tenpai-speed episode runs out of wall.
    pub exhaustion_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            rank_rewards: [30.0, 10.0, -10.0, -30.0],
            score_base: 10_000.0,
            tenpai_reward: 100.0,
            exhaustion_penalty: -100.0,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.score_base > 0.0) {
            bail!("reward.score_base must be positive, got {}", self.score_base);
        }
        if !self.tenpai_reward.is_finite() || !self.exhaustion_penalty.is_finite() {
            bail!("reward.tenpai_reward and reward.exhaustion_penalty must be finite");
        }
        Ok(())
    }
}

/// External scoring program; see [`CommandScorer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScorerConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ScorerConfig {
    pub fn build(&self) -> CommandScorer {
        CommandScorer::new(&self.program, self.args.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub mode: RunMode,
    pub table: TableConfig,
    pub agent: AgentConfig,
    pub reward: RewardConfig,
    /// Cached shanten table artifact. Generated in memory when absent.
    pub shanten_table: Option<PathBuf>,
    pub seed: Option<u64>,
    pub scorer: Option<ScorerConfig>,
}

impl SimConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("loading config {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: SimConfig = serde_json::from_str(text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.table.validate().context("invalid table section")?;
        self.agent.validate()?;
        self.reward.validate()?;
        if let Some(scorer) = &self.scorer {
            if scorer.program.as_os_str().is_empty() {
                bail!("scorer.program must not be empty");
            }
        }
        Ok(())
    }
}
