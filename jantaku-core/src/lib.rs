//! Jantaku simulation layer
//!
//! Drives the `jantaku-engine` table through complete matches: session
//! seeding, the game loop with pluggable action selectors, feature encoding
//! and reward shaping for an external learning agent, and a rayon batch
//! simulator behind the `jantaku` CLI.

pub mod config;
pub mod encoder;
pub mod game_loop;
pub mod reward;
pub mod seeding;
pub mod simulator;
