//! `jantaku`: table generation, batch self-play and hand evaluation.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use jantaku_core::config::SimConfig;
use jantaku_core::game_loop::RunMode;
use jantaku_core::simulator::{load_evaluator, BatchConfig, BatchSimulator, BatchSummary, SelectorKind};
use jantaku_engine::parser::{format_tiles, parse_tiles};
use jantaku_engine::types::HandVector;
use jantaku_engine::ShantenTable;
use log::info;
use serde_json::json;

#[derive(Parser)]
#[command(name = "jantaku", about = "Four-player mahjong simulation engine", version)]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the shanten table artifact (.json or .json.gz)
    GenerateTable {
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
    /// Play a batch of matches and print a JSON summary
    Simulate {
        /// JSON config file; defaults apply when omitted
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 100)]
        games: usize,
        /// Worker threads; all cores when omitted
        #[arg(long)]
        threads: Option<usize>,
        /// Session seed, overriding the config
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = SelectorKind::Random)]
        policy: SelectorKind,
        /// Run mode, overriding the config
        #[arg(long, value_enum)]
        mode: Option<RunMode>,
    },
    /// Print shanten and outs for a hand such as 123m456p789s1122z
    Evaluate {
        hand: String,
        /// Shanten table artifact, generated and cached when missing
        #[arg(long, value_name = "PATH")]
        table: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match args.command {
        Command::GenerateTable { out } => {
            let start = Instant::now();
            let table = ShantenTable::generate();
            table
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            info!("wrote {} in {:.2?}", out.display(), start.elapsed());
        }
        Command::Simulate {
            config,
            games,
            threads,
            seed,
            policy,
            mode,
        } => {
            let sim_config = match config {
                Some(path) => SimConfig::load(&path)?,
                None => SimConfig::default(),
            };
            let simulator = BatchSimulator::from_config(&sim_config, threads)?;
            let batch = BatchConfig {
                num_games: games,
                seed: seed.or(sim_config.seed),
                table: sim_config.table.clone(),
                selector: policy,
                mode: mode.unwrap_or(sim_config.mode),
                ..Default::default()
            };
            let start = Instant::now();
            let results = simulator.run_batch(&batch)?;
            let elapsed = start.elapsed();
            let summary = BatchSummary::from_results(&results);
            let report = json!({
                "seed": batch.seed,
                "mode": batch.mode,
                "threads": simulator.num_threads(),
                "elapsed_secs": elapsed.as_secs_f64(),
                "games_per_sec": games as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Evaluate { hand, table } => {
            let sim_config = SimConfig {
                shanten_table: table,
                ..SimConfig::default()
            };
            let evaluator = load_evaluator(&sim_config)?;
            let tiles = parse_tiles(&hand, evaluator.catalog())
                .with_context(|| format!("parsing hand {:?}", hand))?;
            let vector = HandVector::from_tiles(&tiles);
            let breakdown = evaluator.shanten(&vector);
            let outs = evaluator.outs(&tiles);
            let report = json!({
                "hand": format_tiles(&tiles),
                "shanten": breakdown,
                "minimum": breakdown.minimum(),
                "best": breakdown.best(),
                "outs": {
                    "normal": format_tiles(&outs.normal),
                    "chiitoitsu": format_tiles(&outs.chiitoitsu),
                    "kokushi": format_tiles(&outs.kokushi),
                },
                "minimum_outs": evaluator.count_minimum_outs(&tiles),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
