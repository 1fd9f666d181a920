//! PropEdge CLI
//!
//! Commands:
//! - `propedge score` - Score one prop context against a quote
//! - `propedge backtest` - Replay a historical dataset and grade signals
//! - `propedge odds` - Convert a price to probability and back

pub mod backtest;
pub mod odds;
pub mod output;
pub mod score;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Player-prop edge engine
#[derive(Parser, Debug)]
#[command(name = "propedge")]
#[command(author, version, about = "Player-prop edge detection and signal grading")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding default.toml and per-environment overrides
    #[arg(short, long, global = true, default_value = "config", env = "PROPEDGE_CONFIG_DIR")]
    pub config_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a prop context
    Score(score::ScoreArgs),

    /// Backtest a historical dataset
    Backtest(backtest::BacktestArgs),

    /// Price / probability conversion
    Odds(odds::OddsArgs),
}
