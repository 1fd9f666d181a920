//! `propedge backtest` - replay a historical dataset and grade the signals.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::output::{self, OutputMode};
use crate::backtest::{render_report, BacktestHarness};
use crate::config::{AppConfig, SignalWeights};
use crate::domain::StatType;
use crate::edge::EdgeCalculator;
use crate::providers::{CachedProvider, FixtureDataset};

#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    /// Fixture dataset (JSON)
    #[arg(long)]
    pub data: PathBuf,
    /// First game date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last game date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Restrict to these stat types (repeatable)
    #[arg(long = "stat")]
    pub stats: Vec<StatType>,
    /// Print the grading report as JSON
    #[arg(long)]
    pub json: bool,
    /// Write every graded prop to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Write the weights annotated with this run's predictive values
    /// (a JSON config overlay, e.g. config/graded.json)
    #[arg(long)]
    pub record_weights: Option<PathBuf>,
}

impl BacktestArgs {
    pub async fn run(&self, config: &AppConfig) -> Result<()> {
        let dataset = FixtureDataset::from_path(&self.data)
            .with_context(|| format!("loading {}", self.data.display()))?;

        let mut props = dataset.historical_props(self.start, self.end);
        if !self.stats.is_empty() {
            props.retain(|p| self.stats.contains(&p.stat_type));
        }
        if props.is_empty() {
            output::print_warn("No props in range");
        }

        let provider = Arc::new(CachedProvider::new(Arc::new(dataset)));
        let calculator = Arc::new(EdgeCalculator::new(config)?);
        let harness = BacktestHarness::new(
            calculator,
            provider.clone(),
            provider.clone(),
            provider.clone(),
            config.backtest.clone(),
        );

        let run = harness.run(props).await;
        let cache = provider.stats();
        info!(hits = cache.hits, misses = cache.misses, "Provider cache");

        if let Some(path) = &self.output {
            let json = serde_json::to_string_pretty(&run)?;
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {} props to {}", run.props.len(), path.display());
        }

        if let Some(path) = &self.record_weights {
            let weights = config.weights.recorded(
                &run.report.predictive_values(),
                run.finished_at.date_naive(),
                run.report.settled as u64,
            );
            write_weights(path, &weights)?;
            info!(
                "Recorded predictive values for {} signals to {}",
                run.report.predictive_values().len(),
                path.display()
            );
        }

        match OutputMode::from_json_flag(self.json) {
            OutputMode::Json => output::print_json(&run.report),
            OutputMode::Table => {
                println!("Run {} (weights {})", run.run_id, run.weights_version);
                println!("{}", render_report(&run.report));
                Ok(())
            }
        }
    }
}

/// Write `weights` as a `{"weights": ...}` overlay the config loader accepts
fn write_weights(path: &Path, weights: &SignalWeights) -> Result<()> {
    let overlay = serde_json::json!({ "weights": weights });
    let json = serde_json::to_string_pretty(&overlay)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
