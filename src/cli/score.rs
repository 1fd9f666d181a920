//! `propedge score` - score one prop context against a quote.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tabled::Tabled;

use super::output::{self, FieldRow, OutputMode};
use crate::config::AppConfig;
use crate::domain::{PriceQuote, PropContext};
use crate::edge::{EdgeCalculator, EdgeResult};

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// PropContext JSON file
    #[arg(long)]
    pub context: PathBuf,
    /// Over price in the market's configured convention
    #[arg(long, allow_negative_numbers = true)]
    pub over: Option<f64>,
    /// Under price in the market's configured convention
    #[arg(long, allow_negative_numbers = true)]
    pub under: Option<f64>,
    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Tabled)]
struct SignalRow {
    signal: String,
    strength: String,
    confidence: String,
    weight: String,
    evidence: String,
}

impl ScoreArgs {
    pub fn run(&self, config: &AppConfig) -> Result<()> {
        let raw = std::fs::read_to_string(&self.context)
            .with_context(|| format!("reading {}", self.context.display()))?;
        let ctx: PropContext = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.context.display()))?;

        let calculator = EdgeCalculator::new(config)?;
        let quote = PriceQuote::new(self.over, self.under);
        let result = calculator.calculate_edge(&ctx, &quote);

        match OutputMode::from_json_flag(self.json) {
            OutputMode::Json => output::print_json(&result),
            OutputMode::Table => {
                println!("{}", render(&result, &calculator));
                Ok(())
            }
        }
    }
}

fn render(result: &EdgeResult, calculator: &EdgeCalculator) -> String {
    let summary = vec![
        FieldRow::new("prop", format!("{} {} {}", result.player_name, result.stat_type, result.line)),
        FieldRow::new("direction", result.direction),
        FieldRow::new("edge", format!("{:+.1}%", result.edge_pct)),
        FieldRow::new("model", format!("{:.3}", result.model_probability)),
        FieldRow::new("market", format!("{:.3} ({:?})", result.market_probability, result.market_source)),
        FieldRow::new("confidence", format!("{:.2}", result.confidence)),
        FieldRow::new("blend", format!("{:+.3}", result.weighted_signal)),
        FieldRow::new("has edge", result.has_edge(calculator.min_edge_pct())),
        FieldRow::new("weights", calculator.weights_version()),
    ];

    let signals: Vec<SignalRow> = result
        .signals
        .values()
        .map(|s| SignalRow {
            signal: s.signal.as_str().to_string(),
            strength: format!("{:+.2}", s.strength),
            confidence: format!("{:.2}", s.confidence),
            weight: format!("{:.2}", calculator.weight(s.signal)),
            evidence: s.evidence.clone(),
        })
        .collect();

    let mut out = format!("{}\n\n{}\n", output::table(&summary), result.primary_reason);
    for reason in &result.supporting_reasons {
        out.push_str(&format!("  + {}\n", reason));
    }
    for risk in &result.risk_factors {
        out.push_str(&format!("  - {}\n", risk));
    }
    if result.contrarian_applied {
        if let Some(original) = result.original_direction {
            out.push_str(&format!("  (contrarian fade of {})\n", original));
        }
    }
    out.push('\n');
    out.push_str(&output::table(&signals));
    out
}
