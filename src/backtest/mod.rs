//! Historical backtest and grading harness.
//!
//! Props are grouped by game date and each date is an independent unit of
//! work: build point-in-time contexts, score, then settle against that
//! date's box scores. Dates run concurrently; results are only appended.

pub mod context;
pub mod grading;
pub mod prop;
pub mod settlement;

pub use context::{apply_history, infer_line_number, infer_pp_unit, ContextAssembler, SkipReason};
pub use grading::{grade, render_report, EdgeBucket, GradingReport, Recommendation, SignalGrade, SliceStats};
pub use prop::{is_hit, BacktestProp, HistoricalProp, PropState};
pub use settlement::{find_actual, settle_prop, Unmatched};

use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BacktestConfig;
use crate::domain::PriceQuote;
use crate::edge::EdgeCalculator;
use crate::providers::{MarketQuoteProvider, OutcomeProvider, PropKey, StatProvider};

/// Everything a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub weights_version: String,
    pub props: Vec<BacktestProp>,
    pub report: GradingReport,
}

pub struct BacktestHarness {
    calculator: Arc<EdgeCalculator>,
    assembler: ContextAssembler,
    quotes: Arc<dyn MarketQuoteProvider>,
    outcomes: Arc<dyn OutcomeProvider>,
    config: BacktestConfig,
}

impl BacktestHarness {
    pub fn new(
        calculator: Arc<EdgeCalculator>,
        stats: Arc<dyn StatProvider>,
        quotes: Arc<dyn MarketQuoteProvider>,
        outcomes: Arc<dyn OutcomeProvider>,
        config: BacktestConfig,
    ) -> Self {
        Self {
            calculator,
            assembler: ContextAssembler::new(stats, quotes.clone(), config.clone()),
            quotes,
            outcomes,
            config,
        }
    }

    pub async fn run(&self, props: Vec<HistoricalProp>) -> BacktestRun {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut by_date: BTreeMap<NaiveDate, Vec<HistoricalProp>> = BTreeMap::new();
        for prop in props {
            by_date.entry(prop.game_date).or_default().push(prop);
        }
        info!(
            %run_id,
            dates = by_date.len(),
            weights = self.calculator.weights_version(),
            "Starting backtest"
        );

        let max_concurrent = self.config.max_concurrent_dates.max(1);
        let mut results: Vec<BacktestProp> = stream::iter(by_date)
            .map(|(date, props)| self.run_date(date, props))
            .buffer_unordered(max_concurrent)
            .collect::<Vec<Vec<BacktestProp>>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        results.sort_by(|a, b| {
            (a.prop.game_date, &a.prop.event_id, &a.prop.player_name)
                .cmp(&(b.prop.game_date, &b.prop.event_id, &b.prop.player_name))
        });

        let report = grade(&results, &self.config);
        info!(
            %run_id,
            total = report.total_props,
            settled = report.settled,
            hit_rate = ?report.overall.hit_rate,
            "Backtest complete"
        );

        BacktestRun {
            run_id,
            started_at,
            finished_at: Utc::now(),
            weights_version: self.calculator.weights_version().to_string(),
            props: results,
            report,
        }
    }

    async fn run_date(&self, date: NaiveDate, props: Vec<HistoricalProp>) -> Vec<BacktestProp> {
        let mut scored = Vec::with_capacity(props.len());
        for historical in props {
            let mut prop = BacktestProp::new(historical);
            self.score_prop(&mut prop).await;
            scored.push(prop);
        }

        let box_scores = match self.outcomes.get_box_scores(date).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(%date, "Box scores unavailable, props stay unsettled: {}", e);
                Vec::new()
            }
        };

        for prop in scored.iter_mut() {
            if let Err(e) = settle_prop(prop, &box_scores) {
                warn!(prop = %prop.prop.label(), "Settlement failed: {}", e);
            }
        }

        debug!(%date, props = scored.len(), "Date complete");
        scored
    }

    async fn score_prop(&self, prop: &mut BacktestProp) {
        let ctx = match self.assembler.build(&prop.prop).await {
            Ok(ctx) => ctx,
            Err(reason) => {
                debug!(prop = %prop.prop.label(), "Skipped: {}", reason);
                prop.skip(reason.to_string());
                return;
            }
        };

        let key = PropKey {
            player_name: prop.prop.player_name.clone(),
            stat_type: prop.prop.stat_type,
            line: prop.prop.line,
        };
        let quote = match self.quotes.get_price(&prop.prop.event_id, &key).await {
            Ok(quote) => quote.unwrap_or_default(),
            Err(e) => {
                warn!(prop = %prop.prop.label(), "Price unavailable: {}", e);
                PriceQuote::default()
            }
        };

        let edge = self.calculator.calculate_edge(&ctx, &quote);
        let recorded = prop
            .record_context(ctx)
            .and_then(|_| prop.record_score(edge, quote));
        if let Err(e) = recorded {
            warn!(prop = %prop.prop.label(), "Could not record score: {}", e);
        }
    }
}
