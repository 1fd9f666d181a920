//! Edge calculator
//!
//! Runs every registered signal over a [`PropContext`], blends the results
//! into a model probability, compares both sides against the market and
//! picks the side with the larger edge.

pub mod odds;
pub mod reasons;

pub use odds::{
    decimal_payout, logit, market_probabilities, odds_to_probability, probability_to_odds,
    sigmoid, MarketSource,
};
pub use reasons::{build_reasons, Reasons, NO_STRONG_SIGNALS};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::{AppConfig, ContrarianConfig, EngineConfig, SignalWeights};
use crate::domain::{Direction, PriceConvention, PriceQuote, PropContext, StatType};
use crate::error::{PropEdgeError, Result};
use crate::signals::{Signal, SignalKind, SignalRegistry, SignalResult};

// ============================================================================
// Edge result
// ============================================================================

/// Scored prop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeResult {
    // Prop identification
    pub player_id: Option<u64>,
    pub player_name: String,
    pub game_id: Option<String>,
    pub stat_type: StatType,
    pub line: f64,

    // Model vs market for the selected side
    pub model_probability: f64,
    pub market_probability: f64,
    /// (model - market) x 100 for the selected side
    pub edge_pct: f64,
    pub direction: Direction,
    pub over_edge_pct: f64,
    pub under_edge_pct: f64,
    pub market_source: MarketSource,

    /// Weight-averaged signal confidence
    pub confidence: f64,
    pub primary_reason: String,
    pub supporting_reasons: Vec<String>,
    pub risk_factors: Vec<String>,

    pub signals: BTreeMap<SignalKind, SignalResult>,
    /// Blended strength before probability conversion
    pub weighted_signal: f64,

    pub contrarian_applied: bool,
    /// Side picked before the contrarian fade
    pub original_direction: Option<Direction>,
}

impl EdgeResult {
    pub fn has_edge(&self, min_edge: f64) -> bool {
        self.edge_pct >= min_edge
    }

    pub fn signal(&self, kind: SignalKind) -> Option<&SignalResult> {
        self.signals.get(&kind)
    }
}

// ============================================================================
// Calculator
// ============================================================================

#[derive(Debug, Clone)]
pub struct EdgeCalculator {
    registry: SignalRegistry,
    weights: BTreeMap<SignalKind, f64>,
    weights_version: String,
    engine: EngineConfig,
    conventions: BTreeMap<StatType, PriceConvention>,
    contrarian_enabled: bool,
    contrarian_default: Option<f64>,
    contrarian_thresholds: BTreeMap<StatType, f64>,
}

impl EdgeCalculator {
    /// Build from a full configuration. Invalid configuration is fatal here,
    /// never per call.
    pub fn new(config: &AppConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| PropEdgeError::InvalidConfig(errors.join("; ")))?;
        Self::from_parts(
            SignalRegistry::from_config(&config.signals),
            &config.weights,
            &config.engine,
            &config.contrarian,
        )
    }

    pub fn from_parts(
        registry: SignalRegistry,
        weights: &SignalWeights,
        engine: &EngineConfig,
        contrarian: &ContrarianConfig,
    ) -> Result<Self> {
        engine
            .validate()
            .map_err(|errors| PropEdgeError::InvalidConfig(errors.join("; ")))?;
        let weight_table = weights
            .weight_table()
            .map_err(|errors| PropEdgeError::InvalidConfig(errors.join("; ")))?;
        let conventions = engine
            .market_conventions()
            .map_err(PropEdgeError::InvalidConfig)?;
        let contrarian_thresholds = contrarian
            .resolved_thresholds()
            .map_err(PropEdgeError::InvalidConfig)?;
        if registry.is_empty() {
            return Err(PropEdgeError::InvalidConfig(
                "signal registry is empty".to_string(),
            ));
        }

        debug!(
            "Edge calculator ready: {} signals, weights {}",
            registry.len(),
            weights.version
        );

        Ok(Self {
            registry,
            weights: weight_table,
            weights_version: weights.version.clone(),
            engine: engine.clone(),
            conventions,
            contrarian_enabled: contrarian.enabled,
            contrarian_default: contrarian.default_threshold,
            contrarian_thresholds,
        })
    }

    pub fn weights_version(&self) -> &str {
        &self.weights_version
    }

    pub fn weight(&self, kind: SignalKind) -> f64 {
        self.weights.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    pub fn min_edge_pct(&self) -> f64 {
        self.engine.min_edge_pct
    }

    /// Price convention for a stat's market (American unless configured)
    pub fn convention_for(&self, stat: StatType) -> PriceConvention {
        self.conventions.get(&stat).copied().unwrap_or_default()
    }

    /// Run every registered signal. A failing signal is logged and scored
    /// as neutral with zero confidence.
    pub fn calculate_signals(&self, ctx: &PropContext) -> BTreeMap<SignalKind, SignalResult> {
        let mut results = BTreeMap::new();
        for signal in self.registry.iter() {
            let kind = signal.kind();
            let result = match signal.calculate(
                ctx.player_id,
                &ctx.player_name,
                ctx.stat_type,
                ctx.line,
                ctx,
            ) {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        player = %ctx.player_name,
                        stat = %ctx.stat_type,
                        signal = %kind,
                        "Signal failed, treating as neutral: {}",
                        e
                    );
                    SignalResult::failed(kind, &e)
                }
            };
            results.insert(kind, result);
        }
        results
    }

    /// Σ(strength · weight · confidence) / Σ(weight · confidence)
    pub fn blend(&self, signals: &BTreeMap<SignalKind, SignalResult>) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (kind, result) in signals {
            let effective = self.weight(*kind) * result.confidence;
            numerator += result.strength * effective;
            denominator += effective;
        }
        if denominator > 0.0 {
            (numerator / denominator).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Over probability implied by a blended strength
    pub fn model_probability(&self, weighted_signal: f64) -> f64 {
        sigmoid(logit(self.engine.base_probability) + weighted_signal * self.engine.sensitivity_gain)
    }

    /// Confidence of the whole opinion, weighted by signal weight
    fn overall_confidence(&self, signals: &BTreeMap<SignalKind, SignalResult>) -> f64 {
        let total_weight: f64 = signals.keys().map(|k| self.weight(*k)).sum();
        if total_weight > 0.0 {
            signals
                .iter()
                .map(|(k, r)| self.weight(*k) * r.confidence)
                .sum::<f64>()
                / total_weight
        } else if signals.is_empty() {
            0.0
        } else {
            signals.values().map(|r| r.confidence).sum::<f64>() / signals.len() as f64
        }
    }

    fn contrarian_threshold(&self, stat: StatType) -> Option<f64> {
        if !self.contrarian_enabled {
            return None;
        }
        self.contrarian_thresholds
            .get(&stat)
            .copied()
            .or(self.contrarian_default)
    }

    /// Score one prop against a market quote.
    ///
    /// Always returns a complete result; props with no usable signal come
    /// back with a near-zero edge and "No strong signals detected".
    pub fn calculate_edge(&self, ctx: &PropContext, quote: &PriceQuote) -> EdgeResult {
        let signals = self.calculate_signals(ctx);
        let weighted_signal = self.blend(&signals);

        let convention = self.convention_for(ctx.stat_type);
        let (over_market, under_market, market_source) =
            market_probabilities(quote, convention, self.engine.vig_margin);

        let model_over = self.model_probability(weighted_signal);
        let model_under = 1.0 - model_over;

        let over_edge = (model_over - over_market) * 100.0;
        let under_edge = (model_under - under_market) * 100.0;

        let side = |direction: Direction| match direction {
            Direction::Over => (over_edge, over_market, model_over),
            Direction::Under => (under_edge, under_market, model_under),
        };

        let picked = if over_edge >= under_edge {
            Direction::Over
        } else {
            Direction::Under
        };

        let mut direction = picked;
        if let Some(threshold) = self.contrarian_threshold(ctx.stat_type) {
            if side(picked).0 > threshold {
                direction = picked.opposite();
                debug!(
                    player = %ctx.player_name,
                    stat = %ctx.stat_type,
                    "Contrarian fade: {} edge {:.1} > {:.1}, taking {}",
                    picked,
                    side(picked).0,
                    threshold,
                    direction
                );
            }
        }
        let contrarian_applied = direction != picked;
        let (edge_pct, market_probability, model_probability) = side(direction);

        let reasons = build_reasons(
            &signals,
            direction,
            self.engine.reason_threshold,
            self.engine.max_supporting_reasons,
            self.engine.max_risk_factors,
        );
        let confidence = self.overall_confidence(&signals);

        debug!(
            player = %ctx.player_name,
            stat = %ctx.stat_type,
            line = ctx.line,
            "Edge {:+.1} on {} (model {:.3} vs market {:.3}, blend {:+.3})",
            edge_pct,
            direction,
            model_probability,
            market_probability,
            weighted_signal
        );

        EdgeResult {
            player_id: ctx.player_id,
            player_name: ctx.player_name.clone(),
            game_id: ctx.game_id.clone(),
            stat_type: ctx.stat_type,
            line: ctx.line,
            model_probability,
            market_probability,
            edge_pct,
            direction,
            over_edge_pct: over_edge,
            under_edge_pct: under_edge,
            market_source,
            confidence,
            primary_reason: reasons.primary_reason,
            supporting_reasons: reasons.supporting_reasons,
            risk_factors: reasons.risk_factors,
            signals,
            weighted_signal,
            contrarian_applied,
            original_direction: contrarian_applied.then_some(picked),
        }
    }
}
