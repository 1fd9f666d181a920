//! Signal contract and the closed set of prop signals.
//!
//! Each signal reads a [`PropContext`] and returns a directional opinion:
//! `strength` in [-1, 1] (positive favours the over) and `confidence` in
//! [0, 1]. Missing data is never an error; it comes back as a neutral,
//! low-confidence result whose evidence says what was unavailable.

pub mod correlation;
pub mod game_totals;
pub mod goalie_workload;
pub mod line_value;
pub mod matchup;
pub mod registry;
pub mod shot_quality;
pub mod situational;
pub mod trend;
pub mod usage;

pub use correlation::CorrelationSignal;
pub use game_totals::GameTotalsSignal;
pub use goalie_workload::GoalieWorkloadSignal;
pub use line_value::LineValueSignal;
pub use matchup::MatchupSignal;
pub use registry::{AnySignal, SignalRegistry};
pub use shot_quality::ShotQualitySignal;
pub use situational::SituationalSignal;
pub use trend::TrendSignal;
pub use usage::UsageSignal;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::{PropContext, StatType};
use crate::error::{PropEdgeError, SignalError};

// ============================================================================
// Signal identity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    LineValue,
    Trend,
    Usage,
    Matchup,
    Situational,
    Correlation,
    ShotQuality,
    GoalieWorkload,
    GameTotals,
}

impl SignalKind {
    pub const ALL: [SignalKind; 9] = [
        SignalKind::LineValue,
        SignalKind::Trend,
        SignalKind::Usage,
        SignalKind::Matchup,
        SignalKind::Situational,
        SignalKind::Correlation,
        SignalKind::ShotQuality,
        SignalKind::GoalieWorkload,
        SignalKind::GameTotals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::LineValue => "line_value",
            SignalKind::Trend => "trend",
            SignalKind::Usage => "usage",
            SignalKind::Matchup => "matchup",
            SignalKind::Situational => "situational",
            SignalKind::Correlation => "correlation",
            SignalKind::ShotQuality => "shot_quality",
            SignalKind::GoalieWorkload => "goalie_workload",
            SignalKind::GameTotals => "game_totals",
        }
    }

    /// Label used in reasons and report tables
    pub fn display_name(&self) -> &'static str {
        match self {
            SignalKind::LineValue => "Line value",
            SignalKind::Trend => "Trend",
            SignalKind::Usage => "Usage",
            SignalKind::Matchup => "Matchup",
            SignalKind::Situational => "Situational",
            SignalKind::Correlation => "Game environment",
            SignalKind::ShotQuality => "Shot quality",
            SignalKind::GoalieWorkload => "Goalie workload",
            SignalKind::GameTotals => "Game total",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = PropEdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "line_value" => SignalKind::LineValue,
            "trend" => SignalKind::Trend,
            "usage" => SignalKind::Usage,
            "matchup" => SignalKind::Matchup,
            // "environment" is the older name of the situational signal
            "situational" | "environment" => SignalKind::Situational,
            "correlation" => SignalKind::Correlation,
            "shot_quality" => SignalKind::ShotQuality,
            "goalie_workload" | "goalie_saves" => SignalKind::GoalieWorkload,
            "game_totals" => SignalKind::GameTotals,
            _ => return Err(PropEdgeError::UnknownSignal(s.to_string())),
        };
        Ok(kind)
    }
}

// ============================================================================
// Signal result
// ============================================================================

pub const REASON_NO_DATA: &str = "no_data";
pub const REASON_IRRELEVANT: &str = "irrelevant_stat";

/// One signal's opinion on one prop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub signal: SignalKind,
    /// -1.0 (strong under) to +1.0 (strong over)
    pub strength: f64,
    /// 0.0 (ignore) to 1.0 (fully trusted)
    pub confidence: f64,
    pub evidence: String,
    /// Intermediate values for audit and backtest analysis; never scored
    #[serde(default)]
    pub raw_data: BTreeMap<String, Value>,
}

impl SignalResult {
    /// Build a result, forcing both numbers into range.
    pub fn new(signal: SignalKind, strength: f64, confidence: f64, evidence: impl Into<String>) -> Self {
        Self {
            signal,
            strength: clamp_strength(strength),
            confidence: clamp_confidence(confidence),
            evidence: evidence.into(),
            raw_data: BTreeMap::new(),
        }
    }

    /// Neutral opinion because inputs were unavailable
    pub fn no_data(signal: SignalKind, confidence: f64, missing: &str) -> Self {
        Self::new(
            signal,
            0.0,
            confidence.min(0.4),
            format!("reason: {} ({} unavailable)", REASON_NO_DATA, missing),
        )
        .with_raw("reason", REASON_NO_DATA)
    }

    /// Neutral opinion with zero weight in the blend
    pub fn irrelevant(signal: SignalKind, stat: StatType) -> Self {
        Self::new(
            signal,
            0.0,
            0.0,
            format!("{} not relevant for {}", signal.display_name(), stat),
        )
        .with_raw("reason", REASON_IRRELEVANT)
    }

    /// Stand-in for a signal that failed unexpectedly
    pub fn failed(signal: SignalKind, error: &SignalError) -> Self {
        Self::new(signal, 0.0, 0.0, format!("Signal failed: {}", error))
            .with_raw("reason", "error")
    }

    pub fn with_raw(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.raw_data.insert(key.to_string(), value.into());
        self
    }

    /// Optional values are recorded as JSON null
    pub fn with_raw_opt(self, key: &str, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.with_raw(key, v),
            None => self.with_raw(key, Value::Null),
        }
    }

    /// Ranking key used by reason synthesis
    pub fn impact(&self) -> f64 {
        self.strength.abs() * self.confidence
    }

    pub fn reason(&self) -> Option<&str> {
        self.raw_data.get("reason").and_then(|v| v.as_str())
    }
}

pub fn clamp_strength(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Reject NaN / infinite inputs a signal cannot reason about
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, SignalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SignalError::NonFinite { field, value })
    }
}

/// Weighted mean of `(value, weight)` components
pub(crate) fn weighted_mean(components: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = components.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    components.iter().map(|(c, w)| c * w).sum::<f64>() / total_weight
}

// ============================================================================
// Signal trait
// ============================================================================

/// A single prop heuristic.
///
/// Implementations are pure functions of their inputs and must not fail on
/// missing data.
pub trait Signal: Send + Sync {
    fn kind(&self) -> SignalKind;

    fn calculate(
        &self,
        player_id: Option<u64>,
        player_name: &str,
        stat_type: StatType,
        line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_clamps_out_of_range() {
        let r = SignalResult::new(SignalKind::Trend, 3.2, 1.7, "x");
        assert_eq!(r.strength, 1.0);
        assert_eq!(r.confidence, 1.0);

        let r = SignalResult::new(SignalKind::Trend, f64::NAN, f64::INFINITY, "x");
        assert_eq!(r.strength, 0.0);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_no_data_caps_confidence() {
        let r = SignalResult::no_data(SignalKind::Usage, 0.9, "line number");
        assert_eq!(r.strength, 0.0);
        assert!(r.confidence <= 0.4);
        assert!(r.evidence.contains("no_data"));
        assert_eq!(r.reason(), Some(REASON_NO_DATA));
    }

    #[test]
    fn test_signal_kind_parse() {
        for kind in SignalKind::ALL {
            assert_eq!(kind.as_str().parse::<SignalKind>().unwrap(), kind);
        }
        assert_eq!(
            "environment".parse::<SignalKind>().unwrap(),
            SignalKind::Situational
        );
        assert!("vibes".parse::<SignalKind>().is_err());
    }

    #[test]
    fn test_weighted_mean_ignores_zero_weight() {
        assert_eq!(weighted_mean(&[]), 0.0);
        assert!((weighted_mean(&[(0.5, 0.25), (-0.5, 0.0)]) - 0.5).abs() < 1e-12);
    }
}
