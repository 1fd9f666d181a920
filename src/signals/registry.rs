//! Signal registry
//!
//! Maps every [`SignalKind`] to its implementation through exhaustive
//! matches, so adding a kind without an implementation fails to compile.

use tracing::debug;

use super::{
    CorrelationSignal, GameTotalsSignal, GoalieWorkloadSignal, LineValueSignal, MatchupSignal,
    ShotQualitySignal, Signal, SignalKind, SignalResult, SituationalSignal, TrendSignal,
    UsageSignal,
};
use crate::config::SignalsConfig;
use crate::domain::{PropContext, StatType};
use crate::error::SignalError;

/// Closed set of signal implementations
#[derive(Debug, Clone)]
pub enum AnySignal {
    LineValue(LineValueSignal),
    Trend(TrendSignal),
    Usage(UsageSignal),
    Matchup(MatchupSignal),
    Situational(SituationalSignal),
    Correlation(CorrelationSignal),
    ShotQuality(ShotQualitySignal),
    GoalieWorkload(GoalieWorkloadSignal),
    GameTotals(GameTotalsSignal),
}

impl AnySignal {
    pub fn for_kind(kind: SignalKind, config: &SignalsConfig) -> Self {
        match kind {
            SignalKind::LineValue => AnySignal::LineValue(LineValueSignal),
            SignalKind::Trend => AnySignal::Trend(TrendSignal),
            SignalKind::Usage => AnySignal::Usage(UsageSignal),
            SignalKind::Matchup => AnySignal::Matchup(MatchupSignal),
            SignalKind::Situational => AnySignal::Situational(SituationalSignal),
            SignalKind::Correlation => AnySignal::Correlation(CorrelationSignal),
            SignalKind::ShotQuality => AnySignal::ShotQuality(ShotQualitySignal),
            SignalKind::GoalieWorkload => AnySignal::GoalieWorkload(GoalieWorkloadSignal::new(
                config.goalie_workload.invert_output,
            )),
            SignalKind::GameTotals => AnySignal::GameTotals(GameTotalsSignal),
        }
    }

    fn inner(&self) -> &dyn Signal {
        match self {
            AnySignal::LineValue(s) => s,
            AnySignal::Trend(s) => s,
            AnySignal::Usage(s) => s,
            AnySignal::Matchup(s) => s,
            AnySignal::Situational(s) => s,
            AnySignal::Correlation(s) => s,
            AnySignal::ShotQuality(s) => s,
            AnySignal::GoalieWorkload(s) => s,
            AnySignal::GameTotals(s) => s,
        }
    }
}

impl Signal for AnySignal {
    fn kind(&self) -> SignalKind {
        self.inner().kind()
    }

    fn calculate(
        &self,
        player_id: Option<u64>,
        player_name: &str,
        stat_type: StatType,
        line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        self.inner()
            .calculate(player_id, player_name, stat_type, line, ctx)
    }
}

/// Ordered set of signals the calculator runs for every prop
#[derive(Debug, Clone)]
pub struct SignalRegistry {
    signals: Vec<AnySignal>,
}

impl SignalRegistry {
    /// Register every known signal
    pub fn from_config(config: &SignalsConfig) -> Self {
        Self::with_kinds(&SignalKind::ALL, config)
    }

    /// Register a subset (duplicates are ignored)
    pub fn with_kinds(kinds: &[SignalKind], config: &SignalsConfig) -> Self {
        let mut signals: Vec<AnySignal> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if signals.iter().any(|s| s.kind() == *kind) {
                continue;
            }
            signals.push(AnySignal::for_kind(*kind, config));
        }
        debug!("Registered {} signals", signals.len());
        Self { signals }
    }

    pub fn get(&self, kind: SignalKind) -> Option<&AnySignal> {
        self.signals.iter().find(|s| s.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnySignal> {
        self.signals.iter()
    }

    pub fn kinds(&self) -> Vec<SignalKind> {
        self.signals.iter().map(|s| s.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl Default for SignalRegistry {
    fn default() -> Self {
        Self::from_config(&SignalsConfig::default())
    }
}
