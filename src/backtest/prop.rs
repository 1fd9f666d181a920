//! One historical prop as it moves through a backtest run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Direction, PriceQuote, PropContext, StatType};
use crate::edge::EdgeResult;
use crate::error::{PropEdgeError, Result};

/// A quoted prop from a past slate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalProp {
    pub event_id: String,
    pub game_date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    /// Absent for game-level markets
    pub player_name: Option<String>,
    pub stat_type: StatType,
    pub line: f64,
}

impl HistoricalProp {
    pub fn teams(&self) -> Vec<String> {
        vec![self.home_team.clone(), self.away_team.clone()]
    }

    pub fn label(&self) -> String {
        let who = self
            .player_name
            .clone()
            .unwrap_or_else(|| format!("{}@{}", self.away_team, self.home_team));
        format!("{} {} {} ({})", who, self.stat_type, self.line, self.game_date)
    }
}

/// Backtest prop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropState {
    /// Created from the historical slate
    Pending,
    /// Point-in-time context assembled
    ContextBuilt,
    /// Edge calculated
    Scored,
    /// Matched to a final box score
    Settled,
    /// No usable outcome; excluded from grading
    Unsettled,
}

impl PropState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropState::Pending => "PENDING",
            PropState::ContextBuilt => "CONTEXT_BUILT",
            PropState::Scored => "SCORED",
            PropState::Settled => "SETTLED",
            PropState::Unsettled => "UNSETTLED",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: PropState) -> bool {
        use PropState::*;

        matches!(
            (self, target),
            (Pending, ContextBuilt)
                | (ContextBuilt, Scored)
                | (Scored, Settled)
                | (Scored, Unsettled)
        )
    }

    /// Get valid next states from current state
    pub fn valid_transitions(&self) -> Vec<PropState> {
        use PropState::*;

        match self {
            Pending => vec![ContextBuilt],
            ContextBuilt => vec![Scored],
            Scored => vec![Settled, Unsettled],
            Settled | Unsettled => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PropState::Settled | PropState::Unsettled)
    }
}

impl fmt::Display for PropState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PropState {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(PropState::Pending),
            "CONTEXT_BUILT" => Ok(PropState::ContextBuilt),
            "SCORED" => Ok(PropState::Scored),
            "SETTLED" => Ok(PropState::Settled),
            "UNSETTLED" => Ok(PropState::Unsettled),
            _ => Err(format!("Unknown prop state: {}", s)),
        }
    }
}

/// Historical prop plus everything the harness learned about it.
///
/// Props that never get a context (unknown player, too little history)
/// stay `Pending` with `skip_reason` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestProp {
    pub prop: HistoricalProp,
    pub state: PropState,
    pub player_id: Option<u64>,
    pub team: Option<String>,
    pub context: Option<PropContext>,
    pub quote: Option<PriceQuote>,
    pub edge: Option<EdgeResult>,
    pub actual_value: Option<f64>,
    pub hit: Option<bool>,
    pub settled: bool,
    pub skip_reason: Option<String>,
    pub unsettled_reason: Option<String>,
}

impl BacktestProp {
    pub fn new(prop: HistoricalProp) -> Self {
        Self {
            prop,
            state: PropState::Pending,
            player_id: None,
            team: None,
            context: None,
            quote: None,
            edge: None,
            actual_value: None,
            hit: None,
            settled: false,
            skip_reason: None,
            unsettled_reason: None,
        }
    }

    fn transition(&mut self, target: PropState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(PropEdgeError::InvalidStateTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    pub fn skip(&mut self, reason: impl Into<String>) {
        self.skip_reason = Some(reason.into());
    }

    pub fn is_skipped(&self) -> bool {
        self.state == PropState::Pending && self.skip_reason.is_some()
    }

    pub fn record_context(&mut self, context: PropContext) -> Result<()> {
        self.transition(PropState::ContextBuilt)?;
        self.player_id = context.player_id;
        self.team = Some(context.team.clone());
        self.context = Some(context);
        Ok(())
    }

    pub fn record_score(&mut self, edge: EdgeResult, quote: PriceQuote) -> Result<()> {
        self.transition(PropState::Scored)?;
        self.edge = Some(edge);
        self.quote = Some(quote);
        Ok(())
    }

    pub fn direction(&self) -> Option<Direction> {
        self.edge.as_ref().map(|e| e.direction)
    }

    pub fn edge_pct(&self) -> Option<f64> {
        self.edge.as_ref().map(|e| e.edge_pct)
    }

    /// Resolve against an observed value; `None` marks the prop unsettled.
    ///
    /// Re-settling with the same value is a no-op. A different value for an
    /// already-resolved prop is a `SettlementConflict`.
    pub fn settle(&mut self, actual: Option<f64>, reason: Option<&str>) -> Result<()> {
        if self.state.is_terminal() {
            if self.actual_value == actual {
                return Ok(());
            }
            return Err(PropEdgeError::SettlementConflict {
                prop: self.prop.label(),
                existing: self.actual_value,
                incoming: actual,
            });
        }

        let direction = self.direction();
        match (actual, direction) {
            (Some(value), Some(direction)) => {
                self.transition(PropState::Settled)?;
                self.actual_value = Some(value);
                self.hit = Some(is_hit(direction, value, self.prop.line));
                self.settled = true;
            }
            _ => {
                self.transition(PropState::Unsettled)?;
                self.unsettled_reason = Some(reason.unwrap_or("no outcome").to_string());
            }
        }
        Ok(())
    }
}

/// Over wins strictly above the line, under strictly below; a push loses both.
pub fn is_hit(direction: Direction, actual: f64, line: f64) -> bool {
    match direction {
        Direction::Over => actual > line,
        Direction::Under => actual < line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::edge::EdgeCalculator;

    fn historical() -> HistoricalProp {
        HistoricalProp {
            event_id: "g1".to_string(),
            game_date: NaiveDate::from_ymd_opt(2025, 11, 7).unwrap(),
            home_team: "EDM".to_string(),
            away_team: "CGY".to_string(),
            player_name: Some("Connor McDavid".to_string()),
            stat_type: StatType::Points,
            line: 1.5,
        }
    }

    fn scored() -> BacktestProp {
        let mut prop = BacktestProp::new(historical());
        let mut ctx = PropContext::new(
            "Connor McDavid",
            "EDM",
            StatType::Points,
            1.5,
            prop.prop.game_date,
        );
        ctx.season_games = Some(20);
        ctx.season_points = Some(40);
        prop.record_context(ctx.clone()).unwrap();

        let calc = EdgeCalculator::new(&AppConfig::default()).unwrap();
        let quote = PriceQuote::new(Some(-110.0), Some(-110.0));
        let edge = calc.calculate_edge(&ctx, &quote);
        prop.record_score(edge, quote).unwrap();
        prop
    }

    #[test]
    fn test_valid_transitions() {
        assert!(PropState::Pending.can_transition_to(PropState::ContextBuilt));
        assert!(PropState::Scored.can_transition_to(PropState::Unsettled));
        assert!(!PropState::Pending.can_transition_to(PropState::Scored));
        assert!(!PropState::ContextBuilt.can_transition_to(PropState::Settled));
        assert!(!PropState::Settled.can_transition_to(PropState::Unsettled));
        assert!(PropState::Unsettled.valid_transitions().is_empty());
    }

    #[test]
    fn test_state_string_roundtrip() {
        for s in ["PENDING", "context_built", "Scored", "SETTLED", "UNSETTLED"] {
            let state = PropState::try_from(s).unwrap();
            assert_eq!(state.as_str(), s.to_uppercase());
        }
        assert!(PropState::try_from("VOID").is_err());
    }

    #[test]
    fn test_no_skipping_states() {
        let mut prop = BacktestProp::new(historical());
        let err = prop.settle(Some(2.0), None).unwrap_err();
        assert!(matches!(err, PropEdgeError::InvalidStateTransition { .. }));
        assert_eq!(prop.state, PropState::Pending);
    }

    #[test]
    fn test_settlement_is_idempotent() {
        let mut prop = scored();
        assert_eq!(prop.direction(), Some(Direction::Over));

        prop.settle(Some(2.0), None).unwrap();
        assert_eq!(prop.state, PropState::Settled);
        assert_eq!(prop.hit, Some(true));

        prop.settle(Some(2.0), None).unwrap();
        assert_eq!(prop.hit, Some(true));

        let err = prop.settle(Some(1.0), None).unwrap_err();
        assert!(matches!(err, PropEdgeError::SettlementConflict { .. }));
        assert_eq!(prop.hit, Some(true));
    }

    #[test]
    fn test_missing_outcome_is_unsettled() {
        let mut prop = scored();
        prop.settle(None, Some("game postponed")).unwrap();
        assert_eq!(prop.state, PropState::Unsettled);
        assert_eq!(prop.hit, None);
        assert!(!prop.settled);
        assert_eq!(prop.unsettled_reason.as_deref(), Some("game postponed"));
        // Same inputs again
        prop.settle(None, None).unwrap();
        assert_eq!(prop.state, PropState::Unsettled);
    }

    #[test]
    fn test_push_loses_both_sides() {
        assert!(!is_hit(Direction::Over, 2.0, 2.0));
        assert!(!is_hit(Direction::Under, 2.0, 2.0));
        assert!(is_hit(Direction::Under, 1.0, 1.5));
    }
}
