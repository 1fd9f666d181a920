//! Game environment: projected scoring vs the market total, plus spread.

use super::{Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, StatType, TeamProfile};
use crate::error::SignalError;

/// League-average combined goals, used when team profiles are missing
const LEAGUE_AVG_TOTAL: f64 = 6.0;
/// Strength per goal of deviation
const IMPACT_PER_GOAL: f64 = 0.15;
const TOP_DEPLOYMENT_AMPLIFIER: f64 = 1.3;
const FAVOURITE_SPREAD: f64 = -1.5;
const UNDERDOG_SPREAD: f64 = 1.5;

#[derive(Debug, Clone, Default)]
pub struct CorrelationSignal;

/// Expected combined goals from both teams' scoring and allowing rates
pub fn projected_total(team: &TeamProfile, opponent: &TeamProfile) -> f64 {
    let team_goals = (team.goals_for_per_game + opponent.goals_against_per_game) / 2.0;
    let opponent_goals = (opponent.goals_for_per_game + team.goals_against_per_game) / 2.0;
    team_goals + opponent_goals
}

impl Signal for CorrelationSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Correlation
    }

    fn calculate(
        &self,
        _player_id: Option<u64>,
        _player_name: &str,
        stat_type: StatType,
        _line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        if !stat_type.is_skater_scoring() {
            return Ok(SignalResult::irrelevant(self.kind(), stat_type));
        }
        let Some(market_total) = ctx.game_total.filter(|t| t.is_finite()) else {
            return Ok(SignalResult::no_data(self.kind(), 0.4, "game total"));
        };

        let mut notes = Vec::new();
        let projected = match (&ctx.team_profile, &ctx.opponent_profile) {
            (Some(team), Some(opp)) => Some(projected_total(team, opp)),
            _ => None,
        };

        // Projection vs market when we can project, otherwise market vs league
        let (deviation, confidence) = match projected {
            Some(p) => {
                notes.push(format!("projected {:.1} vs market {:.1}", p, market_total));
                (p - market_total, 0.7)
            }
            None => {
                notes.push(format!("market total {:.1}", market_total));
                (market_total - LEAGUE_AVG_TOTAL, 0.55)
            }
        };

        let mut strength = deviation * IMPACT_PER_GOAL;
        let top_deployment = ctx.line_number.map(|l| l <= 2).unwrap_or(false);
        if top_deployment {
            strength *= TOP_DEPLOYMENT_AMPLIFIER;
            notes.push("top-six deployment".to_string());
        }

        if let Some(spread) = ctx.spread.filter(|s| s.is_finite()) {
            if spread < FAVOURITE_SPREAD {
                strength += 0.1;
                notes.push("heavy favourite".to_string());
            } else if spread > UNDERDOG_SPREAD {
                strength -= 0.05;
                notes.push("underdog".to_string());
            }
        }

        Ok(
            SignalResult::new(self.kind(), strength, confidence, notes.join(", "))
                .with_raw("game_total", market_total)
                .with_raw_opt("projected_total", projected)
                .with_raw("deviation", deviation)
                .with_raw_opt("spread", ctx.spread),
        )
    }
}
