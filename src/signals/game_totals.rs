//! Combined-goals projection for game total props.

use super::correlation::projected_total;
use super::{ensure_finite, weighted_mean, Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, StatType, TeamProfile};
use crate::error::SignalError;

const AVG_GOALS_PER_TEAM: f64 = 3.0;
const AVG_GAA: f64 = 2.90;
const HIGH_SCORING_GPG: f64 = 3.5;
const LOW_SCORING_GPG: f64 = 2.5;
const POOR_GAA: f64 = 3.30;
const ELITE_GAA: f64 = 2.50;

#[derive(Debug, Clone, Default)]
pub struct GameTotalsSignal;

impl GameTotalsSignal {
    fn league_average(team: &str) -> TeamProfile {
        TeamProfile {
            team: team.to_string(),
            goals_for_per_game: AVG_GOALS_PER_TEAM,
            goals_against_per_game: AVG_GOALS_PER_TEAM,
            shots_for_per_game: None,
            offensive_zone_share: None,
            starter_gaa: Some(AVG_GAA),
        }
    }

    fn offense_component(combined: f64) -> f64 {
        if combined >= HIGH_SCORING_GPG {
            0.5
        } else if combined <= LOW_SCORING_GPG {
            -0.5
        } else {
            ((combined - AVG_GOALS_PER_TEAM) / (HIGH_SCORING_GPG - AVG_GOALS_PER_TEAM))
                .clamp(-0.5, 0.5)
        }
    }

    fn goaltending_component(combined_gaa: f64) -> f64 {
        if combined_gaa >= POOR_GAA {
            0.4
        } else if combined_gaa <= ELITE_GAA {
            -0.4
        } else {
            ((combined_gaa - AVG_GAA) / (POOR_GAA - AVG_GAA)).clamp(-0.4, 0.4)
        }
    }
}

impl Signal for GameTotalsSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::GameTotals
    }

    fn calculate(
        &self,
        _player_id: Option<u64>,
        _player_name: &str,
        stat_type: StatType,
        line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        if stat_type != StatType::GameTotal {
            return Ok(SignalResult::irrelevant(self.kind(), stat_type));
        }
        let line = ensure_finite("line", line)?;
        if ctx.team_profile.is_none() && ctx.opponent_profile.is_none() {
            return Ok(SignalResult::no_data(self.kind(), 0.4, "team scoring profiles"));
        }

        let mut confidence: f64 = 0.75;
        let team = match &ctx.team_profile {
            Some(p) => p.clone(),
            None => {
                confidence -= 0.15;
                Self::league_average(&ctx.team)
            }
        };
        let opponent = match &ctx.opponent_profile {
            Some(p) => p.clone(),
            None => {
                confidence -= 0.15;
                Self::league_average(ctx.opponent.as_deref().unwrap_or("opponent"))
            }
        };

        let expected = projected_total(&team, &opponent);
        let diff = expected - line;
        let diff_pct = if line > 0.0 { diff / line } else { 0.0 };
        let line_component = (diff_pct * 5.0).clamp(-1.0, 1.0);

        let combined_offense = (team.goals_for_per_game + opponent.goals_for_per_game) / 2.0;
        let offense = Self::offense_component(combined_offense);

        let combined_gaa = (team.starter_gaa.unwrap_or(AVG_GAA)
            + opponent.starter_gaa.unwrap_or(AVG_GAA))
            / 2.0;
        let goaltending = Self::goaltending_component(combined_gaa);

        let strength = weighted_mean(&[
            (line_component, 0.50),
            (offense, 0.25),
            (goaltending, 0.25),
        ]);

        let evidence = format!(
            "Expected {:.1} goals ({} vs {}) vs line {:.1}",
            expected, team.team, opponent.team, line
        );

        Ok(SignalResult::new(self.kind(), strength, confidence, evidence)
            .with_raw("expected_total", expected)
            .with_raw("combined_offense", combined_offense)
            .with_raw("combined_gaa", combined_gaa)
            .with_raw("line_component", line_component))
    }
}
