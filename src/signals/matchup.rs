//! Opposing goaltender and team defence quality.

use super::{weighted_mean, Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, StatType};
use crate::error::SignalError;

const LEAGUE_AVG_SAVE_PCT: f64 = 0.905;
const WEAK_SAVE_PCT: f64 = 0.890;
const ELITE_SAVE_PCT: f64 = 0.915;
/// Save-pct gap from league average that maps to one unit
const SAVE_PCT_SCALE: f64 = 0.025;
const SAVE_PCT_WEIGHT: f64 = 0.5;

const LEAGUE_AVG_GAA: f64 = 2.90;
const WEAK_GAA: f64 = 3.5;
const ELITE_GAA: f64 = 2.2;
const GAA_SCALE: f64 = 0.6;
const GAA_WEIGHT: f64 = 0.3;

const GAIN: f64 = 1.5;

#[derive(Debug, Clone, Default)]
pub struct MatchupSignal;

impl MatchupSignal {
    /// Full +weight below the weak threshold, full -weight above elite,
    /// linear around the league average in between
    fn save_pct_component(sv: f64) -> f64 {
        if sv < WEAK_SAVE_PCT {
            SAVE_PCT_WEIGHT
        } else if sv > ELITE_SAVE_PCT {
            -SAVE_PCT_WEIGHT
        } else {
            ((LEAGUE_AVG_SAVE_PCT - sv) / SAVE_PCT_SCALE).clamp(-SAVE_PCT_WEIGHT, SAVE_PCT_WEIGHT)
        }
    }

    fn gaa_component(gaa: f64) -> f64 {
        if gaa > WEAK_GAA {
            GAA_WEIGHT
        } else if gaa < ELITE_GAA {
            -GAA_WEIGHT
        } else {
            ((gaa - LEAGUE_AVG_GAA) / GAA_SCALE).clamp(-GAA_WEIGHT, GAA_WEIGHT)
        }
    }

    fn is_relevant(stat: StatType) -> bool {
        stat.is_skater_scoring() || stat == StatType::ShotsOnGoal
    }
}

impl Signal for MatchupSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Matchup
    }

    fn calculate(
        &self,
        _player_id: Option<u64>,
        _player_name: &str,
        stat_type: StatType,
        _line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        if !Self::is_relevant(stat_type) {
            return Ok(SignalResult::irrelevant(self.kind(), stat_type));
        }

        let sv = ctx.opposing_save_pct.filter(|v| v.is_finite());
        let gaa = ctx.opposing_goals_against_rate.filter(|v| v.is_finite());
        if sv.is_none() && gaa.is_none() {
            return Ok(SignalResult::no_data(self.kind(), 0.4, "opponent save pct and GAA"));
        }

        // Components are already scaled to their weight, so the mean of
        // component/weight pairs is Σc / Σw.
        let mut components = Vec::with_capacity(2);
        let mut notes = Vec::new();
        if let Some(sv) = sv {
            let c = Self::save_pct_component(sv);
            components.push((c / SAVE_PCT_WEIGHT, SAVE_PCT_WEIGHT));
            notes.push(format!("opp SV% {:.3}", sv));
        }
        if let Some(gaa) = gaa {
            let c = Self::gaa_component(gaa);
            components.push((c / GAA_WEIGHT, GAA_WEIGHT));
            notes.push(format!("{:.2} GA/game", gaa));
        }
        let combined = weighted_mean(&components);
        let strength = combined * GAIN;

        let mut confidence: f64 = if components.len() == 2 { 0.85 } else { 0.65 };
        if ctx.opposing_goalie_confirmed == Some(false) {
            confidence -= 0.1;
            notes.push("goalie unconfirmed".to_string());
        }

        let who = ctx
            .opposing_goalie_name
            .as_deref()
            .unwrap_or("opposing goalie");
        let quality = if strength > 0.2 {
            "weak"
        } else if strength < -0.2 {
            "strong"
        } else {
            "average"
        };
        let evidence = format!("{} matchup vs {} ({})", quality, who, notes.join(", "));

        Ok(SignalResult::new(self.kind(), strength, confidence, evidence)
            .with_raw_opt("save_pct", sv)
            .with_raw_opt("goals_against_rate", gaa)
            .with_raw("combined", combined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::{assert_bounded, context, run};

    #[test]
    fn test_weak_goalie_favours_over() {
        let mut ctx = context(StatType::Goals, 0.5);
        ctx.opposing_save_pct = Some(0.880);
        ctx.opposing_goals_against_rate = Some(3.8);

        let r = run(&MatchupSignal, &ctx);
        // both components at their maximum -> 1.0 * 1.5, clamped
        assert_eq!(r.strength, 1.0);
        assert!((r.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_elite_goalie_favours_under() {
        let mut ctx = context(StatType::Points, 0.5);
        ctx.opposing_save_pct = Some(0.925);
        ctx.opposing_goals_against_rate = Some(2.0);

        let r = run(&MatchupSignal, &ctx);
        assert_eq!(r.strength, -1.0);
    }

    #[test]
    fn test_league_average_is_neutral() {
        assert!(MatchupSignal::save_pct_component(0.905).abs() < 1e-9);
        assert!(MatchupSignal::gaa_component(2.90).abs() < 1e-9);
        assert!((MatchupSignal::save_pct_component(0.890) - 0.5).abs() < 1e-9);
        assert!((MatchupSignal::gaa_component(2.2) + 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_save_pct_curve_around_league_average() {
        // 0.900 is 0.005 below average -> +0.2
        assert!((MatchupSignal::save_pct_component(0.900) - 0.2).abs() < 1e-9);
        // At the elite threshold the linear part still applies
        assert!((MatchupSignal::save_pct_component(0.915) + 0.4).abs() < 1e-9);
        assert_eq!(MatchupSignal::save_pct_component(0.916), -0.5);
        assert_eq!(MatchupSignal::save_pct_component(0.885), 0.5);
        // 3.20 GA/game is 0.3 above average -> +0.3 / 0.6 = +0.5, capped at 0.3
        assert!((MatchupSignal::gaa_component(3.20) - 0.3).abs() < 1e-9);
        assert!((MatchupSignal::gaa_component(3.05) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_partial_and_unconfirmed_lower_confidence() {
        let mut ctx = context(StatType::Points, 0.5);
        ctx.opposing_save_pct = Some(0.900);
        ctx.opposing_goalie_confirmed = Some(false);

        let r = run(&MatchupSignal, &ctx);
        assert!((r.confidence - 0.55).abs() < 1e-9);
        assert_bounded(&r);
    }

    #[test]
    fn test_irrelevant_for_game_total() {
        let ctx = context(StatType::GameTotal, 6.5);
        let r = run(&MatchupSignal, &ctx);
        assert_eq!(r.confidence, 0.0);
    }
}
