//! Deployment / opportunity: even-strength line, power-play unit, ice time.

use super::{Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, StatType};
use crate::error::SignalError;

/// Opportunity score of a second-line player with no power-play time
const NEUTRAL_OPPORTUNITY: f64 = 0.7;
/// Opportunity distance from neutral that maps to full strength
const OPPORTUNITY_SCALE: f64 = 0.6;
const MAX_OPPORTUNITY: f64 = 1.5;

#[derive(Debug, Clone, Default)]
pub struct UsageSignal;

impl UsageSignal {
    fn line_score(line_number: u8) -> f64 {
        match line_number {
            1 => 1.0,
            2 => 0.7,
            3 => 0.4,
            _ => 0.15,
        }
    }

    fn pp_bonus(pp_unit: Option<u8>) -> f64 {
        match pp_unit {
            Some(1) => 0.3,
            Some(2) => 0.15,
            _ => 0.0,
        }
    }

    fn toi_adjustment(toi: f64) -> f64 {
        if toi >= 22.0 {
            0.2
        } else if toi >= 15.0 {
            0.1
        } else if toi < 12.0 {
            -0.2
        } else {
            0.0
        }
    }

    fn is_relevant(stat: StatType) -> bool {
        !matches!(stat, StatType::Saves | StatType::GameTotal)
    }
}

impl Signal for UsageSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Usage
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
        let Some(line_number) = ctx.line_number else {
            return Ok(SignalResult::no_data(self.kind(), 0.4, "line deployment"));
        };

        let line_score = Self::line_score(line_number);
        let pp_bonus = Self::pp_bonus(ctx.pp_unit);
        let toi = ctx.avg_toi_minutes.filter(|t| t.is_finite());
        let toi_adj = toi.map(Self::toi_adjustment).unwrap_or(0.0);

        let opportunity = (line_score + pp_bonus + toi_adj).clamp(0.0, MAX_OPPORTUNITY);
        let strength = (opportunity - NEUTRAL_OPPORTUNITY) / OPPORTUNITY_SCALE;

        let mut confidence: f64 = 0.85;
        if toi.is_none() {
            confidence -= 0.15;
        }
        if ctx.pp_unit.is_none() {
            confidence -= 0.1;
        }

        let unit = if ctx.is_defenseman() { "pair" } else { "line" };
        let mut evidence = format!("{} {}", ordinal(line_number), unit);
        match ctx.pp_unit {
            Some(0) => evidence.push_str(", no PP time"),
            Some(u) => evidence.push_str(&format!(", PP{}", u)),
            None => {}
        }
        if let Some(t) = toi {
            evidence.push_str(&format!(", {:.1} min TOI", t));
        }

        Ok(SignalResult::new(self.kind(), strength, confidence, evidence)
            .with_raw("line_number", line_number)
            .with_raw("opportunity", opportunity)
            .with_raw("pp_bonus", pp_bonus)
            .with_raw("toi_adjustment", toi_adj))
    }
}

fn ordinal(n: u8) -> String {
    let suffix = match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::{assert_bounded, context, run};

    #[test]
    fn test_top_line_pp1_is_strong_over() {
        let mut ctx = context(StatType::Points, 0.5);
        ctx.line_number = Some(1);
        ctx.pp_unit = Some(1);
        ctx.avg_toi_minutes = Some(22.5);

        let r = run(&UsageSignal, &ctx);
        assert_eq!(r.strength, 1.0);
        assert!((r.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_second_line_no_pp_is_neutral() {
        let mut ctx = context(StatType::Points, 0.5);
        ctx.line_number = Some(2);
        ctx.pp_unit = Some(0);
        ctx.avg_toi_minutes = Some(13.0);

        let r = run(&UsageSignal, &ctx);
        assert!(r.strength.abs() < 1e-9);
    }

    #[test]
    fn test_fourth_line_limited_minutes_is_under() {
        let mut ctx = context(StatType::ShotsOnGoal, 1.5);
        ctx.line_number = Some(4);
        ctx.pp_unit = Some(0);
        ctx.avg_toi_minutes = Some(9.0);

        let r = run(&UsageSignal, &ctx);
        assert_eq!(r.strength, -1.0);
        assert_bounded(&r);
    }

    #[test]
    fn test_irrelevant_for_saves() {
        let mut ctx = context(StatType::Saves, 25.5);
        ctx.line_number = Some(1);
        let r = run(&UsageSignal, &ctx);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.strength, 0.0);
    }

    #[test]
    fn test_unknown_deployment_is_no_data() {
        let ctx = context(StatType::Points, 0.5);
        let r = run(&UsageSignal, &ctx);
        assert_eq!(r.confidence, 0.4);
    }
}
