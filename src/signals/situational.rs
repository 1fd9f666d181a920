//! Schedule fatigue and venue.

use super::{Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, StatType};
use crate::error::SignalError;

const BACK_TO_BACK: f64 = -0.3;
const RESTED: f64 = 0.1;
const RESTED_DAYS: u32 = 3;
const HOME: f64 = 0.05;
const AWAY: f64 = -0.03;

#[derive(Debug, Clone, Default)]
pub struct SituationalSignal;

impl Signal for SituationalSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Situational
    }

    fn calculate(
        &self,
        _player_id: Option<u64>,
        _player_name: &str,
        stat_type: StatType,
        _line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        if stat_type == StatType::GameTotal {
            return Ok(SignalResult::irrelevant(self.kind(), stat_type));
        }
        if ctx.is_back_to_back.is_none() && ctx.days_rest.is_none() && ctx.is_home.is_none() {
            return Ok(SignalResult::no_data(self.kind(), 0.4, "schedule and venue"));
        }

        let mut strength = 0.0;
        let mut notes = Vec::new();

        if ctx.is_back_to_back == Some(true) {
            strength += BACK_TO_BACK;
            notes.push("back-to-back".to_string());
        }
        if let Some(days) = ctx.days_rest {
            if days >= RESTED_DAYS {
                strength += RESTED;
                notes.push(format!("{} days rest", days));
            }
        }
        match ctx.is_home {
            Some(true) => {
                strength += HOME;
                notes.push("home".to_string());
            }
            Some(false) => {
                strength += AWAY;
                notes.push("away".to_string());
            }
            None => {}
        }

        let confidence = if ctx.is_back_to_back.is_none() && ctx.days_rest.is_none() {
            0.5
        } else {
            0.8
        };
        let evidence = if notes.is_empty() {
            "Normal schedule".to_string()
        } else {
            notes.join(", ")
        };

        Ok(SignalResult::new(self.kind(), strength, confidence, evidence)
            .with_raw("is_back_to_back", ctx.is_back_to_back)
            .with_raw("days_rest", ctx.days_rest)
            .with_raw("is_home", ctx.is_home))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::{assert_bounded, context, run};

    #[test]
    fn test_back_to_back_away() {
        let mut ctx = context(StatType::Points, 0.5);
        ctx.is_back_to_back = Some(true);
        ctx.days_rest = Some(0);
        ctx.is_home = Some(false);

        let r = run(&SituationalSignal, &ctx);
        assert!((r.strength + 0.33).abs() < 1e-9);
        assert!((r.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_rested_home() {
        let mut ctx = context(StatType::Goals, 0.5);
        ctx.is_back_to_back = Some(false);
        ctx.days_rest = Some(3);
        ctx.is_home = Some(true);

        let r = run(&SituationalSignal, &ctx);
        assert!((r.strength - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_venue_only_lowers_confidence() {
        let mut ctx = context(StatType::Goals, 0.5);
        ctx.is_home = Some(true);
        let r = run(&SituationalSignal, &ctx);
        assert_eq!(r.confidence, 0.5);
        assert_bounded(&r);
    }

    #[test]
    fn test_nothing_known() {
        let ctx = context(StatType::Goals, 0.5);
        let r = run(&SituationalSignal, &ctx);
        assert_eq!(r.strength, 0.0);
        assert!(r.confidence <= 0.4);
    }
}
