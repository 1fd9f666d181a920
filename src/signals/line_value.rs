//! Value vs line: how far the player's per-game average sits from the quote.

use super::{ensure_finite, Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, StatType};
use crate::error::SignalError;

/// Deviation (as a fraction of the line) that maps to full strength
const FULL_SCALE_PCT: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct LineValueSignal;

impl LineValueSignal {
    fn sample_confidence(games: u32) -> f64 {
        match games {
            g if g >= 20 => 0.90,
            g if g >= 10 => 0.80,
            g if g >= 5 => 0.65,
            _ => 0.40,
        }
    }
}

impl Signal for LineValueSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::LineValue
    }

    fn calculate(
        &self,
        _player_id: Option<u64>,
        _player_name: &str,
        stat_type: StatType,
        line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        let line = ensure_finite("line", line)?;

        // Season average first, recent window when the season line is unknown
        let recent = if stat_type == ctx.stat_type {
            ctx.recent_avg
        } else {
            None
        };
        let (avg, games, source) = match (ctx.get_season_avg(stat_type), recent) {
            (Some(avg), _) => (avg, ctx.season_games.unwrap_or(0), "Season"),
            (None, Some(avg)) => (avg, ctx.recent_games.unwrap_or(0), "Recent"),
            (None, None) => {
                return Ok(SignalResult::no_data(self.kind(), 0.3, "season and recent averages"))
            }
        };
        let avg = ensure_finite("average", avg)?;

        let pct = if line > 0.0 {
            (avg - line) / line
        } else {
            avg - line
        };
        let strength = pct / FULL_SCALE_PCT;
        let confidence = Self::sample_confidence(games);

        let evidence = format!(
            "{} avg {:.2} vs line {:.1} ({:+.0}%, {} games)",
            source,
            avg,
            line,
            pct * 100.0,
            games
        );

        Ok(SignalResult::new(self.kind(), strength, confidence, evidence)
            .with_raw("average", avg)
            .with_raw("source", source.to_lowercase())
            .with_raw("pct_diff", pct)
            .with_raw("games", games))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::{assert_bounded, context, run};

    #[test]
    fn test_far_above_line_caps_at_full_strength() {
        let mut ctx = context(StatType::Points, 0.5);
        ctx.season_avg = Some(1.2);
        ctx.season_games = Some(8);

        let r = run(&LineValueSignal, &ctx);
        assert_eq!(r.strength, 1.0);
        assert_eq!(r.confidence, 0.65);
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(LineValueSignal::sample_confidence(25), 0.90);
        assert_eq!(LineValueSignal::sample_confidence(10), 0.80);
        assert_eq!(LineValueSignal::sample_confidence(5), 0.65);
        assert_eq!(LineValueSignal::sample_confidence(2), 0.40);
    }

    #[test]
    fn test_below_line_is_negative() {
        let mut ctx = context(StatType::ShotsOnGoal, 3.5);
        ctx.season_avg = Some(2.8);
        ctx.season_games = Some(30);

        let r = run(&LineValueSignal, &ctx);
        // (2.8 - 3.5) / 3.5 = -0.2 -> -0.4
        assert!((r.strength + 0.4).abs() < 1e-9);
        assert_eq!(r.confidence, 0.90);
    }

    #[test]
    fn test_recent_avg_fallback() {
        let mut ctx = context(StatType::Assists, 0.5);
        ctx.recent_avg = Some(0.6);
        ctx.recent_games = Some(10);

        let r = run(&LineValueSignal, &ctx);
        assert!(r.strength > 0.0);
        assert_eq!(r.raw_data["source"], "recent");
    }

    #[test]
    fn test_no_data_is_neutral() {
        let ctx = context(StatType::Goals, 0.5);
        let r = run(&LineValueSignal, &ctx);
        assert_eq!(r.strength, 0.0);
        assert!(r.confidence <= 0.4);
        assert_bounded(&r);
    }

    #[test]
    fn test_nan_line_is_error() {
        let ctx = context(StatType::Goals, 0.5);
        let err = LineValueSignal
            .calculate(None, "x", StatType::Goals, f64::NAN, &ctx)
            .unwrap_err();
        assert!(matches!(err, SignalError::NonFinite { field: "line", .. }));
    }
}
