//! Recent form vs season form.

use super::{ensure_finite, Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, StatType, TrendDirection};
use crate::error::SignalError;

/// Recent-vs-season change that maps to full strength
const FULL_SCALE_PCT: f64 = 0.3;
const BASE_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Default)]
pub struct TrendSignal;

impl Signal for TrendSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Trend
    }

    fn calculate(
        &self,
        _player_id: Option<u64>,
        _player_name: &str,
        stat_type: StatType,
        _line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        let same_stat = stat_type == ctx.stat_type;
        let recent = if same_stat { ctx.recent_avg } else { None };
        let season = ctx.get_season_avg(stat_type);

        let pct = match (recent, season) {
            (Some(recent), Some(season)) => {
                let recent = ensure_finite("recent_avg", recent)?;
                let season = ensure_finite("season_avg", season)?;
                if season > 0.0 {
                    (recent - season) / season
                } else {
                    recent - season
                }
            }
            _ => match ctx.trend_pct.filter(|_| same_stat) {
                Some(pct) => ensure_finite("trend_pct", pct)?,
                None => {
                    return Ok(SignalResult::no_data(self.kind(), 0.3, "recent or season average"))
                }
            },
        };

        let strength = pct / FULL_SCALE_PCT;

        let mut confidence = BASE_CONFIDENCE;
        let streak = ctx.point_streak.unwrap_or(0);
        if streak >= 5 {
            confidence += 0.15;
        } else if streak >= 3 {
            confidence += 0.08;
        }
        if ctx.recent_games.map(|g| g < 5).unwrap_or(true) {
            confidence -= 0.2;
        }
        let confidence = confidence.clamp(0.3, 0.95);

        let label = match ctx.trend_direction {
            Some(TrendDirection::Hot) => "hot",
            Some(TrendDirection::Cold) => "cold",
            _ if pct > 0.1 => "trending up",
            _ if pct < -0.1 => "trending down",
            _ => "steady",
        };
        let mut evidence = format!("{} ({:+.0}% vs season)", label, pct * 100.0);
        if streak >= 3 {
            evidence.push_str(&format!(", {}-game point streak", streak));
        }

        Ok(SignalResult::new(self.kind(), strength, confidence, evidence)
            .with_raw("trend_pct", pct)
            .with_raw_opt("recent_avg", recent)
            .with_raw_opt("season_avg", season)
            .with_raw("point_streak", streak))
    }
}
