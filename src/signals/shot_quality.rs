//! Shot location quality and zone deployment.

use super::{Signal, SignalKind, SignalResult};
use crate::domain::{PropContext, ShotQualityTier, StatType, ZoneDeployment};
use crate::error::SignalError;

const TIER_COMPONENT: f64 = 0.4;
const TIER_WEIGHT: f64 = 0.4;

const ELITE_HD_SHARE: f64 = 0.40;
const WEAK_HD_SHARE: f64 = 0.20;
const AVG_HD_SHARE: f64 = 0.30;
const HD_COMPONENT: f64 = 0.4;
const HD_WEIGHT: f64 = 0.3;

const ZONE_COMPONENT: f64 = 0.3;
const ZONE_WEIGHT: f64 = 0.3;

const GAIN: f64 = 1.5;

#[derive(Debug, Clone, Default)]
pub struct ShotQualitySignal;

impl ShotQualitySignal {
    fn hd_component(share: f64) -> f64 {
        if share >= ELITE_HD_SHARE {
            HD_COMPONENT
        } else if share <= WEAK_HD_SHARE {
            -HD_COMPONENT
        } else {
            ((share - AVG_HD_SHARE) / 0.10).clamp(-HD_COMPONENT, HD_COMPONENT)
        }
    }

    fn is_relevant(stat: StatType) -> bool {
        matches!(
            stat,
            StatType::Goals | StatType::ShotsOnGoal | StatType::Points
        )
    }
}

impl Signal for ShotQualitySignal {
    fn kind(&self) -> SignalKind {
        SignalKind::ShotQuality
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
        let Some(profile) = &ctx.shot_profile else {
            return Ok(SignalResult::no_data(self.kind(), 0.4, "shot profile"));
        };

        let mut notes = Vec::new();
        let mut sum = 0.0;
        let mut total_weight = 0.0;

        let tier = match profile.shot_quality {
            ShotQualityTier::High => {
                notes.push("high shot quality".to_string());
                TIER_COMPONENT
            }
            ShotQualityTier::Low => {
                notes.push("low shot quality".to_string());
                -TIER_COMPONENT
            }
            ShotQualityTier::Average => 0.0,
        };
        sum += tier;
        total_weight += TIER_WEIGHT;

        let hd = profile.high_danger_share.filter(|s| s.is_finite());
        if let Some(share) = hd {
            let c = Self::hd_component(share);
            if share >= ELITE_HD_SHARE || share <= WEAK_HD_SHARE {
                notes.push(format!("{:.0}% high-danger shots", share * 100.0));
            }
            sum += c;
            total_weight += HD_WEIGHT;
        }

        let zone = match profile.zone_deployment {
            ZoneDeployment::Offensive => {
                notes.push("offensive deployment".to_string());
                ZONE_COMPONENT
            }
            ZoneDeployment::Defensive => {
                notes.push("defensive deployment".to_string());
                -ZONE_COMPONENT
            }
            ZoneDeployment::Balanced => 0.0,
        };
        sum += zone;
        total_weight += ZONE_WEIGHT;

        let strength = sum / total_weight * GAIN;
        let quality = if strength > 0.2 {
            "favourable"
        } else if strength < -0.2 {
            "unfavourable"
        } else {
            "average"
        };
        let mut evidence = format!("Shot quality {}", quality);
        if !notes.is_empty() {
            evidence.push_str(&format!(" ({})", notes.join(", ")));
        }

        Ok(SignalResult::new(self.kind(), strength, 0.70, evidence)
            .with_raw("tier_component", tier)
            .with_raw_opt("high_danger_share", hd)
            .with_raw("zone_component", zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShotProfile;
    use crate::signals::test_support::{assert_bounded, context, run};

    #[test]
    fn test_elite_shooter() {
        let mut ctx = context(StatType::Goals, 0.5);
        ctx.shot_profile = Some(ShotProfile {
            shot_quality: ShotQualityTier::High,
            high_danger_share: Some(0.45),
            zone_deployment: ZoneDeployment::Offensive,
        });

        let r = run(&ShotQualitySignal, &ctx);
        // (0.4 + 0.4 + 0.3) / 1.0 * 1.5 -> clamped
        assert_eq!(r.strength, 1.0);
        assert_eq!(r.confidence, 0.70);
    }

    #[test]
    fn test_average_profile_is_neutral() {
        let mut ctx = context(StatType::ShotsOnGoal, 2.5);
        ctx.shot_profile = Some(ShotProfile {
            shot_quality: ShotQualityTier::Average,
            high_danger_share: Some(0.30),
            zone_deployment: ZoneDeployment::Balanced,
        });
        let r = run(&ShotQualitySignal, &ctx);
        assert!(r.strength.abs() < 1e-9);
    }

    #[test]
    fn test_defensive_low_quality() {
        let mut ctx = context(StatType::Points, 0.5);
        ctx.shot_profile = Some(ShotProfile {
            shot_quality: ShotQualityTier::Low,
            high_danger_share: None,
            zone_deployment: ZoneDeployment::Defensive,
        });
        let r = run(&ShotQualitySignal, &ctx);
        // (-0.4 - 0.3) / 0.7 * 1.5
        assert_eq!(r.strength, -1.0);
        assert_bounded(&r);
    }

    #[test]
    fn test_irrelevant_for_assists() {
        let ctx = context(StatType::Assists, 0.5);
        let r = run(&ShotQualitySignal, &ctx);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.reason(), Some(crate::signals::REASON_IRRELEVANT));
    }
}
