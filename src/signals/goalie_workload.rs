//! Goaltender saves projection.
//!
//! Blends five workload components into a raw strength, then applies the
//! configured output policy. With `invert_output` enabled (the default) the
//! final strength is the negation of the raw blend: graded history showed
//! the raw direction losing against saves lines.

use super::correlation::projected_total;
use super::{weighted_mean, Signal, SignalKind, SignalResult};
use crate::domain::{FormAssessment, PropContext, StatType};
use crate::error::SignalError;

const ZONE_WEIGHT: f64 = 0.25;
const TOTAL_WEIGHT: f64 = 0.15;
const VOLUME_WEIGHT: f64 = 0.30;
const FORM_WEIGHT: f64 = 0.15;
const EXPECTED_WEIGHT: f64 = 0.15;

const HIGH_ZONE_SHARE: f64 = 0.36;
const LOW_ZONE_SHARE: f64 = 0.30;
const AVG_ZONE_SHARE: f64 = 0.33;

const LEAGUE_AVG_TOTAL: f64 = 6.0;

const AVG_SHOTS: f64 = 30.0;
const HIGH_WORKLOAD_SHOTS: f64 = 34.0;
const LOW_WORKLOAD_SHOTS: f64 = 26.0;

const LEAGUE_SAVE_PCT: f64 = 0.905;
const ELITE_SAVE_PCT: f64 = 0.920;
const WEAK_SAVE_PCT: f64 = 0.890;

#[derive(Debug, Clone)]
pub struct GoalieWorkloadSignal {
    invert_output: bool,
}

impl Default for GoalieWorkloadSignal {
    fn default() -> Self {
        Self::new(true)
    }
}

impl GoalieWorkloadSignal {
    pub fn new(invert_output: bool) -> Self {
        Self { invert_output }
    }

    pub fn invert_output(&self) -> bool {
        self.invert_output
    }

    fn zone_component(share: f64) -> f64 {
        if share >= HIGH_ZONE_SHARE {
            0.5
        } else if share <= LOW_ZONE_SHARE {
            -0.5
        } else {
            ((share - AVG_ZONE_SHARE) / (HIGH_ZONE_SHARE - AVG_ZONE_SHARE) * 0.5).clamp(-0.5, 0.5)
        }
    }

    fn total_component(projected: f64) -> f64 {
        ((projected - LEAGUE_AVG_TOTAL) * 0.5).clamp(-0.5, 0.5)
    }

    fn volume_component(shots: f64) -> f64 {
        if shots >= HIGH_WORKLOAD_SHOTS {
            0.5
        } else if shots <= LOW_WORKLOAD_SHOTS {
            -0.5
        } else {
            ((shots - AVG_SHOTS) / (HIGH_WORKLOAD_SHOTS - AVG_SHOTS)).clamp(-0.5, 0.5)
        }
    }

    fn form_component(form: FormAssessment, save_pct: Option<f64>) -> f64 {
        match form {
            FormAssessment::Hot => 0.4,
            FormAssessment::Cold => -0.4,
            FormAssessment::Neutral => match save_pct {
                Some(sv) if sv >= ELITE_SAVE_PCT => 0.3,
                Some(sv) if sv <= WEAK_SAVE_PCT => -0.3,
                _ => 0.0,
            },
        }
    }

    /// Raw blend before the output policy, with the components used
    fn raw_strength(&self, line: f64, ctx: &PropContext) -> (f64, Vec<(&'static str, f64, f64)>) {
        let mut components: Vec<(&'static str, f64, f64)> = Vec::with_capacity(5);
        let opponent = ctx.opponent_profile.as_ref();

        if let Some(share) = opponent
            .and_then(|o| o.offensive_zone_share)
            .filter(|s| s.is_finite())
        {
            components.push(("zone_share", Self::zone_component(share), ZONE_WEIGHT));
        }

        if let (Some(team), Some(opp)) = (&ctx.team_profile, opponent) {
            let projected = projected_total(team, opp);
            if projected.is_finite() {
                components.push(("projected_total", Self::total_component(projected), TOTAL_WEIGHT));
            }
        }

        let opp_shots = opponent
            .and_then(|o| o.shots_for_per_game)
            .filter(|s| s.is_finite());
        if let Some(shots) = opp_shots {
            components.push(("shot_volume", Self::volume_component(shots), VOLUME_WEIGHT));
        }

        let save_pct = ctx
            .goalie_form
            .as_ref()
            .and_then(|f| f.best_save_pct())
            .filter(|s| s.is_finite());
        if let Some(form) = &ctx.goalie_form {
            components.push(("goalie_form", Self::form_component(form.form, save_pct), FORM_WEIGHT));
        }

        if let Some(shots) = opp_shots {
            if line > 0.0 {
                let expected = shots * save_pct.unwrap_or(LEAGUE_SAVE_PCT);
                let c = ((expected - line) / line * 5.0).clamp(-1.0, 1.0);
                components.push(("expected_saves", c, EXPECTED_WEIGHT));
            }
        }

        let pairs: Vec<(f64, f64)> = components.iter().map(|(_, c, w)| (*c, *w)).collect();
        (weighted_mean(&pairs), components)
    }
}

impl Signal for GoalieWorkloadSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::GoalieWorkload
    }

    fn calculate(
        &self,
        _player_id: Option<u64>,
        _player_name: &str,
        stat_type: StatType,
        line: f64,
        ctx: &PropContext,
    ) -> Result<SignalResult, SignalError> {
        if stat_type != StatType::Saves {
            return Ok(SignalResult::irrelevant(self.kind(), stat_type));
        }
        if ctx.position.map(|p| !p.is_goalie()).unwrap_or(false) {
            return Ok(SignalResult::irrelevant(self.kind(), stat_type));
        }

        let (raw, components) = self.raw_strength(line, ctx);
        if components.is_empty() {
            return Ok(SignalResult::no_data(self.kind(), 0.3, "opponent and goalie workload data"));
        }

        // Output policy: the raw direction is inverted unless configured off.
        let strength = if self.invert_output { -raw } else { raw };

        let mut confidence: f64 = 0.75;
        let opp_shots_known = components.iter().any(|(name, _, _)| *name == "shot_volume");
        if !opp_shots_known {
            confidence -= 0.15;
        }
        if ctx.goalie_form.is_none() {
            confidence -= 0.10;
        }
        let confidence = confidence.max(0.3);

        let used: Vec<String> = components
            .iter()
            .map(|(name, c, _)| format!("{} {:+.2}", name, c))
            .collect();
        let evidence = format!(
            "Workload raw {:+.2}{} [{}]",
            raw,
            if self.invert_output { " (inverted)" } else { "" },
            used.join(", ")
        );

        let mut result = SignalResult::new(self.kind(), strength, confidence, evidence)
            .with_raw("raw_strength", raw)
            .with_raw("inverted", self.invert_output);
        for (name, c, _) in &components {
            result = result.with_raw(name, *c);
        }
        Ok(result)
    }
}
