//! Human-readable justification for a selected side.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::Direction;
use crate::signals::{SignalKind, SignalResult};

pub const NO_STRONG_SIGNALS: &str = "No strong signals detected";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reasons {
    pub primary_reason: String,
    pub supporting_reasons: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Rank signals by |strength| x confidence and split them into agreeing
/// and opposing evidence for `direction`.
pub fn build_reasons(
    signals: &BTreeMap<SignalKind, SignalResult>,
    direction: Direction,
    threshold: f64,
    max_supporting: usize,
    max_risks: usize,
) -> Reasons {
    let mut ranked: Vec<&SignalResult> = signals.values().collect();
    ranked.sort_by(|a, b| b.impact().partial_cmp(&a.impact()).unwrap_or(Ordering::Equal));

    let mut primary: Option<String> = None;
    let mut supporting = Vec::new();
    let mut risks = Vec::new();

    for result in ranked {
        let aligned = result.strength * direction.sign();
        if aligned > threshold {
            if primary.is_none() {
                primary = Some(result.evidence.clone());
            } else if supporting.len() < max_supporting {
                supporting.push(result.evidence.clone());
            }
        } else if aligned < -threshold && risks.len() < max_risks {
            risks.push(format!("{}: {}", result.signal.display_name(), result.evidence));
        }
    }

    Reasons {
        primary_reason: primary.unwrap_or_else(|| NO_STRONG_SIGNALS.to_string()),
        supporting_reasons: supporting,
        risk_factors: risks,
    }
}
