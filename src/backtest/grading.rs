//! Grading report for a finished backtest.
//!
//! Only settled props enter any denominator. Skipped and unsettled props
//! are counted but never graded.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::{Table, Tabled};

use super::prop::BacktestProp;
use crate::config::BacktestConfig;
use crate::domain::StatType;
use crate::signals::SignalKind;

/// Predictive value above which a signal earns more weight
const INCREASE_ABOVE: f64 = 0.15;
/// Predictive value below which a signal should lose weight
const DECREASE_BELOW: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeBucket {
    Negative,
    ZeroToFive,
    FiveToTen,
    TenToFifteen,
    FifteenPlus,
}

impl EdgeBucket {
    pub const ALL: [EdgeBucket; 5] = [
        EdgeBucket::Negative,
        EdgeBucket::ZeroToFive,
        EdgeBucket::FiveToTen,
        EdgeBucket::TenToFifteen,
        EdgeBucket::FifteenPlus,
    ];

    pub fn for_edge(edge_pct: f64) -> Self {
        if edge_pct < 0.0 {
            EdgeBucket::Negative
        } else if edge_pct < 5.0 {
            EdgeBucket::ZeroToFive
        } else if edge_pct < 10.0 {
            EdgeBucket::FiveToTen
        } else if edge_pct < 15.0 {
            EdgeBucket::TenToFifteen
        } else {
            EdgeBucket::FifteenPlus
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EdgeBucket::Negative => "negative",
            EdgeBucket::ZeroToFive => "0-5%",
            EdgeBucket::FiveToTen => "5-10%",
            EdgeBucket::TenToFifteen => "10-15%",
            EdgeBucket::FifteenPlus => "15%+",
        }
    }
}

/// Hit rate and return for one slice of settled props
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceStats {
    pub label: String,
    pub props: usize,
    pub hits: usize,
    pub hit_rate: Option<f64>,
    pub staked: Decimal,
    pub profit: Decimal,
    pub roi_pct: Option<f64>,
}

#[derive(Debug, Clone, Default)]
struct Tally {
    props: usize,
    hits: usize,
    staked: Decimal,
    profit: Decimal,
}

impl Tally {
    fn add(&mut self, hit: bool, stake: Decimal, profit: Decimal) {
        self.props += 1;
        if hit {
            self.hits += 1;
        }
        self.staked += stake;
        self.profit += profit;
    }

    fn finish(&self, label: impl Into<String>) -> SliceStats {
        let roi_pct = if self.staked.is_zero() {
            None
        } else {
            (self.profit / self.staked).to_f64().map(|r| r * 100.0)
        };
        SliceStats {
            label: label.into(),
            props: self.props,
            hits: self.hits,
            hit_rate: rate(self.hits, self.props),
            staked: self.staked,
            profit: self.profit,
            roi_pct,
        }
    }
}

fn rate(hits: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| hits as f64 / total as f64)
}

/// Hit counts for props where a signal leaned one way
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub props: usize,
    pub hits: usize,
    pub hit_rate: Option<f64>,
}

impl Partition {
    fn add(&mut self, hit: bool) {
        self.props += 1;
        if hit {
            self.hits += 1;
        }
        self.hit_rate = rate(self.hits, self.props);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Increase,
    Maintain,
    Decrease,
    InsufficientData,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recommendation::Increase => "increase",
            Recommendation::Maintain => "maintain",
            Recommendation::Decrease => "decrease",
            Recommendation::InsufficientData => "insufficient data",
        };
        f.write_str(s)
    }
}

/// How well one signal's lean lines up with outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalGrade {
    pub signal: SignalKind,
    pub threshold: f64,
    pub positive: Partition,
    pub negative: Partition,
    pub neutral: Partition,
    /// |positive hit rate - negative hit rate|, when both sides occurred
    pub predictive_value: Option<f64>,
    pub avg_strength_in_hits: Option<f64>,
    pub avg_strength_in_misses: Option<f64>,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingReport {
    pub total_props: usize,
    pub skipped: usize,
    pub unsettled: usize,
    pub settled: usize,
    pub overall: SliceStats,
    pub min_edge_pct: f64,
    pub at_min_edge: SliceStats,
    pub by_edge_bucket: Vec<SliceStats>,
    pub by_stat: Vec<SliceStats>,
    pub by_direction: Vec<SliceStats>,
    pub contrarian: SliceStats,
    /// Sorted by predictive value, strongest first
    pub signals: Vec<SignalGrade>,
}

impl GradingReport {
    /// Predictive values suitable for `SignalWeights::record_predictive_values`
    pub fn predictive_values(&self) -> BTreeMap<SignalKind, f64> {
        self.signals
            .iter()
            .filter_map(|g| g.predictive_value.map(|v| (g.signal, v)))
            .collect()
    }

    pub fn bucket(&self, bucket: EdgeBucket) -> Option<&SliceStats> {
        self.by_edge_bucket.iter().find(|s| s.label == bucket.label())
    }

    pub fn signal(&self, kind: SignalKind) -> Option<&SignalGrade> {
        self.signals.iter().find(|g| g.signal == kind)
    }
}

/// Flat-stake profit for a settled prop.
///
/// The payout is taken from the market probability of the side taken, which
/// is the quoted price when that side was priced.
pub fn prop_profit(prop: &BacktestProp, stake: Decimal) -> Decimal {
    let (Some(hit), Some(edge)) = (prop.hit, prop.edge.as_ref()) else {
        return Decimal::ZERO;
    };
    if !hit {
        return -stake;
    }
    let payout = 1.0 / edge.market_probability;
    Decimal::from_f64_retain(payout - 1.0)
        .map(|m| (m * stake).round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

fn signal_grade(kind: SignalKind, props: &[&BacktestProp], threshold: f64) -> SignalGrade {
    let mut positive = Partition::default();
    let mut negative = Partition::default();
    let mut neutral = Partition::default();
    let mut hit_strengths = Vec::new();
    let mut miss_strengths = Vec::new();

    for prop in props {
        let (Some(hit), Some(edge)) = (prop.hit, prop.edge.as_ref()) else {
            continue;
        };
        let Some(result) = edge.signals.get(&kind) else {
            continue;
        };
        let strength = result.strength;
        if strength > threshold {
            positive.add(hit);
        } else if strength < -threshold {
            negative.add(hit);
        } else {
            neutral.add(hit);
        }
        if hit {
            hit_strengths.push(strength);
        } else {
            miss_strengths.push(strength);
        }
    }

    let avg = |v: &[f64]| (!v.is_empty()).then(|| v.iter().sum::<f64>() / v.len() as f64);
    let predictive_value = match (positive.hit_rate, negative.hit_rate) {
        (Some(p), Some(n)) => Some((p - n).abs()),
        _ => None,
    };
    let recommendation = match predictive_value {
        None => Recommendation::InsufficientData,
        Some(v) if v > INCREASE_ABOVE => Recommendation::Increase,
        Some(v) if v < DECREASE_BELOW => Recommendation::Decrease,
        Some(_) => Recommendation::Maintain,
    };

    SignalGrade {
        signal: kind,
        threshold,
        positive,
        negative,
        neutral,
        predictive_value,
        avg_strength_in_hits: avg(&hit_strengths),
        avg_strength_in_misses: avg(&miss_strengths),
        recommendation,
    }
}

/// Grade a finished run
pub fn grade(props: &[BacktestProp], config: &BacktestConfig) -> GradingReport {
    let stake = config.stake;
    let settled: Vec<&BacktestProp> = props.iter().filter(|p| p.settled).collect();

    let mut overall = Tally::default();
    let mut at_min_edge = Tally::default();
    let mut contrarian = Tally::default();
    let mut buckets: BTreeMap<EdgeBucket, Tally> = BTreeMap::new();
    let mut stats: BTreeMap<StatType, Tally> = BTreeMap::new();
    let mut directions: BTreeMap<&'static str, Tally> = BTreeMap::new();

    for prop in &settled {
        let (Some(hit), Some(edge)) = (prop.hit, prop.edge.as_ref()) else {
            continue;
        };
        let profit = prop_profit(prop, stake);

        overall.add(hit, stake, profit);
        if edge.edge_pct >= config.min_edge_pct {
            at_min_edge.add(hit, stake, profit);
        }
        if edge.contrarian_applied {
            contrarian.add(hit, stake, profit);
        }
        buckets
            .entry(EdgeBucket::for_edge(edge.edge_pct))
            .or_default()
            .add(hit, stake, profit);
        stats
            .entry(edge.stat_type)
            .or_default()
            .add(hit, stake, profit);
        directions
            .entry(edge.direction.as_str())
            .or_default()
            .add(hit, stake, profit);
    }

    let by_edge_bucket = EdgeBucket::ALL
        .iter()
        .map(|b| buckets.get(b).cloned().unwrap_or_default().finish(b.label()))
        .collect();
    let by_stat = stats
        .iter()
        .map(|(stat, t)| t.finish(stat.as_str()))
        .collect();
    let by_direction = directions
        .iter()
        .map(|(d, t)| t.finish(*d))
        .collect();

    let mut signals: Vec<SignalGrade> = SignalKind::ALL
        .iter()
        .map(|k| signal_grade(*k, &settled, config.threshold_for(*k)))
        .collect();
    signals.sort_by(|a, b| {
        b.predictive_value
            .unwrap_or(-1.0)
            .partial_cmp(&a.predictive_value.unwrap_or(-1.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let skipped = props.iter().filter(|p| p.is_skipped()).count();
    let unsettled = props
        .iter()
        .filter(|p| p.state == super::prop::PropState::Unsettled)
        .count();

    GradingReport {
        total_props: props.len(),
        skipped,
        unsettled,
        settled: settled.len(),
        overall: overall.finish("overall"),
        min_edge_pct: config.min_edge_pct,
        at_min_edge: at_min_edge.finish(format!("edge >= {:.1}%", config.min_edge_pct)),
        by_edge_bucket,
        by_stat,
        by_direction,
        contrarian: contrarian.finish("contrarian"),
        signals,
    }
}

// =============================================================================
// Table rendering
// =============================================================================

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
struct SliceRow {
    slice: String,
    props: usize,
    hits: usize,
    hit_rate: String,
    profit: String,
    roi: String,
}

impl From<&SliceStats> for SliceRow {
    fn from(s: &SliceStats) -> Self {
        Self {
            slice: s.label.clone(),
            props: s.props,
            hits: s.hits,
            hit_rate: pct(s.hit_rate),
            profit: s.profit.to_string(),
            roi: s
                .roi_pct
                .map(|r| format!("{:+.1}%", r))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct SignalRow {
    signal: String,
    #[tabled(rename = "pos->hit")]
    positive: String,
    #[tabled(rename = "neg->hit")]
    negative: String,
    neutral: String,
    predictive: String,
    #[tabled(rename = "avg s (hit/miss)")]
    strengths: String,
    recommendation: String,
}

impl From<&SignalGrade> for SignalRow {
    fn from(g: &SignalGrade) -> Self {
        let side = |p: &Partition| format!("{} ({})", pct(p.hit_rate), p.props);
        let avg = |v: Option<f64>| {
            v.map(|x| format!("{:+.2}", x))
                .unwrap_or_else(|| "-".to_string())
        };
        Self {
            signal: g.signal.as_str().to_string(),
            positive: side(&g.positive),
            negative: side(&g.negative),
            neutral: side(&g.neutral),
            predictive: pct(g.predictive_value),
            strengths: format!(
                "{} / {}",
                avg(g.avg_strength_in_hits),
                avg(g.avg_strength_in_misses)
            ),
            recommendation: g.recommendation.to_string(),
        }
    }
}

/// Human-readable report
pub fn render_report(report: &GradingReport) -> String {
    let summary: Vec<SliceRow> = [&report.overall, &report.at_min_edge, &report.contrarian]
        .into_iter()
        .map(SliceRow::from)
        .collect();
    let buckets: Vec<SliceRow> = report.by_edge_bucket.iter().map(SliceRow::from).collect();
    let stats: Vec<SliceRow> = report.by_stat.iter().map(SliceRow::from).collect();
    let directions: Vec<SliceRow> = report.by_direction.iter().map(SliceRow::from).collect();
    let signals: Vec<SignalRow> = report.signals.iter().map(SignalRow::from).collect();

    let mut out = String::new();
    out.push_str(&format!(
        "Props: {} total, {} settled, {} unsettled, {} skipped\n\n",
        report.total_props, report.settled, report.unsettled, report.skipped
    ));
    out.push_str(&format!("{}\n\n", Table::new(summary)));
    out.push_str(&format!("By edge bucket\n{}\n\n", Table::new(buckets)));
    out.push_str(&format!("By stat\n{}\n\n", Table::new(stats)));
    out.push_str(&format!("By direction\n{}\n\n", Table::new(directions)));
    out.push_str(&format!("Signal analysis\n{}\n", Table::new(signals)));
    out
}
