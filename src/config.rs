use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{PriceConvention, StatType};
use crate::signals::SignalKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub weights: SignalWeights,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub contrarian: ContrarianConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prior probability before any signal moves it (e.g., 0.5)
    pub base_probability: f64,
    /// Log-odds added per unit of blended strength (1.5 moves 0.5 to ~0.82 at full strength)
    pub sensitivity_gain: f64,
    /// Margin added when estimating an unquoted side (e.g., 0.05 = 5%)
    pub vig_margin: f64,
    /// |strength| a signal needs to count as agreeing or opposing
    pub reason_threshold: f64,
    pub max_supporting_reasons: usize,
    pub max_risk_factors: usize,
    /// Minimum edge (percentage points) for `has_edge` checks
    pub min_edge_pct: f64,
    /// Price convention per market, keyed by stat or market key
    /// (unlisted markets are American)
    pub markets: BTreeMap<String, PriceConvention>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_probability: 0.5,
            sensitivity_gain: 1.5,
            vig_margin: 0.05,
            reason_threshold: 0.1,
            max_supporting_reasons: 3,
            max_risk_factors: 2,
            min_edge_pct: 5.0,
            markets: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if !(self.base_probability > 0.0 && self.base_probability < 1.0) {
            errors.push("engine.base_probability must be between 0 and 1".to_string());
        }
        if !self.sensitivity_gain.is_finite() {
            errors.push("engine.sensitivity_gain must be finite".to_string());
        }
        if !(self.vig_margin >= 0.0 && self.vig_margin < 0.5) {
            errors.push("engine.vig_margin must be in [0, 0.5)".to_string());
        }
        if !(self.reason_threshold >= 0.0 && self.reason_threshold < 1.0) {
            errors.push("engine.reason_threshold must be in [0, 1)".to_string());
        }
        if let Err(e) = self.market_conventions() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve market keys to stat types
    pub fn market_conventions(&self) -> Result<BTreeMap<StatType, PriceConvention>, String> {
        let mut resolved = BTreeMap::new();
        for (key, convention) in &self.markets {
            let stat = key
                .parse::<StatType>()
                .map_err(|_| format!("engine.markets: unknown stat type '{}'", key))?;
            resolved.insert(stat, *convention);
        }
        Ok(resolved)
    }
}

// ============================================================================
// Signal weights
// ============================================================================

/// Weight and measured value for one signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalWeight {
    pub weight: f64,
    /// |hit rate when positive - hit rate when negative| from the last grading run
    #[serde(default)]
    pub measured_predictive_value: Option<f64>,
}

impl SignalWeight {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            measured_predictive_value: None,
        }
    }
}

/// Versioned blend weights with the analysis they came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub version: String,
    /// Date of the grading run that justified these weights
    pub analysis_date: Option<NaiveDate>,
    /// Number of settled props in that run
    pub sample_size: Option<u64>,
    pub notes: Option<String>,
    /// Keyed by signal name; signals not listed get weight 0
    pub signals: BTreeMap<String, SignalWeight>,
}

impl Default for SignalWeights {
    fn default() -> Self {
        let table = [
            (SignalKind::LineValue, 0.35),
            (SignalKind::Trend, 0.15),
            (SignalKind::Usage, 0.10),
            (SignalKind::Matchup, 0.15),
            (SignalKind::Situational, 0.15),
            (SignalKind::Correlation, 0.10),
            (SignalKind::ShotQuality, 0.10),
            (SignalKind::GoalieWorkload, 0.10),
            (SignalKind::GameTotals, 0.10),
        ];
        Self {
            version: "v3".to_string(),
            analysis_date: NaiveDate::from_ymd_opt(2025, 12, 18),
            sample_size: Some(42_377),
            notes: Some("Gain 1.5 kept: best overall hit rate across tested gains".to_string()),
            signals: table
                .iter()
                .map(|(kind, w)| (kind.as_str().to_string(), SignalWeight::new(*w)))
                .collect(),
        }
    }
}

impl SignalWeights {
    /// Weight 1 for `kind`, 0 for everything else
    pub fn single(kind: SignalKind) -> Self {
        let mut signals = BTreeMap::new();
        signals.insert(kind.as_str().to_string(), SignalWeight::new(1.0));
        Self {
            version: format!("single-{}", kind),
            analysis_date: None,
            sample_size: None,
            notes: None,
            signals,
        }
    }

    /// Validated weight per signal kind
    pub fn weight_table(&self) -> Result<BTreeMap<SignalKind, f64>, Vec<String>> {
        let mut errors = Vec::new();
        let mut table: BTreeMap<SignalKind, f64> =
            SignalKind::ALL.iter().map(|k| (*k, 0.0)).collect();

        for (name, entry) in &self.signals {
            match name.parse::<SignalKind>() {
                Ok(kind) => {
                    if !entry.weight.is_finite() || entry.weight < 0.0 {
                        errors.push(format!(
                            "weights.signals.{}: weight must be finite and >= 0, got {}",
                            name, entry.weight
                        ));
                    } else {
                        table.insert(kind, entry.weight);
                    }
                }
                Err(_) => errors.push(format!("weights.signals: unknown signal '{}'", name)),
            }
        }

        if errors.is_empty() && table.values().all(|w| *w == 0.0) {
            errors.push("weights.signals: at least one weight must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(table)
        } else {
            Err(errors)
        }
    }

    /// Record a grading run's predictive values against the current weights
    pub fn record_predictive_values(&mut self, values: &BTreeMap<SignalKind, f64>) {
        for (kind, value) in values {
            self.signals
                .entry(kind.as_str().to_string())
                .or_insert_with(|| SignalWeight::new(0.0))
                .measured_predictive_value = Some(*value);
        }
    }

    /// These weights annotated with one grading run's measurements.
    /// The weights themselves are left as they are.
    pub fn recorded(
        &self,
        values: &BTreeMap<SignalKind, f64>,
        analysis_date: NaiveDate,
        sample_size: u64,
    ) -> Self {
        let mut weights = self.clone();
        weights.record_predictive_values(values);
        weights.analysis_date = Some(analysis_date);
        weights.sample_size = Some(sample_size);
        weights
    }
}

// ============================================================================
// Per-signal options
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    pub goalie_workload: GoalieWorkloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalieWorkloadConfig {
    /// Negate the blended workload strength before it reaches the calculator
    pub invert_output: bool,
}

impl Default for GoalieWorkloadConfig {
    fn default() -> Self {
        Self {
            invert_output: true,
        }
    }
}

// ============================================================================
// Contrarian fade
// ============================================================================

/// Flip the selected side when its edge is implausibly large
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrarianConfig {
    pub enabled: bool,
    /// Edge (percentage points) above which any stat is faded
    pub default_threshold: Option<f64>,
    /// Per-stat thresholds, keyed by stat name
    pub stat_thresholds: BTreeMap<String, f64>,
}

impl ContrarianConfig {
    /// Thresholds from graded November-December history
    pub fn backtested() -> Self {
        let stat_thresholds = [
            (StatType::Goals, 15.0),
            (StatType::Saves, 5.0),
            (StatType::Assists, 5.0),
            (StatType::Points, 15.0),
            (StatType::ShotsOnGoal, 10.0),
        ]
        .iter()
        .map(|(stat, t)| (stat.as_str().to_string(), *t))
        .collect();
        Self {
            enabled: true,
            default_threshold: None,
            stat_thresholds,
        }
    }

    /// Resolve keys to stat types
    pub fn resolved_thresholds(&self) -> Result<BTreeMap<StatType, f64>, String> {
        let mut resolved = BTreeMap::new();
        for (key, threshold) in &self.stat_thresholds {
            let stat = key
                .parse::<StatType>()
                .map_err(|_| format!("contrarian.stat_thresholds: unknown stat type '{}'", key))?;
            if !threshold.is_finite() {
                return Err(format!("contrarian.stat_thresholds.{}: must be finite", key));
            }
            resolved.insert(stat, *threshold);
        }
        Ok(resolved)
    }
}

// ============================================================================
// Backtest
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Games in the "recent" window
    pub recent_window: usize,
    /// Prior games required before a prop is scored
    pub min_prior_games: usize,
    /// Game-log entries requested per player
    pub game_log_depth: usize,
    /// |strength| that splits positive / negative / neutral in grading
    pub predictive_threshold: f64,
    /// Per-signal overrides of `predictive_threshold`, keyed by signal name
    pub signal_thresholds: BTreeMap<String, f64>,
    /// Flat stake per graded prop
    pub stake: Decimal,
    /// Dates processed concurrently
    pub max_concurrent_dates: usize,
    /// Edge cutoff for the "at min edge" summary line
    pub min_edge_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            recent_window: 10,
            min_prior_games: 3,
            game_log_depth: 50,
            predictive_threshold: 0.05,
            signal_thresholds: BTreeMap::new(),
            stake: dec!(100),
            max_concurrent_dates: 4,
            min_edge_pct: 5.0,
        }
    }
}

impl BacktestConfig {
    /// Grading threshold for one signal (override or global)
    pub fn threshold_for(&self, kind: SignalKind) -> f64 {
        self.signal_thresholds
            .get(kind.as_str())
            .copied()
            .unwrap_or(self.predictive_threshold)
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON formatted logs
    pub json: bool,
    /// Directory for the daily rolling log file (PROPEDGE_LOG_DIR wins)
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/backtest.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("PROPEDGE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (PROPEDGE_ENGINE__VIG_MARGIN, etc.)
            .add_source(
                Environment::with_prefix("PROPEDGE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.engine.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.weights.weight_table() {
            errors.append(&mut e);
        }

        if let Err(e) = self.contrarian.resolved_thresholds() {
            errors.push(e);
        }
        if let Some(t) = self.contrarian.default_threshold {
            if !t.is_finite() {
                errors.push("contrarian.default_threshold must be finite".to_string());
            }
        }

        let backtest = &self.backtest;
        if backtest.recent_window == 0 {
            errors.push("backtest.recent_window must be positive".to_string());
        }
        if backtest.max_concurrent_dates == 0 {
            errors.push("backtest.max_concurrent_dates must be positive".to_string());
        }
        if backtest.stake <= Decimal::ZERO {
            errors.push("backtest.stake must be positive".to_string());
        }
        if !(backtest.predictive_threshold >= 0.0 && backtest.predictive_threshold < 1.0) {
            errors.push("backtest.predictive_threshold must be in [0, 1)".to_string());
        }
        for (name, t) in &backtest.signal_thresholds {
            if name.parse::<SignalKind>().is_err() {
                errors.push(format!("backtest.signal_thresholds: unknown signal '{}'", name));
            } else if !(*t >= 0.0 && *t < 1.0) {
                errors.push(format!("backtest.signal_thresholds.{} must be in [0, 1)", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
