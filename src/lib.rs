pub mod backtest;
pub mod cli;
pub mod config;
pub mod domain;
pub mod edge;
pub mod error;
pub mod providers;
pub mod signals;

pub use backtest::{BacktestHarness, BacktestProp, BacktestRun, GradingReport, HistoricalProp};
pub use config::AppConfig;
pub use domain::{Direction, PriceConvention, PriceQuote, PropContext, StatType};
pub use edge::{EdgeCalculator, EdgeResult};
pub use error::{PropEdgeError, Result};
pub use providers::{
    CachedProvider, FixtureDataset, MarketQuoteProvider, OutcomeProvider, PropKey, StatProvider,
};
pub use signals::{Signal, SignalKind, SignalRegistry, SignalResult};
