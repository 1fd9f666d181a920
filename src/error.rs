use thiserror::Error;

/// Main error type for the edge engine
#[derive(Error, Debug)]
pub enum PropEdgeError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown stat type: {0}")]
    InvalidStatType(String),

    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    // Collaborator errors
    #[error("Provider failure: {provider} - {reason}")]
    Provider { provider: String, reason: String },

    // Backtest lifecycle errors
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Settlement conflict for {prop}: already settled with {existing:?}, got {incoming:?}")]
    SettlementConflict {
        prop: String,
        existing: Option<f64>,
        incoming: Option<f64>,
    },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PropEdgeError {
    pub fn provider(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for PropEdgeError
pub type Result<T> = std::result::Result<T, PropEdgeError>;

/// Unexpected failure inside a single signal.
///
/// Missing data is never an error; signals report it as a neutral,
/// low-confidence result. This type covers inputs a signal cannot reason
/// about at all, which the calculator downgrades to a neutral opinion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("Non-finite input for {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
}
