//! Error types for the Bitpanda price tracker

use thiserror::Error;

/// Errors that can occur when fetching the ticker
#[derive(Debug, Error)]
pub enum TickerError {
    /// Transport failure or timeout talking to the API
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the API
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// Response body did not parse as the expected JSON shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by the update coordinator
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The first priming fetch produced no usable data
    #[error("no ticker data received for {currency}")]
    NotReady {
        /// Currency the coordinator was configured with
        currency: String,
    },

    /// A refresh cycle failed
    #[error("update failed: {0}")]
    UpdateFailed(#[source] TickerError),
}

/// Errors in the tracker configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No symbols were selected
    #[error("no symbols configured")]
    NoSymbols,

    /// Currency code not offered by the ticker
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Symbol not listed by the ticker for the configured currency
    #[error("symbol {symbol} is not listed for {currency}")]
    UnknownSymbol {
        /// Offending symbol
        symbol: String,
        /// Currency it was checked against
        currency: String,
    },
}

/// Errors that abort entity setup for a configuration attempt
#[derive(Debug, Error)]
pub enum SetupError {
    /// The configuration itself is invalid
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Priming the coordinator failed
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}
