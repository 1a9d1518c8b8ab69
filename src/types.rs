//! Types for the Bitpanda price tracker

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fiat currencies the Bitpanda ticker quotes prices in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Euro (the Bitpanda default)
    #[default]
    EUR,
    /// US dollar
    USD,
    /// Swiss franc
    CHF,
    /// British pound
    GBP,
    /// Turkish lira
    TRY,
    /// Polish zloty
    PLN,
    /// Hungarian forint
    HUF,
    /// Czech koruna
    CZK,
    /// Swedish krona
    SEK,
    /// Danish krone
    DKK,
}

impl Currency {
    /// Get the currency code as it appears in the ticker payload
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::CHF => "CHF",
            Currency::GBP => "GBP",
            Currency::TRY => "TRY",
            Currency::PLN => "PLN",
            Currency::HUF => "HUF",
            Currency::CZK => "CZK",
            Currency::SEK => "SEK",
            Currency::DKK => "DKK",
        }
    }

    /// Get the Material Design icon name for this currency
    ///
    /// Currencies without a dedicated glyph share the generic currency sign.
    pub fn icon(&self) -> &'static str {
        match self {
            Currency::EUR => "mdi:currency-eur",
            Currency::USD => "mdi:currency-usd",
            Currency::CHF => "mdi:currency-fra",
            Currency::GBP => "mdi:currency-gbp",
            Currency::TRY => "mdi:currency-try",
            Currency::PLN
            | Currency::HUF
            | Currency::CZK
            | Currency::SEK
            | Currency::DKK => "mdi:currency-sign",
        }
    }

    /// Get all supported currencies, in wizard display order
    pub fn all() -> &'static [Currency] {
        &[
            Currency::EUR,
            Currency::USD,
            Currency::CHF,
            Currency::GBP,
            Currency::TRY,
            Currency::PLN,
            Currency::HUF,
            Currency::CZK,
            Currency::SEK,
            Currency::DKK,
        ]
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::all()
            .iter()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ConfigError::UnknownCurrency(s.to_string()))
    }
}

/// Refresh cadence offered by the setup wizard
///
/// Serialized as the wizard's option keys (`"1"`, `"2.5"`, `"5"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateInterval {
    /// Every minute
    #[serde(rename = "1")]
    OneMinute,
    /// Every two and a half minutes
    #[serde(rename = "2.5")]
    TwoMinutesThirty,
    /// Every five minutes (the default)
    #[default]
    #[serde(rename = "5")]
    FiveMinutes,
}

impl UpdateInterval {
    /// The cadence as a standard duration
    pub fn duration(&self) -> Duration {
        match self {
            UpdateInterval::OneMinute => Duration::from_secs(60),
            UpdateInterval::TwoMinutesThirty => Duration::from_secs(150),
            UpdateInterval::FiveMinutes => Duration::from_secs(300),
        }
    }

    /// The cadence in minutes
    pub fn minutes(&self) -> f64 {
        match self {
            UpdateInterval::OneMinute => 1.0,
            UpdateInterval::TwoMinutesThirty => 2.5,
            UpdateInterval::FiveMinutes => 5.0,
        }
    }

    /// The cadence as a chrono duration, for timestamp arithmetic
    pub fn to_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.duration().as_secs() as i64)
    }

    /// Get all offered cadences
    pub fn all() -> &'static [UpdateInterval] {
        &[
            UpdateInterval::OneMinute,
            UpdateInterval::TwoMinutesThirty,
            UpdateInterval::FiveMinutes,
        ]
    }
}

impl fmt::Display for UpdateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateInterval::OneMinute => f.write_str("1m"),
            UpdateInterval::TwoMinutesThirty => f.write_str("2.5m"),
            UpdateInterval::FiveMinutes => f.write_str("5m"),
        }
    }
}

/// Price of one symbol in the configured currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolPrice {
    /// Quoted price, absent when the upstream field was not numeric
    pub price: Option<f64>,

    /// When this value was fetched
    ///
    /// The upstream payload carries no per-symbol timestamp, so every entry
    /// of one snapshot shares the fetch completion time.
    pub last_updated: DateTime<Utc>,
}

/// One complete fetch result, immutable once stored
///
/// Snapshots replace each other wholesale; there is no partial merge. Only
/// symbols whose upstream object carries the configured currency appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    prices: HashMap<String, SymbolPrice>,
    fetched_at: DateTime<Utc>,
}

impl TickerSnapshot {
    /// Creates a snapshot from projected prices and the fetch completion time
    pub fn new(prices: HashMap<String, SymbolPrice>, fetched_at: DateTime<Utc>) -> Self {
        Self { prices, fetched_at }
    }

    /// Gets the full entry for a symbol
    pub fn get(&self, symbol: &str) -> Option<&SymbolPrice> {
        self.prices.get(symbol)
    }

    /// Gets the price for a symbol, if present and numeric
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).and_then(|p| p.price)
    }

    /// True if the snapshot carries an entry for the symbol
    pub fn contains(&self, symbol: &str) -> bool {
        self.prices.contains_key(symbol)
    }

    /// All symbols in the snapshot, sorted ascending
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.prices.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Number of symbols in the snapshot
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// True if the fetch projected no symbols at all
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// When the fetch that produced this snapshot completed
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Lifecycle of the shared refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No fetch attempted yet; sensors are not constructible
    Uninitialized,
    /// A fetch is in flight; the prior snapshot (if any) keeps serving
    Refreshing,
    /// The last fetch succeeded
    Ready,
    /// The last fetch failed; the previous snapshot keeps serving
    Degraded,
}

/// Host-facing attributes of a price sensor
#[derive(Debug, Clone, Serialize)]
pub struct SensorMetadata {
    /// When the symbol's value was fetched, absent until it appears
    pub last_update: Option<DateTime<Utc>>,
    /// Next scheduled refresh, in local time
    pub next_update: DateTime<Local>,
    /// Tracked symbol
    pub symbol: String,
    /// Configured refresh cadence
    pub update_interval: UpdateInterval,
}
