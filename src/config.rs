//! Tracker configuration
//!
//! Mirrors what the host platform's setup wizard collects and persists:
//! quote currency, tracked symbols and refresh cadence. The wizard itself
//! is the embedder's business; this module only carries and validates the
//! resulting values.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SYMBOLS;
use crate::discovery;
use crate::error::ConfigError;
use crate::fetcher::TickerFetcher;
use crate::types::{Currency, UpdateInterval};

/// Configuration of one tracker instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Quote currency for every tracked symbol
    #[serde(default)]
    pub currency: Currency,

    /// Symbols to expose as sensors
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Refresh cadence
    #[serde(default)]
    pub update_interval: UpdateInterval,
}

fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            symbols: default_symbols(),
            update_interval: UpdateInterval::default(),
        }
    }
}

impl TrackerConfig {
    /// Shape-level validation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        Ok(())
    }

    /// Configured symbols with duplicates removed, original order kept
    pub fn unique_symbols(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.symbols
            .iter()
            .filter(|symbol| seen.insert(symbol.as_str()))
            .cloned()
            .collect()
    }

    /// Checks every configured symbol against the live ticker
    ///
    /// This is the wizard's validation step: the selection must come from
    /// what the ticker actually lists for the chosen currency.
    pub async fn validate_against(
        &self,
        fetcher: &dyn TickerFetcher,
    ) -> Result<(), ConfigError> {
        self.validate()?;

        let listed = discovery::list_symbols(fetcher, self.currency).await;
        for symbol in self.unique_symbols() {
            if listed.binary_search(&symbol).is_err() {
                return Err(ConfigError::UnknownSymbol {
                    symbol,
                    currency: self.currency.code().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::mock::MockFetcher;

    #[test]
    fn default_tracks_best_in_eur_every_five_minutes() {
        let config = TrackerConfig::default();
        assert_eq!(config.currency, Currency::EUR);
        assert_eq!(config.symbols, vec!["BEST"]);
        assert_eq!(config.update_interval, UpdateInterval::FiveMinutes);
        config.validate().unwrap();
    }

    #[test]
    fn empty_symbol_set_is_rejected() {
        let config = TrackerConfig { symbols: Vec::new(), ..TrackerConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::NoSymbols));
    }

    #[test]
    fn duplicate_symbols_collapse_in_order() {
        let config = TrackerConfig {
            symbols: ["BTC", "BEST", "BTC"].iter().map(|s| s.to_string()).collect(),
            ..TrackerConfig::default()
        };
        assert_eq!(config.unique_symbols(), vec!["BTC", "BEST"]);
    }

    #[test]
    fn wizard_persisted_values_deserialize() {
        let config: TrackerConfig = serde_json::from_str(
            r#"{"currency": "USD", "symbols": ["BTC", "ETH"], "update_interval": "2.5"}"#,
        )
        .unwrap();
        assert_eq!(config.currency, Currency::USD);
        assert_eq!(config.update_interval, UpdateInterval::TwoMinutesThirty);
    }

    #[tokio::test]
    async fn validation_against_the_ticker_names_the_missing_symbol() {
        let fetcher = MockFetcher::new();
        fetcher.push_prices(&[("BEST", 0.55), ("BTC", 50000.0)]);
        fetcher.push_prices(&[("BEST", 0.55)]);

        let config = TrackerConfig {
            symbols: vec!["BEST".to_string(), "BTC".to_string()],
            ..TrackerConfig::default()
        };
        config.validate_against(&fetcher).await.unwrap();

        let err = config.validate_against(&fetcher).await.unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownSymbol { symbol: "BTC".to_string(), currency: "EUR".to_string() }
        );
    }
}
