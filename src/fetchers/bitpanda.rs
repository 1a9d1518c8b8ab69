//! Bitpanda ticker fetcher implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::constants::{BITPANDA_API_URL, REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::TickerError;
use crate::fetcher::TickerFetcher;
use crate::types::{Currency, SymbolPrice, TickerSnapshot};

/// Bitpanda ticker response
///
/// A JSON object keyed by symbol, each value an object keyed by currency
/// code. The live API serves prices as numeric strings.
#[derive(Debug, Deserialize)]
struct TickerResponse(HashMap<String, HashMap<String, Value>>);

/// Fetcher for the public Bitpanda ticker endpoint
pub struct BitpandaFetcher {
    client: Client,
}

impl BitpandaFetcher {
    /// Creates a new Bitpanda fetcher
    pub fn new() -> Result<Self, TickerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(TickerError::Network)?;

        Ok(Self { client })
    }

    /// Projects the raw ticker down to the symbols quoting the currency
    ///
    /// A symbol is included iff its object carries a field named exactly as
    /// the currency code. Every entry is stamped with the fetch completion
    /// time; the payload has no per-symbol timestamp.
    fn parse_response(
        response: TickerResponse,
        currency: Currency,
        fetched_at: DateTime<Utc>,
    ) -> HashMap<String, SymbolPrice> {
        let mut result = HashMap::new();

        for (symbol, quotes) in response.0 {
            if let Some(value) = quotes.get(currency.code()) {
                result.insert(
                    symbol,
                    SymbolPrice {
                        price: parse_price(value),
                        last_updated: fetched_at,
                    },
                );
            }
        }

        result
    }
}

impl Default for BitpandaFetcher {
    fn default() -> Self {
        Self::new().expect("Failed to create Bitpanda fetcher")
    }
}

#[async_trait]
impl TickerFetcher for BitpandaFetcher {
    async fn fetch_ticker(&self, currency: Currency) -> Result<TickerSnapshot, TickerError> {
        tracing::debug!(currency = %currency, "Fetching ticker from Bitpanda: {}", BITPANDA_API_URL);

        let response = self
            .client
            .get(BITPANDA_API_URL)
            .send()
            .await
            .map_err(TickerError::Network)?;

        if !response.status().is_success() {
            return Err(TickerError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let response_text = response.text().await.map_err(TickerError::Network)?;

        let ticker: TickerResponse = serde_json::from_str(&response_text).map_err(|e| {
            TickerError::InvalidResponse(format!("Failed to parse Bitpanda response: {}", e))
        })?;

        let fetched_at = Utc::now();
        let prices = Self::parse_response(ticker, currency, fetched_at);

        tracing::debug!(
            count = prices.len(),
            currency = %currency,
            "Successfully fetched ticker from Bitpanda"
        );

        Ok(TickerSnapshot::new(prices, fetched_at))
    }

    fn source_name(&self) -> &'static str {
        "bitpanda"
    }
}

/// Accepts JSON numbers and the numeric strings the live API serves
fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_from(value: Value) -> TickerResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn projection_keeps_exactly_the_symbols_quoting_the_currency() {
        let raw = response_from(json!({
            "BTC": {"EUR": "50000.0", "USD": "54000.0"},
            "BEST": {"EUR": "0.55"},
            "OBSCURE": {"USD": "1.23"},
        }));

        let now = Utc::now();
        let prices = BitpandaFetcher::parse_response(raw, Currency::EUR, now);

        let mut symbols: Vec<&str> = prices.keys().map(String::as_str).collect();
        symbols.sort();
        assert_eq!(symbols, vec!["BEST", "BTC"]);
        assert_eq!(prices["BTC"].price, Some(50000.0));
        assert_eq!(prices["BTC"].last_updated, now);
        assert_eq!(prices["BEST"].last_updated, now);
    }

    #[test]
    fn numeric_and_string_prices_both_parse() {
        let raw = response_from(json!({
            "BTC": {"USD": 54000.5},
            "ETH": {"USD": "2900.25"},
        }));

        let prices = BitpandaFetcher::parse_response(raw, Currency::USD, Utc::now());

        assert_eq!(prices["BTC"].price, Some(54000.5));
        assert_eq!(prices["ETH"].price, Some(2900.25));
    }

    #[test]
    fn non_numeric_price_is_kept_as_absent() {
        let raw = response_from(json!({
            "BTC": {"EUR": {"unexpected": true}},
        }));

        let prices = BitpandaFetcher::parse_response(raw, Currency::EUR, Utc::now());

        // The symbol quotes the currency, so it stays; the value does not parse.
        assert!(prices.contains_key("BTC"));
        assert_eq!(prices["BTC"].price, None);
    }

    #[test]
    fn projection_of_a_foreign_currency_can_be_empty() {
        let raw = response_from(json!({
            "BTC": {"EUR": "50000.0"},
        }));

        let prices = BitpandaFetcher::parse_response(raw, Currency::TRY, Utc::now());
        assert!(prices.is_empty());
    }
}
