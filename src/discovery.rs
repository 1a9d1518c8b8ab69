//! Symbol discovery for the setup wizard

use crate::fetcher::TickerFetcher;
use crate::types::Currency;

/// Lists the symbols that quote a price in the given currency
///
/// Sorted ascending, no duplicates. Any fetcher failure degrades to an
/// empty list: the wizard shows "no options available" instead of an error.
pub async fn list_symbols(fetcher: &dyn TickerFetcher, currency: Currency) -> Vec<String> {
    match fetcher.fetch_ticker(currency).await {
        Ok(snapshot) => snapshot.symbols(),
        Err(error) => {
            tracing::warn!(
                source = fetcher.source_name(),
                currency = %currency,
                error = %error,
                "Failed to fetch valid symbols"
            );
            Vec::new()
        }
    }
}
