//! Constants for the Bitpanda price tracker
//!
//! All fixed upstream parameters are centralized here. Per-instance
//! configuration (currency, symbols, cadence) lives in [`crate::config`].

/// Bitpanda public ticker endpoint (no authentication, no pagination)
pub const BITPANDA_API_URL: &str = "https://api.bitpanda.com/v1/ticker";

/// HTTP request timeout when fetching the ticker (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "bitpanda-price-sdk/0.1.0";

/// Prefix used for stable entity identifiers
pub const DOMAIN: &str = "bitpanda_price_tracker";

/// Symbols tracked when the configuration does not name any
pub const DEFAULT_SYMBOLS: &[&str] = &["BEST"];
