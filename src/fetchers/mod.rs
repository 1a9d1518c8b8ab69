//! Ticker fetcher implementations

pub mod bitpanda;

pub use bitpanda::BitpandaFetcher;
