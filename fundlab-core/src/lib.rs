//! fundlab core: ticker fundamentals, incremental CSV persistence, threshold filtering.
//!
//! This crate contains:
//! - Domain types (ticker records, the ticker-keyed financial table)
//! - The fundamentals provider trait and its Yahoo Finance implementation
//! - CSV storage for ticker lists and financial tables
//! - The update orchestrator (skip complete rows, fetch the rest, checkpoint)
//! - The threshold filter
//! - TOML configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod filter;

pub use config::{ConfigError, FundlabConfig, ProviderConfig};
pub use filter::{run_filter, FilterSummary, Thresholds};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types crossing the provider seam are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::TickerRecord>();
        require_sync::<domain::TickerRecord>();
        require_send::<domain::FinancialTable>();
        require_sync::<domain::FinancialTable>();
        require_send::<data::Fundamentals>();
        require_sync::<data::Fundamentals>();
        require_send::<data::YahooFundamentals>();
        require_sync::<data::YahooFundamentals>();
        require_send::<Thresholds>();
        require_sync::<Thresholds>();
    }

    /// Architecture contract: the updater only sees providers through the trait.
    #[test]
    fn provider_trait_is_object_safe() {
        fn _check(provider: &dyn data::FundamentalsProvider, symbol: &str) -> domain::TickerRecord {
            data::fetch_record(provider, symbol).record
        }
    }
}
