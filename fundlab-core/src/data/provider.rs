//! Fundamentals provider trait and structured error types.
//!
//! The FundamentalsProvider trait abstracts over data sources (Yahoo Finance,
//! test stubs) so the updater never depends on a concrete HTTP client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One dated value from a reported series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub as_of: NaiveDate,
    pub value: f64,
}

/// Raw fundamentals for one ticker, as reported by a provider.
///
/// A `None` (or empty series) means the provider had no value for that
/// field. That is not an error: the field is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Trailing-twelve-month total revenue.
    pub total_revenue: Option<f64>,
    /// Trailing-twelve-month net income.
    pub net_income: Option<f64>,
    /// Market capitalization (scalar attribute).
    pub market_cap: Option<f64>,
    /// Reported free cash flow history, in any order.
    pub free_cash_flow: Vec<Observation>,
    /// Trailing earnings per share.
    pub eps: Option<f64>,
}

impl Fundamentals {
    /// Value of the most recent free cash flow observation.
    pub fn latest_free_cash_flow(&self) -> Option<f64> {
        self.free_cash_flow
            .iter()
            .filter(|o| o.value.is_finite())
            .max_by_key(|o| o.as_of)
            .map(|o| o.value)
    }
}

/// Structured error types for provider queries.
///
/// These are designed to be displayable next to the ticker that failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} for {symbol}")]
    Http { symbol: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider error: {0}")]
    Other(String),
}

/// Trait for fundamentals providers.
///
/// One call per ticker returns every field the updater needs. Providers do
/// not cache; the updater decides when a call is needed at all.
pub trait FundamentalsProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the latest fundamentals for a symbol.
    fn fetch(&self, symbol: &str) -> Result<Fundamentals, ProviderError>;
}

/// Progress callback for multi-ticker operations.
pub trait UpdateProgress: Send {
    /// Called when a ticker needs fetching, just before the provider call.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a ticker is already complete and no call is made.
    fn on_skip(&self, symbol: &str, index: usize, total: usize);

    /// Called when a fetch completes.
    fn on_complete(
        &self,
        symbol: &str,
        index: usize,
        total: usize,
        result: &Result<(), ProviderError>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, fetched: usize, skipped: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl UpdateProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!(
            "[{}/{}] {symbol} data is out of date. Retrieving updates now...",
            index + 1,
            total
        );
    }

    fn on_skip(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] {symbol} is up to date.", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), ProviderError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {symbol}"),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, fetched: usize, skipped: usize, failed: usize, total: usize) {
        println!(
            "\nUpdate complete: {total} tickers, {fetched} fetched ({failed} failed), {skipped} up to date"
        );
    }
}

/// Progress reporter that discards every event.
pub struct SilentProgress;

impl UpdateProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_skip(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _result: &Result<(), ProviderError>,
    ) {
    }

    fn on_batch_complete(&self, _fetched: usize, _skipped: usize, _failed: usize, _total: usize) {}
}
