//! Data acquisition and table storage

pub mod provider;
pub mod store;
pub mod update;
pub mod yahoo;

pub use provider::{
    Fundamentals, FundamentalsProvider, Observation, ProviderError, SilentProgress,
    StdoutProgress, UpdateProgress,
};
pub use store::{load_table, read_tickers, save_table, TableError, HEADERS};
pub use update::{
    fetch_record, refresh_eps, run_refresh_eps, run_update, update_table, FetchOutcome,
    UpdateSummary,
};
pub use yahoo::YahooFundamentals;
