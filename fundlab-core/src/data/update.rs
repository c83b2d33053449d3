//! Update orchestrator: decides which tickers need fetching, fetches them one
//! at a time and merges the results into the table.
//!
//! A provider failure for one ticker never aborts the batch: the ticker gets
//! an all-absent record, stays incomplete, and is fetched again next run.

use super::provider::{FundamentalsProvider, ProviderError, UpdateProgress};
use super::store::{self, TableError};
use crate::domain::{net_income_ratio, FinancialTable, TickerRecord};
use std::path::Path;
use tracing::{info, warn};

/// Result of fetching a single ticker.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The fetched record; all-absent when the provider failed.
    pub record: TickerRecord,
    /// The provider error, if the query failed.
    pub error: Option<ProviderError>,
}

/// Fetch one ticker and derive its record.
///
/// The ratio is computed from the fetched revenue and net income. Free cash
/// flow is the most recent observation of the reported series.
pub fn fetch_record(provider: &dyn FundamentalsProvider, symbol: &str) -> FetchOutcome {
    match provider.fetch(symbol) {
        Ok(f) => FetchOutcome {
            record: TickerRecord {
                ticker: symbol.to_string(),
                total_revenue: f.total_revenue,
                net_income: f.net_income,
                ratio: net_income_ratio(f.net_income, f.total_revenue),
                market_cap: f.market_cap,
                free_cash_flow: f.latest_free_cash_flow(),
                eps: f.eps,
            },
            error: None,
        },
        Err(e) => {
            warn!(%symbol, provider = provider.name(), error = %e, "error processing ticker");
            FetchOutcome {
                record: TickerRecord::empty(symbol),
                error: Some(e),
            }
        }
    }
}

/// Summary of a batch operation.
#[derive(Debug, Default)]
pub struct UpdateSummary {
    /// Input tickers, duplicates included.
    pub total: usize,
    /// Provider calls made (successful or not).
    pub fetched: usize,
    /// Tickers skipped because their record was already complete.
    pub skipped: usize,
    /// Provider calls that failed.
    pub failed: usize,
    pub errors: Vec<(String, ProviderError)>,
}

impl UpdateSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Bring `table` up to date for `tickers`, in input order.
///
/// Missing or incomplete tickers are fetched and inserted or replaced
/// wholesale; complete tickers are skipped without a provider call.
/// `checkpoint` is called with the current table after every fetch, so a
/// caller can persist progress incrementally.
pub fn update_table<F>(
    provider: &dyn FundamentalsProvider,
    mut table: FinancialTable,
    tickers: &[String],
    progress: &dyn UpdateProgress,
    mut checkpoint: F,
) -> Result<(FinancialTable, UpdateSummary), TableError>
where
    F: FnMut(&FinancialTable) -> Result<(), TableError>,
{
    let total = tickers.len();
    let mut summary = UpdateSummary {
        total,
        ..Default::default()
    };

    for (i, symbol) in tickers.iter().enumerate() {
        if table.get(symbol).is_some_and(TickerRecord::is_complete) {
            progress.on_skip(symbol, i, total);
            summary.skipped += 1;
            continue;
        }

        progress.on_start(symbol, i, total);
        let outcome = fetch_record(provider, symbol);
        summary.fetched += 1;

        let result = match outcome.error {
            None => Ok(()),
            Some(e) => Err(e),
        };
        progress.on_complete(symbol, i, total, &result);
        if let Err(e) = result {
            summary.failed += 1;
            summary.errors.push((symbol.clone(), e));
        }

        table.upsert(outcome.record);
        checkpoint(&table)?;
    }

    progress.on_batch_complete(summary.fetched, summary.skipped, summary.failed, total);
    Ok((table, summary))
}

/// Run a full update: read tickers from `input`, load `output` if present,
/// fetch what is missing and rewrite `output` after every fetch.
///
/// An unreadable `input` aborts before any provider call. If nothing needed
/// fetching, `output` is left untouched.
pub fn run_update(
    provider: &dyn FundamentalsProvider,
    input: &Path,
    output: &Path,
    progress: &dyn UpdateProgress,
) -> Result<UpdateSummary, TableError> {
    let tickers = store::read_tickers(input)?;
    let table = store::load_table(output)?;
    info!(
        input = %input.display(),
        tickers = tickers.len(),
        existing_rows = table.len(),
        "starting update"
    );

    let (_, summary) = update_table(provider, table, &tickers, progress, |t| {
        store::save_table(output, t)
    })?;
    Ok(summary)
}

/// Re-fetch EPS for every record, ignoring completeness. Other fields are
/// kept. A failed fetch leaves that record's EPS absent.
pub fn refresh_eps(
    provider: &dyn FundamentalsProvider,
    mut table: FinancialTable,
    progress: &dyn UpdateProgress,
) -> (FinancialTable, UpdateSummary) {
    let tickers: Vec<String> = table.iter().map(|r| r.ticker.clone()).collect();
    let total = tickers.len();
    let mut summary = UpdateSummary {
        total,
        ..Default::default()
    };

    for (i, symbol) in tickers.iter().enumerate() {
        progress.on_start(symbol, i, total);
        let outcome = fetch_record(provider, symbol);
        summary.fetched += 1;

        let mut record = match table.get(symbol) {
            Some(existing) => existing.clone(),
            None => TickerRecord::empty(symbol.as_str()),
        };
        record.eps = outcome.record.eps;
        table.upsert(record);

        let result = match outcome.error {
            None => Ok(()),
            Some(e) => Err(e),
        };
        progress.on_complete(symbol, i, total, &result);
        if let Err(e) = result {
            summary.failed += 1;
            summary.errors.push((symbol.clone(), e));
        }
    }

    progress.on_batch_complete(summary.fetched, summary.skipped, summary.failed, total);
    (table, summary)
}

/// Refresh EPS for every row of `source` and write the result to `dest`.
/// `source` is never modified.
pub fn run_refresh_eps(
    provider: &dyn FundamentalsProvider,
    source: &Path,
    dest: &Path,
    progress: &dyn UpdateProgress,
) -> Result<UpdateSummary, TableError> {
    if !source.is_file() {
        return Err(TableError::SourceUnavailable {
            path: source.to_path_buf(),
            reason: "file not found".into(),
        });
    }
    let table = store::load_table(source)?;
    let (table, summary) = refresh_eps(provider, table, progress);
    store::save_table(dest, &table)?;
    Ok(summary)
}
