//! CSV table storage.
//!
//! Layout of a financial table, one row per ticker:
//! `Ticker,Total Revenue,Net Income,Net income to total revenue ratio,Market Cap,Free Cash Flow,EPS`
//!
//! Features:
//! - Absent values are empty cells, never zero
//! - Atomic writes (write to .tmp, rename into place)
//! - Lenient reads: cells that are empty, non-numeric or non-finite load as absent,
//!   and value columns missing from an older file load as absent

use crate::domain::{FinancialTable, TickerRecord};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Name of the ticker column in both the ticker list and financial tables.
pub const TICKER_COLUMN: &str = "Ticker";

/// Financial table columns, in file order.
pub const HEADERS: [&str; 7] = [
    TICKER_COLUMN,
    "Total Revenue",
    "Net Income",
    "Net income to total revenue ratio",
    "Market Cap",
    "Free Cash Flow",
    "EPS",
];

/// Errors reading or writing tables.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All).flexible(true);
    builder
}

fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>, TableError> {
    reader_builder()
        .from_path(path)
        .map_err(|e| TableError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Read ticker symbols from the `Ticker` column of a CSV file.
///
/// Returns non-empty trimmed symbols in file order. Duplicates are kept.
pub fn read_tickers(path: &Path) -> Result<Vec<String>, TableError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| TableError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .clone();
    let idx = column_index(&headers, TICKER_COLUMN).ok_or_else(|| TableError::MissingColumn {
        path: path.to_path_buf(),
        column: TICKER_COLUMN,
    })?;

    let mut tickers = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(ticker) = row.get(idx).filter(|t| !t.is_empty()) {
            tickers.push(ticker.to_string());
        }
    }
    Ok(tickers)
}

/// Load a financial table.
///
/// A missing or zero-length file is an empty table. Repeated tickers
/// collapse to the last row. A path that exists but cannot be read as a
/// file is an I/O error.
pub fn load_table(path: &Path) -> Result<FinancialTable, TableError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            return Err(TableError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("is a directory"),
            })
        }
        Ok(meta) if meta.len() == 0 => return Ok(FinancialTable::new()),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FinancialTable::new()),
        Err(source) => {
            return Err(TableError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let file = fs::File::open(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = reader_builder().from_reader(file);
    let headers = reader
        .headers()
        .map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let ticker_idx =
        column_index(&headers, TICKER_COLUMN).ok_or_else(|| TableError::MissingColumn {
            path: path.to_path_buf(),
            column: TICKER_COLUMN,
        })?;
    let value_idx: Vec<Option<usize>> = HEADERS[1..]
        .iter()
        .map(|name| column_index(&headers, name))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(ticker) = row.get(ticker_idx).filter(|t| !t.is_empty()) else {
            continue;
        };
        let cell = |field: usize| value_idx[field].and_then(|i| row.get(i)).and_then(parse_cell);
        records.push(TickerRecord {
            ticker: ticker.to_string(),
            total_revenue: cell(0),
            net_income: cell(1),
            ratio: cell(2),
            market_cap: cell(3),
            free_cash_flow: cell(4),
            eps: cell(5),
        });
    }

    let table = FinancialTable::from_records(records);
    info!(path = %path.display(), rows = table.len(), complete = table.complete_count(), "loaded table");
    Ok(table)
}

/// Write a financial table, header first, to any writer.
pub fn write_table<W: io::Write>(writer: W, records: &[TickerRecord]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADERS)?;
    for record in records {
        let mut row = Vec::with_capacity(HEADERS.len());
        row.push(record.ticker.clone());
        row.extend(record.values().iter().map(|v| format_cell(*v)));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save records to `path`, replacing any existing file.
///
/// Writes are atomic: write to .tmp then rename.
pub fn save_records(path: &Path, records: &[TickerRecord]) -> Result<(), TableError> {
    let tmp_path = tmp_path_for(path);
    let file = fs::File::create(&tmp_path).map_err(|source| TableError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    if let Err(source) = write_table(io::BufWriter::new(file), records) {
        let _ = fs::remove_file(&tmp_path);
        return Err(TableError::Csv {
            path: tmp_path,
            source,
        });
    }

    // Atomic rename
    fs::rename(&tmp_path, path).map_err(|source| {
        // Clean up temp file on rename failure
        let _ = fs::remove_file(&tmp_path);
        TableError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    info!(path = %path.display(), rows = records.len(), "saved table");
    Ok(())
}

/// Save a whole table to `path`.
pub fn save_table(path: &Path, table: &FinancialTable) -> Result<(), TableError> {
    save_records(path, table.records())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Parse a numeric cell. Empty, non-numeric and non-finite cells are absent.
pub fn parse_cell(cell: &str) -> Option<f64> {
    let value: f64 = cell.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Format a numeric cell using the shortest representation that parses
/// back to the same value.
pub fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
