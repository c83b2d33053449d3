//! Threshold filter over a persisted financial table.
//!
//! A row passes when every value field is present and strictly greater than
//! its threshold. An absent value cannot exceed anything, so it excludes
//! the row.

use crate::data::store::{self, TableError};
use crate::domain::TickerRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Lower bounds, one per value column, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub total_revenue: f64,
    pub net_income: f64,
    pub ratio: f64,
    pub market_cap: f64,
    pub free_cash_flow: f64,
    pub eps: f64,
}

impl Thresholds {
    pub fn from_array(values: [f64; 6]) -> Self {
        let [total_revenue, net_income, ratio, market_cap, free_cash_flow, eps] = values;
        Self {
            total_revenue,
            net_income,
            ratio,
            market_cap,
            free_cash_flow,
            eps,
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.total_revenue,
            self.net_income,
            self.ratio,
            self.market_cap,
            self.free_cash_flow,
            self.eps,
        ]
    }

    /// Returns true if every field of `record` is present and strictly
    /// above its threshold.
    pub fn passes(&self, record: &TickerRecord) -> bool {
        record
            .values()
            .iter()
            .zip(self.to_array())
            .all(|(value, threshold)| value.is_some_and(|v| v > threshold))
    }
}

/// Records passing `thresholds`, in their original order.
pub fn filter_records(records: &[TickerRecord], thresholds: &Thresholds) -> Vec<TickerRecord> {
    records
        .iter()
        .filter(|r| thresholds.passes(r))
        .cloned()
        .collect()
}

/// Counts from a filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub scanned: usize,
    pub passed: usize,
}

/// Filter `source` into `dest`. The header is always written, even when no
/// row passes. `source` is only read.
pub fn run_filter(
    source: &Path,
    dest: &Path,
    thresholds: &Thresholds,
) -> Result<FilterSummary, TableError> {
    if !source.is_file() {
        return Err(TableError::SourceUnavailable {
            path: source.to_path_buf(),
            reason: "file not found".into(),
        });
    }

    let table = store::load_table(source)?;
    let passing = filter_records(table.records(), thresholds);
    store::save_records(dest, &passing)?;

    let summary = FilterSummary {
        scanned: table.len(),
        passed: passing.len(),
    };
    info!(source = %source.display(), dest = %dest.display(), scanned = summary.scanned, passed = summary.passed, "filtered table");
    Ok(summary)
}
