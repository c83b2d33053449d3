//! FinancialTable: ticker-keyed collection of records in insertion order.

use super::record::TickerRecord;
use std::collections::HashMap;

/// Outcome of [`FinancialTable::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The ticker was new and the record was appended.
    Inserted,
    /// The ticker existed and its record was replaced wholesale.
    Replaced,
}

/// In-memory table of ticker records.
///
/// Tickers are unique. Iteration follows insertion order: records loaded
/// from disk keep their row position, new tickers are appended at the end,
/// and replacing a record does not move it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialTable {
    records: Vec<TickerRecord>,
    index: HashMap<String, usize>,
}

impl FinancialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows in order. A later row for an already-seen
    /// ticker replaces the earlier one in place.
    pub fn from_records(records: impl IntoIterator<Item = TickerRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.upsert(record);
        }
        table
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerRecord> {
        self.index.get(ticker).map(|&i| &self.records[i])
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.index.contains_key(ticker)
    }

    /// Insert a new record, or replace the existing record for its ticker.
    pub fn upsert(&mut self, record: TickerRecord) -> Upsert {
        match self.index.get(&record.ticker) {
            Some(&i) => {
                self.records[i] = record;
                Upsert::Replaced
            }
            None => {
                self.index.insert(record.ticker.clone(), self.records.len());
                self.records.push(record);
                Upsert::Inserted
            }
        }
    }

    /// Records in row order.
    pub fn records(&self) -> &[TickerRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &TickerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with all value fields present.
    pub fn complete_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_complete()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticker: &str, eps: Option<f64>) -> TickerRecord {
        TickerRecord {
            eps,
            ..TickerRecord::empty(ticker)
        }
    }

    #[test]
    fn upsert_appends_new_tickers_in_order() {
        let mut table = FinancialTable::new();
        assert_eq!(table.upsert(record("AAPL", None)), Upsert::Inserted);
        assert_eq!(table.upsert(record("MSFT", None)), Upsert::Inserted);
        assert_eq!(table.upsert(record("GOOGL", None)), Upsert::Inserted);

        let order: Vec<&str> = table.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["AAPL", "MSFT", "GOOGL"]);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut table = FinancialTable::from_records(vec![
            record("AAPL", None),
            record("MSFT", None),
        ]);

        assert_eq!(table.upsert(record("AAPL", Some(6.1))), Upsert::Replaced);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].ticker, "AAPL");
        assert_eq!(table.get("AAPL").unwrap().eps, Some(6.1));
    }

    #[test]
    fn duplicate_rows_collapse_to_last() {
        let table = FinancialTable::from_records(vec![
            record("AAPL", Some(1.0)),
            record("MSFT", None),
            record("AAPL", Some(2.0)),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("AAPL").unwrap().eps, Some(2.0));
        assert_eq!(table.records()[1].ticker, "MSFT");
    }

    #[test]
    fn lookup_of_unknown_ticker() {
        let table = FinancialTable::new();
        assert!(table.is_empty());
        assert!(!table.contains("AAPL"));
        assert!(table.get("AAPL").is_none());
        assert_eq!(table.complete_count(), 0);
    }
}
