//! Property tests for record and table invariants.
//!
//! Uses proptest to verify:
//! 1. Ratio safety: never panics, never non-finite, absent on zero revenue
//! 2. Storage round-trip: save then load reproduces the records, absent stays absent
//! 3. Filter predicate: a row passes iff every field is present and strictly greater

use fundlab_core::data::{load_table, save_table};
use fundlab_core::domain::{net_income_ratio, FinancialTable, TickerRecord};
use fundlab_core::filter::{filter_records, Thresholds};
use proptest::prelude::*;
use tempfile::TempDir;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None::<f64>),
        1 => Just(Some(0.0)),
        4 => (-1e13..1e13_f64).prop_map(Some),
    ]
}

fn arb_ticker() -> impl Strategy<Value = String> {
    "[A-Z]{1,5}"
}

fn arb_record() -> impl Strategy<Value = TickerRecord> {
    (
        arb_ticker(),
        arb_value(),
        arb_value(),
        arb_value(),
        arb_value(),
        arb_value(),
        arb_value(),
    )
        .prop_map(|(ticker, total_revenue, net_income, ratio, market_cap, free_cash_flow, eps)| {
            TickerRecord {
                ticker,
                total_revenue,
                net_income,
                ratio,
                market_cap,
                free_cash_flow,
                eps,
            }
        })
}

fn arb_thresholds() -> impl Strategy<Value = Thresholds> {
    proptest::array::uniform6(-1e13..1e13_f64).prop_map(Thresholds::from_array)
}

// ── 1. Ratio Safety ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn ratio_is_finite_or_absent(income in arb_value(), revenue in arb_value()) {
        match net_income_ratio(income, revenue) {
            Some(r) => {
                prop_assert!(r.is_finite());
                prop_assert!(revenue.unwrap() != 0.0);
            }
            None => prop_assert!(
                income.is_none() || revenue.is_none() || revenue == Some(0.0)
                    || !(income.unwrap() / revenue.unwrap()).is_finite()
            ),
        }
    }

    #[test]
    fn ratio_with_zero_revenue_is_absent(income in arb_value()) {
        prop_assert_eq!(net_income_ratio(income, Some(0.0)), None);
    }
}

// ── 2. Storage Round-Trip ────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn save_then_load_round_trips(records in proptest::collection::vec(arb_record(), 0..20)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("financial_data.csv");
        let table = FinancialTable::from_records(records);

        save_table(&path, &table).unwrap();
        let loaded = load_table(&path).unwrap();

        prop_assert_eq!(loaded.records(), table.records());
    }
}

// ── 3. Filter Predicate ──────────────────────────────────────────────

proptest! {
    #[test]
    fn filter_keeps_exactly_the_rows_strictly_above(
        records in proptest::collection::vec(arb_record(), 0..30),
        thresholds in arb_thresholds(),
    ) {
        let kept = filter_records(&records, &thresholds);
        let limits = thresholds.to_array();

        let expected: Vec<&TickerRecord> = records
            .iter()
            .filter(|r| {
                r.values()
                    .iter()
                    .zip(limits.iter())
                    .all(|(v, t)| matches!(v, Some(x) if x > t))
            })
            .collect();

        prop_assert_eq!(kept.len(), expected.len());
        for (k, e) in kept.iter().zip(expected) {
            prop_assert_eq!(k, e);
        }
    }

    #[test]
    fn record_with_an_absent_field_never_passes(
        record in arb_record(),
        thresholds in arb_thresholds(),
    ) {
        prop_assume!(!record.is_complete());
        prop_assert!(!thresholds.passes(&record));
    }
}
