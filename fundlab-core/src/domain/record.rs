//! TickerRecord: one stock's financial snapshot.

use serde::{Deserialize, Serialize};

/// Financial snapshot for a single ticker.
///
/// Every value field is optional: a provider may not report it, or the
/// ticker may not have been fetched successfully yet. Absent values are
/// persisted as empty cells and never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub ticker: String,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub eps: Option<f64>,
}

impl TickerRecord {
    /// A record with every value field absent.
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            total_revenue: None,
            net_income: None,
            ratio: None,
            market_cap: None,
            free_cash_flow: None,
            eps: None,
        }
    }

    /// Returns true if all six value fields are present.
    ///
    /// Only incomplete records are re-fetched by the updater.
    pub fn is_complete(&self) -> bool {
        self.values().iter().all(Option::is_some)
    }

    /// Value fields in table column order.
    pub fn values(&self) -> [Option<f64>; 6] {
        [
            self.total_revenue,
            self.net_income,
            self.ratio,
            self.market_cap,
            self.free_cash_flow,
            self.eps,
        ]
    }
}

/// Net income to total revenue ratio.
///
/// Absent when either input is absent, when revenue is zero, or when the
/// quotient is not finite.
pub fn net_income_ratio(net_income: Option<f64>, total_revenue: Option<f64>) -> Option<f64> {
    let (income, revenue) = (net_income?, total_revenue?);
    if revenue == 0.0 {
        return None;
    }
    let ratio = income / revenue;
    ratio.is_finite().then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_record() -> TickerRecord {
        TickerRecord {
            ticker: "AAPL".into(),
            total_revenue: Some(391_035_000_000.0),
            net_income: Some(93_736_000_000.0),
            ratio: Some(0.2397),
            market_cap: Some(3.4e12),
            free_cash_flow: Some(108_807_000_000.0),
            eps: Some(6.08),
        }
    }

    #[test]
    fn empty_record_is_incomplete() {
        let rec = TickerRecord::empty("MSFT");
        assert_eq!(rec.ticker, "MSFT");
        assert!(!rec.is_complete());
        assert!(rec.values().iter().all(Option::is_none));
    }

    #[test]
    fn complete_record_is_complete() {
        assert!(complete_record().is_complete());
    }

    #[test]
    fn any_missing_field_makes_record_incomplete() {
        for i in 0..6 {
            let mut rec = complete_record();
            match i {
                0 => rec.total_revenue = None,
                1 => rec.net_income = None,
                2 => rec.ratio = None,
                3 => rec.market_cap = None,
                4 => rec.free_cash_flow = None,
                _ => rec.eps = None,
            }
            assert!(!rec.is_complete(), "field {i} missing should be incomplete");
        }
    }

    #[test]
    fn zero_valued_fields_still_count_as_present() {
        let mut rec = complete_record();
        rec.free_cash_flow = Some(0.0);
        assert!(rec.is_complete());
    }

    #[test]
    fn ratio_divides_income_by_revenue() {
        assert_eq!(net_income_ratio(Some(1.2e9), Some(6e9)), Some(0.2));
        assert_eq!(net_income_ratio(Some(-5.0), Some(10.0)), Some(-0.5));
    }

    #[test]
    fn ratio_is_absent_on_zero_revenue() {
        assert_eq!(net_income_ratio(Some(1.0), Some(0.0)), None);
        assert_eq!(net_income_ratio(Some(0.0), Some(-0.0)), None);
    }

    #[test]
    fn ratio_is_absent_when_an_input_is_missing() {
        assert_eq!(net_income_ratio(None, Some(10.0)), None);
        assert_eq!(net_income_ratio(Some(10.0), None), None);
        assert_eq!(net_income_ratio(None, None), None);
    }

    #[test]
    fn ratio_is_absent_when_not_finite() {
        assert_eq!(net_income_ratio(Some(f64::MAX), Some(f64::MIN_POSITIVE)), None);
        assert_eq!(net_income_ratio(Some(f64::NAN), Some(1.0)), None);
    }
}
