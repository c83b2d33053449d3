//! Yahoo Finance fundamentals provider.
//!
//! Fetches reported fundamentals from Yahoo's fundamentals-timeseries API in
//! a single request per ticker. Every requested field arrives as its own
//! dated series; the provider keeps the latest observation of each.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. Individual series that fail to parse are treated as absent
//! rather than failing the whole ticker.

use super::provider::{Fundamentals, FundamentalsProvider, Observation, ProviderError};
use crate::config::ProviderConfig;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const TRAILING_REVENUE: &str = "trailingTotalRevenue";
const TRAILING_NET_INCOME: &str = "trailingNetIncome";
const QUARTERLY_REVENUE: &str = "quarterlyTotalRevenue";
const QUARTERLY_NET_INCOME: &str = "quarterlyNetIncome";
const MARKET_CAP: &str = "trailingMarketCap";
const FREE_CASH_FLOW: &str = "annualFreeCashFlow";
const EPS: &str = "trailingDilutedEPS";

const SERIES_TYPES: [&str; 7] = [
    TRAILING_REVENUE,
    TRAILING_NET_INCOME,
    QUARTERLY_REVENUE,
    QUARTERLY_NET_INCOME,
    MARKET_CAP,
    FREE_CASH_FLOW,
    EPS,
];

/// Quarters summed when a trailing-twelve-month series is missing.
const TTM_QUARTERS: usize = 4;

/// Yahoo Finance fundamentals-timeseries response.
#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    result: Option<Vec<SeriesEntry>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

/// One requested series. The observations live under a key named after the
/// series type, next to `meta` and `timestamp`.
#[derive(Debug, Deserialize)]
struct SeriesEntry {
    meta: SeriesMeta,
    #[serde(flatten)]
    fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SeriesMeta {
    #[serde(rename = "type")]
    kind: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObservation {
    as_of_date: Option<String>,
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Option<serde_json::Value>,
}

/// Yahoo Finance fundamentals provider.
pub struct YahooFundamentals {
    client: reqwest::blocking::Client,
    base_url: String,
    lookback: ChronoDuration,
}

impl YahooFundamentals {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            lookback: ChronoDuration::days(365 * i64::from(config.lookback_years)),
        })
    }

    /// Build the timeseries API URL for a symbol. The symbol is a single
    /// percent-encoded path segment; query parameters are attached by the
    /// request builder.
    fn timeseries_url(&self, symbol: &str) -> Result<reqwest::Url, ProviderError> {
        let mut url = reqwest::Url::parse(&format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries",
            self.base_url
        ))
        .map_err(|e| ProviderError::Other(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| {
                ProviderError::Other(format!("base URL {} cannot hold a path", self.base_url))
            })?
            .push(symbol);
        Ok(url)
    }

    fn request(&self, symbol: &str) -> Result<Fundamentals, ProviderError> {
        let url = self.timeseries_url(symbol)?;
        let now = Utc::now();
        let period1 = (now - self.lookback).timestamp().to_string();
        let period2 = now.timestamp().to_string();
        let types = SERIES_TYPES.join(",");

        debug!(%symbol, %url, "requesting fundamentals");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("symbol", symbol),
                ("type", types.as_str()),
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
            ])
            .send()
            .map_err(|e| ProviderError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        debug!(%symbol, status = status.as_u16(), "fundamentals response");

        if let Some(err) = status_error(symbol, status) {
            return Err(err);
        }

        let body: TimeseriesResponse = resp.json().map_err(|e| {
            ProviderError::ResponseFormatChanged(format!(
                "failed to parse response for {symbol}: {e}"
            ))
        })?;

        parse_response(symbol, body)
    }
}

impl FundamentalsProvider for YahooFundamentals {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str) -> Result<Fundamentals, ProviderError> {
        self.request(symbol)
    }
}

/// Map a non-success HTTP status to a provider error.
fn status_error(symbol: &str, status: reqwest::StatusCode) -> Option<ProviderError> {
    if status == reqwest::StatusCode::NOT_FOUND {
        return Some(ProviderError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }
    (!status.is_success()).then(|| ProviderError::Http {
        symbol: symbol.to_string(),
        status: status.as_u16(),
    })
}

/// Parse a raw JSON body. Used by tests and by callers holding a saved
/// response.
pub fn parse_body(symbol: &str, body: &str) -> Result<Fundamentals, ProviderError> {
    let resp: TimeseriesResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
    })?;
    parse_response(symbol, resp)
}

/// Turn the timeseries response into a fundamentals bundle.
fn parse_response(symbol: &str, resp: TimeseriesResponse) -> Result<Fundamentals, ProviderError> {
    let entries = match resp.timeseries.result {
        Some(entries) => entries,
        None => {
            return Err(match resp.timeseries.error {
                Some(err) if err.code == "Not Found" => ProviderError::SymbolNotFound {
                    symbol: symbol.to_string(),
                },
                Some(err) => ProviderError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )),
                None => ProviderError::ResponseFormatChanged("empty result with no error".into()),
            })
        }
    };

    let mut series: HashMap<String, Vec<Observation>> = HashMap::new();
    for mut entry in entries {
        for kind in entry.meta.kind {
            let Some(raw) = entry.fields.remove(&kind) else {
                continue;
            };
            let observations = parse_series(symbol, &kind, raw);
            if !observations.is_empty() {
                series.entry(kind).or_default().extend(observations);
            }
        }
    }

    for observations in series.values_mut() {
        dedup_by_date(observations);
    }

    // Yahoo answers unknown symbols with a result holding only metadata.
    if series.is_empty() {
        return Err(ProviderError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    let latest = |kind: &str| series.get(kind).and_then(|obs| latest_value(obs));
    let trailing_or_quarters = |trailing: &str, quarterly: &str| {
        latest(trailing).or_else(|| series.get(quarterly).and_then(|obs| sum_latest_quarters(obs)))
    };

    Ok(Fundamentals {
        total_revenue: trailing_or_quarters(TRAILING_REVENUE, QUARTERLY_REVENUE),
        net_income: trailing_or_quarters(TRAILING_NET_INCOME, QUARTERLY_NET_INCOME),
        market_cap: latest(MARKET_CAP),
        free_cash_flow: series.get(FREE_CASH_FLOW).cloned().unwrap_or_default(),
        eps: latest(EPS),
    })
}

/// Decode one series. Null slots, missing dates and non-numeric values are
/// dropped; an undecodable series is empty.
fn parse_series(symbol: &str, kind: &str, raw: serde_json::Value) -> Vec<Observation> {
    let slots: Vec<Option<RawObservation>> = match serde_json::from_value(raw) {
        Ok(slots) => slots,
        Err(e) => {
            debug!(%symbol, series = kind, error = %e, "ignoring undecodable series");
            return Vec::new();
        }
    };

    slots
        .into_iter()
        .flatten()
        .filter_map(|slot| {
            let as_of = NaiveDate::parse_from_str(slot.as_of_date.as_deref()?, "%Y-%m-%d").ok()?;
            let value = slot.reported_value?.raw?.as_f64()?;
            value.is_finite().then_some(Observation { as_of, value })
        })
        .collect()
}

/// Sort by date, keeping the first observation seen for each date.
fn dedup_by_date(observations: &mut Vec<Observation>) {
    observations.sort_by_key(|o| o.as_of);
    observations.dedup_by_key(|o| o.as_of);
}

fn latest_value(observations: &[Observation]) -> Option<f64> {
    observations.iter().max_by_key(|o| o.as_of).map(|o| o.value)
}

/// Sum of the most recent four quarters, or `None` with fewer than four.
fn sum_latest_quarters(observations: &[Observation]) -> Option<f64> {
    if observations.len() < TTM_QUARTERS {
        return None;
    }
    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| b.as_of.cmp(&a.as_of));
    Some(sorted.iter().take(TTM_QUARTERS).map(|o| o.value).sum())
}
