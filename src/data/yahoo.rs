//! Yahoo Finance chart API client for COMEX copper futures (`HG=F`).
//!
//! Prices are USD/lb. Adjusted closes are preferred; plain closes are used
//! when the response carries no `adjclose` block.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppError;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const COMEX_COPPER_SYMBOL: &str = "HG=F";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Daily closes for `symbol` from `start` up to the latest available session.
    pub fn fetch_daily(&self, symbol: &str, start: NaiveDate) -> Result<Vec<(NaiveDate, f64)>, AppError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = chrono::Utc::now().timestamp();
        info!(symbol, %start, "fetching Yahoo daily history");

        let resp = self
            .client
            .get(format!("{CHART_URL}/{symbol}"))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("Yahoo request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Yahoo request for {symbol} failed with status {}.", resp.status()),
            ));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse Yahoo response: {e}")))?;

        let rows = chart_rows(body)?;
        if rows.is_empty() {
            return Err(AppError::new(4, format!("No observations returned for {symbol}.")));
        }
        Ok(rows)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Convert a chart response into `(exchange-local date, price)` rows, oldest first.
///
/// Sessions with a null price are dropped; a repeated date keeps the later row.
fn chart_rows(body: ChartResponse) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    if let Some(err) = body.chart.error {
        return Err(AppError::new(4, format!("Yahoo error {}: {}", err.code, err.description)));
    }
    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::new(4, "Yahoo response has no chart result."))?;

    let prices = match result.indicators.adjclose.into_iter().next() {
        Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
        _ => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    let mut rows: Vec<(NaiveDate, f64)> = Vec::with_capacity(prices.len());
    let mut dropped = 0usize;
    for (ts, price) in result.timestamp.iter().zip(prices) {
        let Some(price) = price.filter(|p| p.is_finite()) else {
            dropped += 1;
            continue;
        };
        let date = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .ok_or_else(|| AppError::new(4, format!("Invalid Yahoo timestamp {ts}.")))?
            .date_naive();
        match rows.last_mut() {
            Some(last) if last.0 == date => last.1 = price,
            _ => rows.push((date, price)),
        }
    }

    debug!(rows = rows.len(), dropped, "parsed Yahoo chart");
    Ok(rows)
}
