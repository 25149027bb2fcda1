//! Westmetall scraper for LME copper cash/3-month prices and LME stocks.
//!
//! The page renders one HTML table per year with rows like:
//!
//! ```text
//! | 14. November 2025 | 10,868.00 | 10,935.00 | 135,250 |
//! ```
//!
//! Header rows and rows with unparsable cells are skipped.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::data::files::{LmeRow, parse_number};
use crate::error::AppError;

const LME_CASH_URL: &str = "https://www.westmetall.com/en/markdaten.php?action=table&field=LME_Cu_cash";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct WestmetallClient {
    client: Client,
}

impl WestmetallClient {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch and parse the full LME copper table.
    pub fn fetch_lme_rows(&self) -> Result<Vec<LmeRow>, AppError> {
        info!(url = LME_CASH_URL, "fetching LME copper table");
        let resp = self
            .client
            .get(LME_CASH_URL)
            .send()
            .map_err(|e| AppError::new(4, format!("Westmetall request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Westmetall request failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read Westmetall response: {e}")))?;

        let rows = parse_lme_table(&body)?;
        if rows.is_empty() {
            return Err(AppError::new(4, "Westmetall page contained no LME price rows."));
        }
        Ok(rows)
    }
}

/// Parse every `<tr>` with at least four cells into an `LmeRow`, oldest first.
///
/// Dates appearing twice keep the later row.
pub fn parse_lme_table(html: &str) -> Result<Vec<LmeRow>, AppError> {
    let doc = Html::parse_document(html);
    let row_sel = selector("table tr")?;
    let cell_sel = selector("td")?;

    let mut by_date = BTreeMap::new();
    let mut skipped = 0usize;

    for tr in doc.select(&row_sel) {
        let cells: Vec<String> = tr
            .select(&cell_sel)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 4 {
            continue;
        }

        let date_text = cells[0].as_str();
        if date_text.is_empty() || matches!(date_text.to_lowercase().as_str(), "date" | "copper") {
            continue;
        }

        let parsed = parse_westmetall_date(date_text).and_then(|date| {
            Some(LmeRow {
                date,
                cash: parse_number(&cells[1])?,
                three_month: parse_number(&cells[2])?,
                stock: parse_number(&cells[3])?,
            })
        });
        match parsed {
            Some(row) => {
                by_date.insert(row.date, row);
            }
            None => skipped += 1,
        }
    }

    debug!(rows = by_date.len(), skipped, "parsed Westmetall table");
    Ok(by_date.into_values().collect())
}

/// `"31. October 2025"` → 2025-10-31.
fn parse_westmetall_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.replace('.', "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDate::parse_from_str(&cleaned, "%d %B %Y").ok()
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::new(4, format!("Invalid selector '{css}': {e:?}")))
}
