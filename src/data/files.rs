//! CSV loaders for locally saved datasets.
//!
//! Each loader reads a dated column out of a CSV export and hands back rows in
//! file order; callers turn them into `Series`.
//!
//! - Header names are matched case-insensitively (BOM and whitespace stripped).
//! - Dates may carry a time/timezone suffix (`2025-11-14 00:00:00-05:00`);
//!   only the leading `YYYY-MM-DD` is used.
//! - Rows with blank or non-numeric values are skipped and counted.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::error::AppError;

/// Short tons → metric tonnes.
pub const SHORT_TON_IN_TONNES: f64 = 0.907_184_74;

/// One row of a saved LME price table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmeRow {
    pub date: NaiveDate,
    /// USD/t.
    pub cash: f64,
    /// USD/t.
    pub three_month: f64,
    /// Tonnes.
    pub stock: f64,
}

/// Load `date,cash,three_month,lme_copper_stock`.
pub fn load_lme_csv(path: &Path) -> Result<Vec<LmeRow>, AppError> {
    let file = open(path)?;
    read_lme_csv(file, &path.display().to_string())
}

/// Load COMEX warehouse stocks (short tons) and convert to whole metric tonnes.
pub fn load_comex_inventory_csv(path: &Path) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    let file = open(path)?;
    read_comex_inventory_csv(file, &path.display().to_string())
}

/// Load CFTC `Date,Net_Shorts`.
pub fn load_net_shorts_csv(path: &Path) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    let file = open(path)?;
    read_dated_column(file, &path.display().to_string(), &["date"], &["net_shorts"])
}

/// Load COMEX front-month prices, USD/lb (`date,close` or `Date,Adj Close`).
pub fn load_comex_price_csv(path: &Path) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    let file = open(path)?;
    read_dated_column(
        file,
        &path.display().to_string(),
        &["date"],
        &["adj close", "adj_close", "close"],
    )
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

pub(crate) fn read_lme_csv<R: Read>(reader: R, source: &str) -> Result<Vec<LmeRow>, AppError> {
    let (headers, records) = read_all(reader, source)?;
    let date_idx = require_column(&headers, &["date"], source)?;
    let cash_idx = require_column(&headers, &["cash"], source)?;
    let three_m_idx = require_column(&headers, &["three_month", "3m", "three month"], source)?;
    let stock_idx = require_column(&headers, &["lme_copper_stock", "stock", "stocks"], source)?;

    let mut out = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for record in &records {
        let row = (|| {
            Some(LmeRow {
                date: parse_date(record.get(date_idx)?)?,
                cash: parse_number(record.get(cash_idx)?)?,
                three_month: parse_number(record.get(three_m_idx)?)?,
                stock: parse_number(record.get(stock_idx)?)?,
            })
        })();
        match row {
            Some(r) => out.push(r),
            None => skipped += 1,
        }
    }

    finish(source, out, skipped)
}

pub(crate) fn read_comex_inventory_csv<R: Read>(reader: R, source: &str) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    let rows = read_dated_column(
        reader,
        source,
        &["date"],
        &["comex inventory: copper (short ton)", "comex_inventory", "short_tons"],
    )?;
    Ok(rows
        .into_iter()
        .map(|(d, short_tons)| (d, (short_tons * SHORT_TON_IN_TONNES).round()))
        .collect())
}

pub(crate) fn read_dated_column<R: Read>(
    reader: R,
    source: &str,
    date_names: &[&str],
    value_names: &[&str],
) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    let (headers, records) = read_all(reader, source)?;
    let date_idx = require_column(&headers, date_names, source)?;
    let value_idx = require_column(&headers, value_names, source)?;

    let mut out = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for record in &records {
        let parsed = record
            .get(date_idx)
            .and_then(parse_date)
            .zip(record.get(value_idx).and_then(parse_number));
        match parsed {
            Some(row) => out.push(row),
            None => skipped += 1,
        }
    }

    finish(source, out, skipped)
}

fn read_all<R: Read>(reader: R, source: &str) -> Result<(HashMap<String, usize>, Vec<StringRecord>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers of '{source}': {e}")))?
        .clone();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(r) => records.push(r),
            // +2: header line plus 1-based numbering.
            Err(e) => warn!(source, line = idx + 2, error = %e, "skipping unparsable CSV record"),
        }
    }

    Ok((build_header_map(&headers), records))
}

fn finish<T>(source: &str, rows: Vec<T>, skipped: usize) -> Result<Vec<T>, AppError> {
    if skipped > 0 {
        debug!(source, skipped, "skipped rows without a usable date/value");
    }
    if rows.is_empty() {
        return Err(AppError::new(3, format!("No usable rows in '{source}'.")));
    }
    Ok(rows)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

fn require_column(headers: &HashMap<String, usize>, names: &[&str], source: &str) -> Result<usize, AppError> {
    names
        .iter()
        .find_map(|n| headers.get(*n).copied())
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("CSV '{source}' is missing a '{}' column.", names.join("' / '")),
            )
        })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_lme_rows_with_bom_and_thousands_separators() {
        let csv = "\u{feff}date,cash,three_month,lme_copper_stock\n\
                   2025-11-13,\"10,850.50\",\"10,900.00\",\"135,250\"\n\
                   2025-11-14,10900,10950,134000\n\
                   2025-11-15,,,\n";
        let rows = read_lme_csv(csv.as_bytes(), "lme.csv").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2025, 11, 13));
        assert_eq!(rows[0].cash, 10_850.5);
        assert_eq!(rows[0].stock, 135_250.0);
    }

    #[test]
    fn converts_comex_short_tons() {
        let csv = "date,COMEX Inventory: Copper (short ton)\n\
                   2025-11-14 00:00:00-05:00,100000\n";
        let rows = read_comex_inventory_csv(csv.as_bytes(), "comex.csv").unwrap();
        assert_eq!(rows, vec![(d(2025, 11, 14), 90_718.0)]);
    }

    #[test]
    fn reads_net_shorts_with_capitalized_headers() {
        let csv = "Date,Net_Shorts\n2025-11-11,-12500\n2025-11-04,3000\n";
        let rows = read_dated_column(csv.as_bytes(), "cftc.csv", &["date"], &["net_shorts"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (d(2025, 11, 11), -12_500.0));
    }

    #[test]
    fn missing_column_is_a_config_error() {
        let csv = "Date,Longs\n2025-11-11,1\n";
        let err = read_dated_column(csv.as_bytes(), "cftc.csv", &["date"], &["net_shorts"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_usable_rows_is_a_data_error() {
        let csv = "date,close\nnot-a-date,4.5\n";
        let err = read_dated_column(csv.as_bytes(), "px.csv", &["date"], &["close"]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
