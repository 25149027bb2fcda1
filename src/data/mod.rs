//! Acquisition adapters: turn remote pages and local CSVs into `MarketData`.
//!
//! Unit normalization happens here, before anything reaches the core:
//! COMEX stocks arrive in short tons and leave as metric tonnes.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{MarketData, Series, Unit};
use crate::error::AppError;

pub mod files;
pub mod westmetall;
pub mod yahoo;

pub use files::LmeRow;
pub use westmetall::WestmetallClient;
pub use yahoo::YahooClient;

/// Where LME prices and stocks come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LmeSource {
    /// Scrape the Westmetall LME copper table.
    Web,
    /// Read `lme_csv` from the data directory.
    Csv,
}

/// Where COMEX front-month prices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ComexSource {
    /// Yahoo Finance chart API (`HG=F`).
    Yahoo,
    /// Read `comex_price_csv` from the data directory.
    Csv,
}

/// Acquisition settings, derived from CLI flags plus `.env`.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub lme_source: LmeSource,
    pub comex_source: ComexSource,
    pub lme_csv: String,
    pub comex_inventory_csv: String,
    pub net_shorts_csv: String,
    pub comex_price_csv: String,
    /// Observations before this date are discarded.
    pub history_start: NaiveDate,
    pub http_timeout: Duration,
}

impl DataConfig {
    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

/// Acquire all raw inputs described by `config`.
pub fn load_market_data(config: &DataConfig) -> Result<MarketData, AppError> {
    let lme_rows = match config.lme_source {
        LmeSource::Web => WestmetallClient::new(config.http_timeout)?.fetch_lme_rows()?,
        LmeSource::Csv => files::load_lme_csv(&config.path(&config.lme_csv))?,
    };
    let lme_rows: Vec<LmeRow> = lme_rows
        .into_iter()
        .filter(|r| r.date >= config.history_start)
        .collect();

    let comex_stocks = files::load_comex_inventory_csv(&config.path(&config.comex_inventory_csv))?;
    let net_shorts = files::load_net_shorts_csv(&config.path(&config.net_shorts_csv))?;
    let comex_price = match config.comex_source {
        ComexSource::Yahoo => {
            YahooClient::new(config.http_timeout)?.fetch_daily(yahoo::COMEX_COPPER_SYMBOL, config.history_start)?
        }
        ComexSource::Csv => files::load_comex_price_csv(&config.path(&config.comex_price_csv))?,
    };

    let data = MarketData {
        lme_cash: Series::from_unsorted("lme_cash", Unit::UsdPerTonne, lme_column(&lme_rows, |r| r.cash))?,
        lme_three_month: Series::from_unsorted(
            "lme_three_month",
            Unit::UsdPerTonne,
            lme_column(&lme_rows, |r| r.three_month),
        )?,
        lme_stocks: Series::from_unsorted("lme_stocks", Unit::Tonnes, lme_column(&lme_rows, |r| r.stock))?,
        comex_stocks: Series::from_unsorted("comex_stocks", Unit::Tonnes, since(comex_stocks, config.history_start))?,
        net_shorts: Series::from_unsorted("net_shorts", Unit::Contracts, since(net_shorts, config.history_start))?,
        comex_price: Series::from_unsorted(
            "comex_price",
            Unit::UsdPerPound,
            since(comex_price, config.history_start),
        )?,
    };

    info!(
        lme = data.lme_cash.len(),
        comex_stocks = data.comex_stocks.len(),
        net_shorts = data.net_shorts.len(),
        comex_price = data.comex_price.len(),
        "market data loaded"
    );
    Ok(data)
}

fn lme_column(rows: &[LmeRow], f: impl Fn(&LmeRow) -> f64) -> Vec<(NaiveDate, f64)> {
    rows.iter().map(|r| (r.date, f(r))).collect()
}

fn since(rows: Vec<(NaiveDate, f64)>, start: NaiveDate) -> Vec<(NaiveDate, f64)> {
    rows.into_iter().filter(|(d, _)| *d >= start).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &std::path::Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn loads_csv_sources_and_filters_history() {
        let dir = std::env::temp_dir().join(format!("squeeze-data-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write(
            &dir,
            "lme.csv",
            "date,cash,three_month,lme_copper_stock\n2014-12-31,1,1,1\n2025-11-13,10900,10950,135000\n2025-11-14,10868,10935,135250\n",
        );
        write(&dir, "comex_inv.csv", "date,COMEX Inventory: Copper (short ton)\n2025-11-14,100000\n");
        write(&dir, "cftc.csv", "Date,Net_Shorts\n2025-11-11,-12500\n");
        write(&dir, "comex_px.csv", "date,close\n2025-11-13,5.00\n2025-11-14,5.05\n");

        let config = DataConfig {
            data_dir: dir.clone(),
            lme_source: LmeSource::Csv,
            comex_source: ComexSource::Csv,
            lme_csv: "lme.csv".to_string(),
            comex_inventory_csv: "comex_inv.csv".to_string(),
            net_shorts_csv: "cftc.csv".to_string(),
            comex_price_csv: "comex_px.csv".to_string(),
            history_start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            http_timeout: Duration::from_secs(5),
        };

        let data = load_market_data(&config).unwrap();
        assert_eq!(data.lme_cash.len(), 2);
        assert_eq!(data.lme_stocks.last().unwrap().value, 135_250.0);
        assert_eq!(data.comex_stocks.last().unwrap().value, 90_718.0);
        assert_eq!(data.comex_price.unit(), Unit::UsdPerPound);

        fs::remove_dir_all(&dir).ok();
    }
}
