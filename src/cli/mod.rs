//! Command-line parsing for the copper short-squeeze monitor.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! indicator and scoring code. `app` converts these structs into `DataConfig`
//! and `Overrides`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::{ComexSource, LmeSource};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "squeeze", version, about = "LME copper short-squeeze monitor")]
pub struct Cli {
    /// Log debug details to stderr (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank the latest stored observations and print the composite verdict.
    Score(ScoreArgs),
    /// Rank fresh raw values (any subset) against the stored history.
    Live(LiveArgs),
    /// Write derived indicator series (CSV) and scored results (JSON).
    Export(ExportArgs),
}

/// Data acquisition options shared by all subcommands.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Directory holding the CSV inputs (default: $SQUEEZE_DATA_DIR or ./data).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Source for LME cash/3-month prices and LME stocks.
    #[arg(long, value_enum, default_value_t = LmeSource::Web)]
    pub lme_source: LmeSource,

    /// Source for COMEX front-month prices (USD/lb).
    #[arg(long, value_enum, default_value_t = ComexSource::Yahoo)]
    pub comex_source: ComexSource,

    /// LME prices/stocks CSV (`date,cash,three_month,lme_copper_stock`).
    #[arg(long, default_value = "lme_copper_data.csv")]
    pub lme_csv: String,

    /// COMEX warehouse stocks CSV, short tons.
    #[arg(long, default_value = "comex_copper_inventory.csv")]
    pub comex_inventory_csv: String,

    /// CFTC net shorts CSV (`Date,Net_Shorts`).
    #[arg(long, default_value = "cftc_copper_net_shorts.csv")]
    pub net_shorts_csv: String,

    /// COMEX price CSV (`date,close`), used with `--comex-source csv`.
    #[arg(long, default_value = "comex_copper_prices.csv")]
    pub comex_price_csv: String,

    /// Drop observations before this date (YYYY-MM-DD).
    #[arg(long, default_value = "2015-01-01")]
    pub history_start: NaiveDate,

    /// HTTP timeout for remote sources, seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Print results as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,
}

/// Fresh raw values; every flag is optional.
#[derive(Debug, Args, Clone, Default)]
pub struct OverrideArgs {
    /// LME cash price, USD/t.
    #[arg(long, value_name = "USD_T")]
    pub cash: Option<f64>,

    /// LME 3-month price, USD/t.
    #[arg(long = "three-month", value_name = "USD_T")]
    pub three_month: Option<f64>,

    /// Visible inventory (LME + COMEX), metric tonnes.
    #[arg(long, value_name = "TONNES")]
    pub inventory: Option<f64>,

    /// CFTC short minus long contracts.
    #[arg(long = "net-shorts", value_name = "CONTRACTS", allow_negative_numbers = true)]
    pub net_shorts: Option<f64>,

    /// COMEX front-month price, USD/lb.
    #[arg(long, value_name = "USD_LB")]
    pub comex: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct LiveArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Print results as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output directory.
    #[arg(long, default_value = "exports")]
    pub out: PathBuf,
}
