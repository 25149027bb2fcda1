//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initializes logging
//! - acquires market data and builds the session snapshot
//! - prints reports or writes exports

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DataArgs, ExportArgs, LiveArgs, OverrideArgs, ScoreArgs};
use crate::data::DataConfig;
use crate::domain::Overrides;
use crate::error::AppError;

pub mod pipeline;

/// Environment variable naming the default data directory.
pub const DATA_DIR_ENV: &str = "SQUEEZE_DATA_DIR";

/// Entry point for the `squeeze` binary.
pub fn run() -> Result<(), AppError> {
    // `squeeze` and `squeeze --json` behave like `squeeze score ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(cli.verbose);

    match cli.command {
        Command::Score(args) => handle_score(args),
        Command::Live(args) => handle_live(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_score(args: ScoreArgs) -> Result<(), AppError> {
    let snapshot = pipeline::build_snapshot(&data_config_from_args(&args.data))?;
    let run = pipeline::run_snapshot(&snapshot)?;
    print_run(&run, args.json)
}

fn handle_live(args: LiveArgs) -> Result<(), AppError> {
    let overrides = overrides_from_args(&args.overrides);
    if overrides.is_empty() {
        info!("no overrides given; live mode equals snapshot mode");
    }
    let snapshot = pipeline::build_snapshot(&data_config_from_args(&args.data))?;
    let run = pipeline::run_live(&snapshot, &overrides)?;
    print_run(&run, args.json)
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let snapshot = pipeline::build_snapshot(&data_config_from_args(&args.data))?;
    let run = pipeline::run_snapshot(&snapshot)?;
    let written = crate::io::export_all(&args.out, &snapshot, &run)?;
    for path in written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn print_run(run: &pipeline::ScoredRun, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", crate::io::results_json(run)?);
    } else {
        println!("{}", crate::report::format_report(run));
    }
    Ok(())
}

/// Logs go to stderr so stdout stays clean for reports and JSON.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed (e.g. by tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn data_config_from_args(args: &DataArgs) -> DataConfig {
    dotenvy::dotenv().ok();
    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"));

    DataConfig {
        data_dir,
        lme_source: args.lme_source,
        comex_source: args.comex_source,
        lme_csv: args.lme_csv.clone(),
        comex_inventory_csv: args.comex_inventory_csv.clone(),
        net_shorts_csv: args.net_shorts_csv.clone(),
        comex_price_csv: args.comex_price_csv.clone(),
        history_start: args.history_start,
        http_timeout: Duration::from_secs(args.timeout_secs),
    }
}

pub fn overrides_from_args(args: &OverrideArgs) -> Overrides {
    Overrides {
        cash_price: args.cash,
        three_month_price: args.three_month,
        inventory_tonnes: args.inventory,
        net_shorts: args.net_shorts,
        comex_price_usd_lb: args.comex,
    }
}

/// Rewrite argv so `squeeze` defaults to `squeeze score`.
///
/// Rules:
/// - `squeeze`                          -> `squeeze score`
/// - `squeeze --json ...`               -> `squeeze score --json ...`
/// - `squeeze -v live ...`              -> unchanged (global flags may precede a subcommand)
/// - `squeeze -v`                       -> `squeeze -v score`
/// - `squeeze --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    // Skip global flags; the first other token decides.
    let pos = argv
        .iter()
        .skip(1)
        .position(|a| !matches!(a.as_str(), "-v" | "--verbose"))
        .map(|i| i + 1);

    let Some(pos) = pos else {
        argv.push("score".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        argv[pos].as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(argv[pos].as_str(), "score" | "live" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "score flags".
    if argv[pos].starts_with('-') {
        argv.insert(pos, "score".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_score() {
        assert_eq!(rewrite_args(argv(&["squeeze"])), argv(&["squeeze", "score"]));
        assert_eq!(
            rewrite_args(argv(&["squeeze", "--json"])),
            argv(&["squeeze", "score", "--json"])
        );
        assert_eq!(rewrite_args(argv(&["squeeze", "--help"])), argv(&["squeeze", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["squeeze", "live", "--cash", "1"])),
            argv(&["squeeze", "live", "--cash", "1"])
        );
        assert_eq!(
            rewrite_args(argv(&["squeeze", "-v", "live", "--cash", "1"])),
            argv(&["squeeze", "-v", "live", "--cash", "1"])
        );
        assert_eq!(rewrite_args(argv(&["squeeze", "-v"])), argv(&["squeeze", "-v", "score"]));
        assert_eq!(
            rewrite_args(argv(&["squeeze", "--verbose", "--json"])),
            argv(&["squeeze", "--verbose", "score", "--json"])
        );
    }

    #[test]
    fn leading_verbose_flag_parses_with_subcommand() {
        let cli = crate::cli::Cli::try_parse_from(rewrite_args(argv(&["squeeze", "-v", "live", "--cash", "1"]))).unwrap();
        assert!(cli.verbose);
        let Command::Live(args) = cli.command else {
            panic!("expected live");
        };
        assert_eq!(args.overrides.cash, Some(1.0));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let args = DataArgs {
            data_dir: Some(PathBuf::from("/tmp/copper")),
            lme_source: crate::data::LmeSource::Csv,
            comex_source: crate::data::ComexSource::Csv,
            lme_csv: "lme.csv".to_string(),
            comex_inventory_csv: "inv.csv".to_string(),
            net_shorts_csv: "cftc.csv".to_string(),
            comex_price_csv: "px.csv".to_string(),
            history_start: chrono::NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            timeout_secs: 7,
        };
        let config = data_config_from_args(&args);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/copper"));
        assert_eq!(config.http_timeout, Duration::from_secs(7));
    }

    #[test]
    fn override_flags_map_field_by_field() {
        let overrides = overrides_from_args(&OverrideArgs {
            comex: Some(5.1),
            ..OverrideArgs::default()
        });
        assert_eq!(overrides.comex_price_usd_lb, Some(5.1));
        assert_eq!(overrides.cash_price, None);
    }
}
